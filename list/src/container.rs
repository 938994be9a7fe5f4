use crate::{
    balancer::Balancer,
    block::Block,
    errors::{ListError, ListResult},
    index::BlockSizes,
};
use chunked_core::{debug, trace};
use std::{
    collections::VecDeque,
    mem,
    ops::{Index, IndexMut, Range},
    slice,
};

/// The ordered sequence of blocks of a chunked list, together with the policy sizing them.
///
/// Knows nothing about global positions: callers address blocks by ordinal and are responsible
/// for reporting every structural change to their structure index.
#[derive(Debug)]
pub struct BlockContainer<T, B> {
    blocks: Vec<Block<T>>,
    /// Empty preallocated blocks, in the order appends will take them over
    spare: VecDeque<Block<T>>,
    balancer: B,
}

impl<T, B: Balancer> BlockContainer<T, B> {
    pub fn new(balancer: B) -> Self {
        Self { blocks: Vec::new(), spare: VecDeque::new(), balancer }
    }

    pub(crate) fn from_parts(balancer: B, blocks: Vec<Block<T>>) -> Self {
        Self { blocks, spare: VecDeque::new(), balancer }
    }

    pub fn balancer(&self) -> &B {
        &self.balancer
    }

    /// Default size of the block at `ordinal`, never below 1
    pub fn default_size(&self, ordinal: usize) -> usize {
        self.balancer.default_block_size(ordinal).max(1)
    }

    /// Max size of the block at `ordinal`, never below its default size
    pub fn max_size(&self, ordinal: usize) -> usize {
        self.balancer.max_block_size(ordinal).max(self.default_size(ordinal))
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total number of elements over all blocks
    pub fn element_count(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Element capacity over all blocks, spare ones included
    pub fn capacity(&self) -> usize {
        self.blocks.iter().chain(&self.spare).map(Block::capacity).sum()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Block<T>> {
        self.blocks.get(ordinal)
    }

    pub fn get_mut(&mut self, ordinal: usize) -> Option<&mut Block<T>> {
        self.blocks.get_mut(ordinal)
    }

    pub fn first(&self) -> Option<&Block<T>> {
        self.blocks.first()
    }

    pub fn last(&self) -> Option<&Block<T>> {
        self.blocks.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Block<T>> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, Block<T>> {
        self.blocks.iter_mut()
    }

    pub fn as_slice(&self) -> &[Block<T>] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block<T>> {
        self.blocks
    }

    /// Appends `value` to the last block, or to a new block if the last one reached its max size.
    /// Returns the ordinal of the block which received the value.
    pub fn add(&mut self, value: T) -> usize {
        let ordinal = match self.blocks.last() {
            Some(last) if last.len() < self.max_size(self.blocks.len() - 1) => self.blocks.len() - 1,
            _ => {
                let ordinal = self.blocks.len();
                let block = self.fresh_block(ordinal);
                self.blocks.push(block);
                ordinal
            }
        };
        self.blocks[ordinal].push(value);
        ordinal
    }

    /// Reserves element storage for at least `elements` more elements appended at the end.
    ///
    /// The last block is grown up to its max size first; the rest is preallocated as spare blocks
    /// of the new block size of the ordinals they will occupy.
    pub fn reserve(&mut self, elements: usize) {
        let mut remaining = elements;
        if let Some(ordinal) = self.blocks.len().checked_sub(1) {
            let room = self.max_size(ordinal).saturating_sub(self.blocks[ordinal].len()).min(remaining);
            self.blocks[ordinal].reserve(room);
            remaining -= room;
        }
        remaining = remaining.saturating_sub(self.spare.iter().map(Block::capacity).sum());
        let mut ordinal = self.blocks.len() + self.spare.len();
        while remaining > 0 {
            let size = self.balancer.new_block_size(ordinal).max(1);
            self.spare.push_back(Block::with_capacity(size));
            remaining = remaining.saturating_sub(size);
            ordinal += 1;
        }
        self.blocks.reserve(self.spare.len());
    }

    /// An empty block for `ordinal`, taken from the spare ones when there are any
    fn fresh_block(&mut self, ordinal: usize) -> Block<T> {
        self.spare.pop_front().unwrap_or_else(|| Block::with_capacity(self.balancer.new_block_size(ordinal)))
    }

    /// Appends a whole block
    pub fn add_block(&mut self, block: Block<T>) {
        self.blocks.push(block);
    }

    /// Appends all `items`, first filling the last block up to its default size and then
    /// dividing the remainder into new blocks. Returns the lowest ordinal which changed.
    pub fn add_range<I: IntoIterator<Item = T>>(&mut self, items: I) -> usize {
        let mut items = items.into_iter();
        let first_changed = match self.blocks.len().checked_sub(1) {
            Some(ordinal) => {
                let room = self.default_size(ordinal).saturating_sub(self.blocks[ordinal].len());
                self.blocks[ordinal].extend(items.by_ref().take(room));
                ordinal
            }
            None => 0,
        };
        let mut items = items.peekable();
        while items.peek().is_some() {
            let ordinal = self.blocks.len();
            let size = self.default_size(ordinal);
            let mut block = self.fresh_block(ordinal);
            block.extend(items.by_ref().take(size));
            self.blocks.push(block);
        }
        first_changed
    }

    /// Partitions `items` into the fewest consecutive blocks no larger than the default size of
    /// the ordinal each block is destined for, starting at `first_ordinal`.
    pub fn divide<I: IntoIterator<Item = T>>(&self, first_ordinal: usize, items: I) -> Vec<Block<T>> {
        let mut items = items.into_iter();
        let mut pieces = Vec::new();
        loop {
            let size = self.default_size(first_ordinal + pieces.len());
            let piece: Block<T> = items.by_ref().take(size).collect();
            if piece.is_empty() {
                return pieces;
            }
            pieces.push(piece);
        }
    }

    pub fn insert(&mut self, ordinal: usize, block: Block<T>) -> ListResult<()> {
        self.check_insertion_ordinal(ordinal)?;
        self.blocks.insert(ordinal, block);
        Ok(())
    }

    pub fn insert_range<I: IntoIterator<Item = Block<T>>>(&mut self, ordinal: usize, blocks: I) -> ListResult<()> {
        self.check_insertion_ordinal(ordinal)?;
        self.blocks.splice(ordinal..ordinal, blocks);
        Ok(())
    }

    pub fn remove_at(&mut self, ordinal: usize) -> ListResult<Block<T>> {
        self.check_ordinal(ordinal)?;
        Ok(self.blocks.remove(ordinal))
    }

    /// Replaces the block at `ordinal` by `pieces`, in order.
    pub fn replace_with<I: IntoIterator<Item = Block<T>>>(&mut self, ordinal: usize, pieces: I) -> ListResult<()> {
        self.check_ordinal(ordinal)?;
        self.blocks.splice(ordinal..=ordinal, pieces);
        Ok(())
    }

    /// Drops the empty blocks among `ordinals`, returning how many were dropped.
    pub fn purge_empty(&mut self, ordinals: Range<usize>) -> usize {
        let end = ordinals.end.min(self.blocks.len());
        let start = ordinals.start.min(end);
        let survivors: Vec<Block<T>> = self.blocks.drain(start..end).filter(|block| !block.is_empty()).collect();
        let purged = end - start - survivors.len();
        self.blocks.splice(start..start, survivors);
        purged
    }

    /// Reverses the contents of every block, then the block order.
    pub fn reverse(&mut self) {
        self.blocks.iter_mut().for_each(Block::reverse);
        self.blocks.reverse();
        trace!("reversed {} blocks", self.blocks.len());
    }

    pub fn clear(&mut self) {
        trace!("dropping {} blocks", self.blocks.len());
        self.blocks.clear();
        self.spare.clear();
    }

    /// Releases spare blocks and unused capacity
    pub fn shrink_to_fit(&mut self) {
        self.spare.clear();
        self.blocks.iter_mut().for_each(Block::shrink_to_fit);
        self.blocks.shrink_to_fit();
    }

    /// Divides the block at `ordinal` if it reached its max size and returns the number of blocks
    /// now holding its elements.
    ///
    /// The block keeps its first default-sized piece in place and the rest follows as new blocks.
    /// When the default size equals the max size the block is halved instead. A single-element
    /// block cannot be divided and is left as is.
    pub fn try_divide_block(&mut self, ordinal: usize) -> ListResult<usize> {
        self.check_ordinal(ordinal)?;
        Ok(self.divide_block(ordinal))
    }

    fn divide_block(&mut self, ordinal: usize) -> usize {
        let len = self.blocks[ordinal].len();
        if len < self.max_size(ordinal) || len < 2 {
            return 1;
        }
        let default = self.default_size(ordinal);
        let split_at = if len > default { default } else { len / 2 };
        let rest = self.blocks[ordinal].split_off(split_at);
        let pieces = self.divide(ordinal + 1, rest);
        let count = 1 + pieces.len();
        self.blocks.splice(ordinal + 1..ordinal + 1, pieces);
        trace!("divided block {} of {} elements into {} blocks", ordinal, len, count);
        count
    }

    /// Divides every block from `ordinal` on which exceeds the max size of its current ordinal.
    /// Blocks shift to lower ordinals when earlier blocks are removed, and to arbitrary ordinals on
    /// reversal, so this is needed for policies whose max size varies with the ordinal.
    ///
    /// Returns the lowest ordinal which was divided, if any.
    pub fn enforce_limits_from(&mut self, ordinal: usize) -> Option<usize> {
        let mut first_divided = None;
        let mut divisions = 0;
        let mut ordinal = ordinal;
        while ordinal < self.blocks.len() {
            let len = self.blocks[ordinal].len();
            if len <= self.max_size(ordinal) || len < 2 {
                ordinal += 1;
                continue;
            }
            // Halving may leave the block above the limit, so it is checked again
            self.divide_block(ordinal);
            first_divided.get_or_insert(ordinal);
            divisions += 1;
        }
        if divisions > 1 {
            debug!("enforcing block size limits took {} divisions starting at block {:?}", divisions, first_divided);
        }
        first_divided
    }

    /// Swaps two elements addressed by `(ordinal, offset)`.
    ///
    /// # Panics
    ///
    /// Panics if either address is out of bounds.
    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        if a.0 == b.0 {
            self.blocks[a.0].swap(a.1, b.1);
            return;
        }
        let (low, high) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let (head, tail) = self.blocks.split_at_mut(high.0);
        mem::swap(&mut head[low.0][low.1], &mut tail[0][high.1]);
    }

    fn check_ordinal(&self, ordinal: usize) -> ListResult<()> {
        if ordinal < self.blocks.len() { Ok(()) } else { Err(ListError::OrdinalOutOfRange { ordinal, blocks: self.blocks.len() }) }
    }

    fn check_insertion_ordinal(&self, ordinal: usize) -> ListResult<()> {
        if ordinal <= self.blocks.len() { Ok(()) } else { Err(ListError::OrdinalOutOfRange { ordinal, blocks: self.blocks.len() }) }
    }
}

impl<T, B: Balancer> BlockSizes for BlockContainer<T, B> {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn block_len(&self, ordinal: usize) -> usize {
        self.blocks[ordinal].len()
    }
}

impl<T: Clone, B: Clone> Clone for BlockContainer<T, B> {
    fn clone(&self) -> Self {
        Self { blocks: self.blocks.clone(), spare: VecDeque::new(), balancer: self.balancer.clone() }
    }
}

impl<T, B> Index<usize> for BlockContainer<T, B> {
    type Output = Block<T>;

    fn index(&self, ordinal: usize) -> &Block<T> {
        &self.blocks[ordinal]
    }
}

impl<T, B> IndexMut<usize> for BlockContainer<T, B> {
    fn index_mut(&mut self, ordinal: usize) -> &mut Block<T> {
        &mut self.blocks[ordinal]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::{FixedBalancer, GrowingBalancer};
    use itertools::Itertools;

    fn fixed(default: usize, max: usize) -> BlockContainer<u32, FixedBalancer> {
        BlockContainer::new(FixedBalancer::new(default, max).unwrap())
    }

    fn lens<T, B: Balancer>(container: &BlockContainer<T, B>) -> Vec<usize> {
        container.iter().map(Block::len).collect()
    }

    fn flatten<B: Balancer>(container: &BlockContainer<u32, B>) -> Vec<u32> {
        container.iter().flat_map(|block| block.iter().copied()).collect()
    }

    #[test]
    fn test_add_fills_blocks_to_max() {
        let mut container = fixed(2, 3);
        let ordinals = (0..7).map(|v| container.add(v)).collect_vec();
        assert_eq!(ordinals, vec![0, 0, 0, 1, 1, 1, 2]);
        assert_eq!(lens(&container), vec![3, 3, 1]);
        assert_eq!(container.element_count(), 7);
        assert_eq!(container.block_count(), 3);
        assert_eq!(container.block_len(2), 1);
    }

    #[test]
    fn test_add_range_tops_up_then_divides() {
        let mut container = fixed(4, 8);
        container.add(0);
        assert_eq!(container.add_range(1..11), 0);
        assert_eq!(lens(&container), vec![4, 4, 3]);
        assert_eq!(flatten(&container), (0..11).collect_vec());

        // A last block already beyond its default size gets no more elements
        let mut container = fixed(2, 8);
        for v in 0..5 {
            container.add(v);
        }
        assert_eq!(container.add_range(5..8), 0);
        assert_eq!(lens(&container), vec![5, 2, 1]);

        let mut empty = fixed(4, 8);
        assert_eq!(empty.add_range(std::iter::empty()), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_reserve_preallocates_element_storage() {
        let mut container = fixed(4, 8);
        container.reserve(10);
        assert!(container.is_empty());
        assert_eq!(container.capacity(), 12);
        // Spare blocks are taken over by appends, no new storage is needed
        container.add_range(0..10);
        assert_eq!(lens(&container), vec![4, 4, 2]);
        assert_eq!(container.capacity(), 12);
        assert_eq!(flatten(&container), (0..10).collect_vec());

        // The last block grows up to its max size before spare blocks are added
        container.reserve(6);
        assert!(container.capacity() >= 16);
        assert_eq!(container.block_count(), 3);
        for v in 10..16 {
            container.add(v);
        }
        assert_eq!(lens(&container), vec![4, 4, 8]);

        container.reserve(3);
        let ordinal = container.add(16);
        assert_eq!((ordinal, container[3].capacity()), (3, 4));
        container.shrink_to_fit();
        assert_eq!(container.capacity(), 17);
        container.clear();
        assert_eq!(container.capacity(), 0);
    }

    #[test]
    fn test_divide_follows_ordinal_sizes() {
        let container: BlockContainer<u32, _> = BlockContainer::new(GrowingBalancer::new(2, 2, 16, 2).unwrap());
        let pieces = container.divide(1, 0..15);
        assert_eq!(pieces.iter().map(Block::len).collect_vec(), vec![2, 4, 4, 5]);
        assert!(container.divide(0, std::iter::empty()).is_empty());
    }

    #[test]
    fn test_try_divide_block() {
        let mut container = fixed(4, 10);
        container.add_block((0..10).collect());
        container.add_block((10..13).collect());
        assert_eq!(container.try_divide_block(1), Ok(1));
        assert_eq!(container.try_divide_block(0), Ok(3));
        assert_eq!(lens(&container), vec![4, 4, 2, 3]);
        assert_eq!(flatten(&container), (0..13).collect_vec());
        assert_eq!(container.try_divide_block(4), Err(ListError::OrdinalOutOfRange { ordinal: 4, blocks: 4 }));

        // Default equal to max halves the block
        let mut container = fixed(4, 4);
        container.add_range(0..4);
        assert_eq!(container.try_divide_block(0), Ok(2));
        assert_eq!(lens(&container), vec![2, 2]);

        // A single element cannot be divided
        let mut container = fixed(1, 1);
        container.add(7);
        assert_eq!(container.try_divide_block(0), Ok(1));
        assert_eq!(lens(&container), vec![1]);
    }

    #[test]
    fn test_block_level_mutations() {
        let mut container = fixed(2, 4);
        container.add_range(0..6);
        container.insert(1, Block::from(vec![100])).unwrap();
        container.insert(4, Block::new()).unwrap();
        assert_eq!(container.insert(6, Block::new()), Err(ListError::OrdinalOutOfRange { ordinal: 6, blocks: 5 }));
        assert_eq!(lens(&container), vec![2, 1, 2, 2, 0]);

        assert_eq!(container.remove_at(1).unwrap().as_slice(), &[100]);
        assert!(container.remove_at(4).unwrap_err().is_out_of_range());
        container.replace_with(0, vec![Block::from(vec![0]), Block::new(), Block::from(vec![1])]).unwrap();
        assert_eq!(lens(&container), vec![1, 0, 1, 2, 2, 0]);
        assert_eq!(container.purge_empty(0..2), 1);
        assert_eq!(container.purge_empty(3..100), 1);
        assert_eq!(lens(&container), vec![1, 1, 2, 2]);
        assert_eq!(flatten(&container), (0..6).collect_vec());

        container.insert_range(2, vec![Block::from(vec![50]), Block::from(vec![51])]).unwrap();
        assert_eq!(flatten(&container), vec![0, 1, 50, 51, 2, 3, 4, 5]);

        container.swap((0, 0), (5, 1));
        container.swap((2, 0), (3, 0));
        assert_eq!(flatten(&container), vec![5, 1, 51, 50, 2, 3, 4, 0]);

        container.reverse();
        assert_eq!(flatten(&container), vec![0, 4, 3, 2, 50, 51, 1, 5]);
        assert_eq!(lens(&container), vec![2, 2, 1, 1, 1, 1]);

        container.clear();
        assert!(container.is_empty());
    }

    #[test]
    fn test_limits_after_shift_to_lower_ordinals() {
        let balancer = GrowingBalancer::new(2, 1, 64, 1).unwrap();
        let mut container: BlockContainer<u32, _> = BlockContainer::new(balancer);
        container.add_range(0..30);
        assert_eq!(lens(&container), vec![2, 4, 8, 16]);
        assert_eq!(container.enforce_limits_from(0), None);

        // Once the first block is gone, every block sits at an ordinal with half its size
        container.remove_at(0).unwrap();
        assert_eq!(container.enforce_limits_from(0), Some(0));
        assert_eq!(lens(&container), vec![2, 2, 8, 16]);
        for (ordinal, block) in container.iter().enumerate() {
            assert!(block.len() <= balancer.max_block_size(ordinal));
        }
        assert_eq!(flatten(&container), (2..30).collect_vec());
    }
}

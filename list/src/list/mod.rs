//!
//! The public sequence type.
//!
//! [`ChunkedList`] stores its elements in a [`BlockContainer`] and resolves global positions
//! through a [`StructureIndex`]. Every mutation reports the lowest block ordinal it touched to the
//! index, which revalidates lazily on the next positional query.
//!

mod parallel;
mod range;
mod search;

use crate::{
    balancer::{AnyBalancer, Balancer, FixedBalancer},
    block::Block,
    config::ListConfig,
    container::BlockContainer,
    cursor::{Cursor, IntoIter, Iter, IterMut},
    errors::{ListError, ListResult},
    index::{BlockInfo, MultiBlockRange, StructureIndex},
};
use itertools::Itertools;
use parking_lot::Mutex;
use std::{
    fmt::{self, Debug},
    ops::{Index, IndexMut},
};

/// A sequence stored as a run of bounded contiguous blocks.
///
/// Positional inserts and removals shift at most one block. Random access resolves the owning
/// block through a cached index of block offsets, in near constant time when blocks are evenly
/// sized. Reads take `&self` and may run from several threads; the index cache is guarded by a
/// mutex for that purpose.
pub struct ChunkedList<T, B = FixedBalancer> {
    blocks: BlockContainer<T, B>,
    index: Mutex<StructureIndex>,
    len: usize,
}

fn expect_consistent<V>(result: ListResult<V>) -> V {
    match result {
        Ok(value) => value,
        Err(err) => panic!("chunked list structure is corrupted: {}", err),
    }
}

impl<T> ChunkedList<T> {
    pub fn new() -> Self {
        Self::from_container(BlockContainer::new(FixedBalancer::default()), 0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut list = Self::new();
        list.blocks.reserve(capacity);
        list
    }
}

impl<T> ChunkedList<T, AnyBalancer> {
    pub fn from_config(config: &ListConfig) -> ListResult<Self> {
        let mut list = Self::with_balancer(config.balancer.build()?)?;
        list.blocks.reserve(config.initial_capacity);
        Ok(list)
    }
}

impl<T, B: Balancer> ChunkedList<T, B> {
    /// Creates an empty list sized by `balancer`, after validating it.
    pub fn with_balancer(balancer: B) -> ListResult<Self> {
        balancer.validate()?;
        Ok(Self::from_container(BlockContainer::new(balancer), 0))
    }

    /// Creates a list holding `items`, divided into blocks sized by `balancer`.
    pub fn from_iter_with<I: IntoIterator<Item = T>>(balancer: B, items: I) -> ListResult<Self> {
        let mut list = Self::with_balancer(balancer)?;
        list.extend(items);
        Ok(list)
    }

    pub(crate) fn from_container(blocks: BlockContainer<T, B>, len: usize) -> Self {
        Self { blocks, index: Mutex::new(StructureIndex::new()), len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn balancer(&self) -> &B {
        self.blocks.balancer()
    }

    pub fn blocks(&self) -> &BlockContainer<T, B> {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Element counts of all blocks, in order
    pub fn block_lens(&self) -> Vec<usize> {
        self.blocks.iter().map(Block::len).collect_vec()
    }

    pub fn capacity(&self) -> usize {
        self.blocks.capacity()
    }

    pub fn shrink_to_fit(&mut self) {
        self.blocks.shrink_to_fit();
    }

    /// Resolves the block holding `index`
    pub fn block_info(&self, index: usize) -> ListResult<BlockInfo> {
        self.index.lock().block_info(&self.blocks, self.len, index)
    }

    /// Decomposes `[index, index + count)` into per-block ranges
    pub fn multi_block_range(&self, index: usize, count: usize) -> ListResult<MultiBlockRange> {
        self.index.lock().multi_block_range(&self.blocks, self.len, index, count)
    }

    /// Decomposes the `count` positions ending at `index` into per-block ranges, tail first
    pub fn reverse_multi_block_range(&self, index: usize, count: usize) -> ListResult<MultiBlockRange> {
        self.index.lock().reverse_multi_block_range(&self.blocks, self.len, index, count)
    }

    fn locate(&self, index: usize) -> BlockInfo {
        expect_consistent(self.block_info(index))
    }

    fn locate_mut(&mut self, index: usize) -> ListResult<BlockInfo> {
        self.index.get_mut().block_info(&self.blocks, self.len, index)
    }

    fn check_index(&self, index: usize) -> ListResult<()> {
        if index < self.len { Ok(()) } else { Err(ListError::IndexOutOfRange { index, len: self.len }) }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let info = self.locate(index);
        Some(&self.blocks[info.ordinal][info.local(index)])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let info = expect_consistent(self.locate_mut(index));
        Some(&mut self.blocks[info.ordinal][info.local(index)])
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: T) -> ListResult<T> {
        self.check_index(index)?;
        let info = self.locate_mut(index)?;
        Ok(self.blocks[info.ordinal].set(info.local(index), value))
    }

    pub fn first(&self) -> Option<&T> {
        self.blocks.iter().find_map(|block| block.first())
    }

    pub fn last(&self) -> Option<&T> {
        self.blocks.iter().rev().find_map(|block| block.last())
    }

    /// Appends `value`, opening a new block if the last one is full.
    pub fn push(&mut self, value: T) {
        let ordinal = self.blocks.add(value);
        self.len += 1;
        self.index.get_mut().data_changed(ordinal);
    }

    /// Inserts `value` at `index`, shifting the elements after it within their block.
    ///
    /// A full target block is divided first. An insertion at the start of a block goes to the
    /// end of the previous block instead when that one has room and the target block is at least
    /// at its default size, which keeps repeated insertions at block boundaries from fragmenting
    /// the list.
    pub fn insert(&mut self, index: usize, value: T) -> ListResult<()> {
        if index > self.len {
            return Err(ListError::IndexOutOfRange { index, len: self.len });
        }
        if index == self.len {
            self.push(value);
            return Ok(());
        }

        let mut info = self.locate_mut(index)?;
        if index == info.start && info.ordinal > 0 {
            let previous = info.ordinal - 1;
            let prefer_previous = info.count >= self.blocks.default_size(info.ordinal)
                && self.blocks[previous].len() < self.blocks.max_size(previous);
            if prefer_previous {
                self.blocks[previous].push(value);
                self.inserted(previous, 1);
                return Ok(());
            }
        }

        while self.blocks[info.ordinal].len() >= self.blocks.max_size(info.ordinal) {
            if self.blocks.try_divide_block(info.ordinal)? == 1 {
                // Full and indivisible: the value gets a block of its own
                self.blocks.insert(info.ordinal, Block::from(vec![value]))?;
                self.inserted(info.ordinal, 1);
                return Ok(());
            }
            self.index.get_mut().data_changed(info.ordinal);
            info = self.locate_mut(index)?;
        }
        self.blocks[info.ordinal].insert(info.local(index), value);
        self.inserted(info.ordinal, 1);
        Ok(())
    }

    fn inserted(&mut self, ordinal: usize, count: usize) {
        self.len += count;
        self.index.get_mut().data_changed(ordinal);
    }

    /// Removes and returns the element at `index`. A block left empty is dropped.
    pub fn remove_at(&mut self, index: usize) -> ListResult<T> {
        self.check_index(index)?;
        let info = self.locate_mut(index)?;
        let value = self.blocks[info.ordinal].remove(info.local(index));
        self.len -= 1;
        if self.blocks[info.ordinal].is_empty() {
            self.blocks.remove_at(info.ordinal)?;
            self.blocks_removed(info.ordinal);
        } else {
            self.index.get_mut().data_changed(info.ordinal);
        }
        Ok(value)
    }

    /// Reports that blocks were dropped at `ordinal` and restores the size limits of the blocks
    /// which moved down.
    fn blocks_removed(&mut self, ordinal: usize) {
        self.index.get_mut().data_changed_after_removal(ordinal, self.blocks.len());
        if let Some(divided) = self.blocks.enforce_limits_from(ordinal) {
            self.index.get_mut().data_changed(divided);
        }
    }

    /// Removes the first element equal to `value`. Returns whether one was found.
    pub fn remove(&mut self, value: &T) -> ListResult<bool>
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Removes every element matching `predicate` and returns how many were removed.
    pub fn remove_all<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut first_changed = None;
        let mut removed = 0;
        for (ordinal, block) in self.blocks.iter_mut().enumerate() {
            let before = block.len();
            block.retain(|x| !predicate(x));
            if block.len() < before {
                removed += before - block.len();
                first_changed.get_or_insert(ordinal);
            }
        }
        let Some(first) = first_changed else {
            return 0;
        };
        self.len -= removed;
        if self.blocks.purge_empty(first..self.blocks.len()) > 0 {
            self.blocks_removed(first);
        } else {
            self.index.get_mut().data_changed(first);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.index.get_mut().reset();
        self.len = 0;
    }

    /// Reverses the order of the elements in place
    pub fn reverse(&mut self) {
        self.blocks.reverse();
        self.blocks.enforce_limits_from(0);
        self.index.get_mut().data_changed(0);
    }

    /// Swaps the elements at `a` and `b`
    pub fn swap(&mut self, a: usize, b: usize) -> ListResult<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        let first = self.locate_mut(a)?;
        let second = self.locate_mut(b)?;
        self.blocks.swap((first.ordinal, first.local(a)), (second.ordinal, second.local(b)));
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.blocks.as_slice(), self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.blocks.iter_mut(), self.len)
    }

    /// A cursor positioned at the first element
    pub fn cursor(&self) -> Cursor<'_, T, B> {
        Cursor::start(self)
    }

    /// A cursor positioned at `index`. `index == len()` positions it past the end.
    pub fn cursor_at(&self, index: usize) -> ListResult<Cursor<'_, T, B>> {
        let mut cursor = Cursor::start(self);
        cursor.seek(index)?;
        Ok(cursor)
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut items = Vec::with_capacity(self.len);
        self.blocks.iter().for_each(|block| items.extend_from_slice(block));
        items
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len);
        self.blocks.into_blocks().into_iter().for_each(|block| items.extend(block));
        items
    }

    /// Maps every element through `convert`, keeping the block layout.
    pub fn convert_all<U, F>(&self, mut convert: F) -> ChunkedList<U, B>
    where
        B: Clone,
        F: FnMut(&T) -> U,
    {
        let blocks = self.blocks.iter().map(|block| block.iter().map(&mut convert).collect()).collect();
        ChunkedList::from_container(BlockContainer::from_parts(self.balancer().clone(), blocks), self.len)
    }

    /// Checks that the element count matches the blocks, that every block is within its size
    /// limit and that the index agrees with the blocks.
    pub fn verify(&self) -> ListResult<()> {
        let counted = self.blocks.element_count();
        if counted != self.len {
            return Err(ListError::DataInconsistency(format!("count is {} but the blocks hold {} elements", self.len, counted)));
        }
        for (ordinal, block) in self.blocks.iter().enumerate() {
            let max = self.blocks.max_size(ordinal);
            if block.len() > max {
                return Err(ListError::DataInconsistency(format!("block {} holds {} elements, max is {}", ordinal, block.len(), max)));
            }
            if block.is_empty() && self.len > 0 {
                return Err(ListError::DataInconsistency(format!("block {} is empty", ordinal)));
            }
        }
        self.index.lock().check_consistency(&self.blocks)
    }
}

impl<T> Default for ChunkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, B: Balancer + Clone> Clone for ChunkedList<T, B> {
    fn clone(&self) -> Self {
        Self::from_container(self.blocks.clone(), self.len)
    }
}

impl<T: Debug, B: Balancer> Debug for ChunkedList<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, B: Balancer, C: Balancer> PartialEq<ChunkedList<T, C>> for ChunkedList<T, B> {
    fn eq(&self, other: &ChunkedList<T, C>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, B: Balancer> Eq for ChunkedList<T, B> {}

impl<T, B: Balancer> Index<usize> for ChunkedList<T, B> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {} but the index is {}", self.len, index),
        }
    }
}

impl<T, B: Balancer> IndexMut<usize> for ChunkedList<T, B> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {} but the index is {}", len, index),
        }
    }
}

impl<T, B: Balancer> Extend<T> for ChunkedList<T, B> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let mut added = 0;
        let first_changed = self.blocks.add_range(items.into_iter().inspect(|_| added += 1));
        if added > 0 {
            self.inserted(first_changed, added);
        }
    }
}

impl<T> FromIterator<T> for ChunkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut list = Self::new();
        list.extend(items);
        list
    }
}

impl<T> From<Vec<T>> for ChunkedList<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T, B: Balancer> IntoIterator for ChunkedList<T, B> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let len = self.len;
        IntoIter::new(self.blocks.into_blocks(), len)
    }
}

impl<'a, T, B: Balancer> IntoIterator for &'a ChunkedList<T, B> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, B: Balancer> IntoIterator for &'a mut ChunkedList<T, B> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

use super::ChunkedList;
use crate::{
    balancer::Balancer,
    block::Block,
    container::BlockContainer,
    errors::{ListError, ListResult, check_range},
};
use chunked_core::trace;
use std::mem;

impl<T, B: Balancer> ChunkedList<T, B> {
    /// Inserts all `items` at `index`, in order.
    ///
    /// Items which fit in the target block are spliced into it. Otherwise the block is rebuilt
    /// from its head, the items and its tail, divided into default-sized blocks.
    pub fn insert_range<I: IntoIterator<Item = T>>(&mut self, index: usize, items: I) -> ListResult<()> {
        if index > self.len {
            return Err(ListError::IndexOutOfRange { index, len: self.len });
        }
        if index == self.len {
            self.extend(items);
            return Ok(());
        }
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }

        let added = items.len();
        let info = self.locate_mut(index)?;
        let local = info.local(index);
        if info.count + added <= self.blocks.max_size(info.ordinal) {
            self.blocks[info.ordinal].insert_many(local, items);
        } else {
            let mut head = mem::take(&mut self.blocks[info.ordinal]).into_vec();
            let tail = head.split_off(local);
            let pieces = self.blocks.divide(info.ordinal, head.into_iter().chain(items).chain(tail));
            trace!("inserting {} elements rebuilt block {} as {} blocks", added, info.ordinal, pieces.len());
            self.blocks.replace_with(info.ordinal, pieces)?;
        }
        self.inserted(info.ordinal, added);
        Ok(())
    }

    /// Removes the elements in `[index, index + count)`. Blocks left empty are dropped.
    pub fn remove_range(&mut self, index: usize, count: usize) -> ListResult<()> {
        let range = self.index.get_mut().multi_block_range(&self.blocks, self.len, index, count)?;
        if range.is_empty() {
            return Ok(());
        }
        for part in &range {
            self.blocks[part.ordinal].remove_range(part.local_span());
        }
        self.len -= count;

        let first = range.first_ordinal();
        if self.blocks.purge_empty(first..first + range.len()) > 0 {
            self.blocks_removed(first);
        } else {
            self.index.get_mut().data_changed(first);
        }
        Ok(())
    }

    /// Copies `[index, index + count)` into a new list sized by the same balancer. Blocks covered
    /// entirely are cloned whole; partially covered ones contribute the overlapping slice.
    pub fn get_range(&self, index: usize, count: usize) -> ListResult<ChunkedList<T, B>>
    where
        T: Clone,
        B: Clone,
    {
        let range = self.multi_block_range(index, count)?;
        let blocks = range
            .iter()
            .map(|part| {
                let block = &self.blocks[part.ordinal];
                if part.count == block.len() { block.clone() } else { Block::from(block[part.local_span()].to_vec()) }
            })
            .collect();
        let mut container = BlockContainer::from_parts(self.balancer().clone(), blocks);
        container.enforce_limits_from(0);
        Ok(ChunkedList::from_container(container, count))
    }

    /// Reverses the order of the elements in `[index, index + count)`
    pub fn reverse_range(&mut self, index: usize, count: usize) -> ListResult<()> {
        check_range(index, count, self.len)?;
        if count < 2 {
            return Ok(());
        }
        let (mut low, mut high) = (index, index + count - 1);
        while low < high {
            let a = self.locate_mut(low)?;
            let b = self.locate_mut(high)?;
            self.blocks.swap((a.ordinal, a.local(low)), (b.ordinal, b.local(high)));
            low += 1;
            high -= 1;
        }
        Ok(())
    }
}

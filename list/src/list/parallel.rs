//!
//! Block-parallel scans.
//!
//! Each block is scanned by its own rayon task. Only the blocks are read, never the structure
//! index, so these run alongside other readers without contention. Results are merged in block
//! order.
//!

use super::ChunkedList;
use crate::{balancer::Balancer, container::BlockContainer};
use rayon::prelude::*;

impl<T: Sync, B: Balancer + Sync> ChunkedList<T, B> {
    pub fn par_exists<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Sync,
    {
        self.blocks.as_slice().par_iter().any(|block| block.iter().any(&predicate))
    }

    pub fn par_true_for_all<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Sync,
    {
        self.blocks.as_slice().par_iter().all(|block| block.iter().all(&predicate))
    }

    /// Number of elements matching `predicate`
    pub fn par_count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool + Sync,
    {
        self.blocks.as_slice().par_iter().map(|block| block.iter().filter(|&x| predicate(x)).count()).sum()
    }

    /// Clones every element matching `predicate` into a new list sized by the same balancer,
    /// keeping their relative order.
    pub fn par_find_all<F>(&self, predicate: F) -> ChunkedList<T, B>
    where
        T: Clone + Send,
        B: Clone,
        F: Fn(&T) -> bool + Sync,
    {
        let found: Vec<T> =
            self.blocks.as_slice().par_iter().flat_map_iter(|block| block.iter().filter(|&x| predicate(x)).cloned()).collect();
        let mut list = ChunkedList::from_container(BlockContainer::new(self.balancer().clone()), 0);
        list.extend(found);
        list
    }
}

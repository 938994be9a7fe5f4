use super::{ChunkedList, expect_consistent};
use crate::{
    balancer::Balancer,
    container::BlockContainer,
    errors::{ListResult, check_range},
};
use std::cmp::Ordering;

impl<T, B: Balancer> ChunkedList<T, B> {
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.exists(|x| x == value)
    }

    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.find_index(|x| x == value)
    }

    /// Position of the first element equal to `value` within `[index, index + count)`
    pub fn index_of_in(&self, value: &T, index: usize, count: usize) -> ListResult<Option<usize>>
    where
        T: PartialEq,
    {
        self.find_index_in(index, count, |x| x == value)
    }

    pub fn last_index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.find_last_index(|x| x == value)
    }

    /// Position of the last element equal to `value` among the `count` elements ending at `index`
    pub fn last_index_of_in(&self, value: &T, index: usize, count: usize) -> ListResult<Option<usize>>
    where
        T: PartialEq,
    {
        self.find_last_index_in(index, count, |x| x == value)
    }

    pub fn find<F>(&self, predicate: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.find_index(predicate).and_then(|index| self.get(index))
    }

    pub fn find_last<F>(&self, predicate: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.find_last_index(predicate).and_then(|index| self.get(index))
    }

    pub fn find_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut start = 0;
        for block in self.blocks.iter() {
            if let Some(offset) = block.iter().position(&mut predicate) {
                return Some(start + offset);
            }
            start += block.len();
        }
        None
    }

    pub fn find_last_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut end = self.len;
        for block in self.blocks.iter().rev() {
            end -= block.len();
            if let Some(offset) = block.iter().rposition(&mut predicate) {
                return Some(end + offset);
            }
        }
        None
    }

    /// Position of the first element matching `predicate` within `[index, index + count)`.
    /// Probes only the blocks the range overlaps, in ascending order.
    pub fn find_index_in<F>(&self, index: usize, count: usize, mut predicate: F) -> ListResult<Option<usize>>
    where
        F: FnMut(&T) -> bool,
    {
        let range = self.multi_block_range(index, count)?;
        for part in &range {
            if let Some(local) = self.blocks[part.ordinal].find_index(part.local_span(), &mut predicate) {
                return Ok(Some(part.to_global(local)));
            }
        }
        Ok(None)
    }

    /// Position of the last element matching `predicate` among the `count` elements ending at
    /// (and including) `index`. Probes the overlapped blocks tail first.
    pub fn find_last_index_in<F>(&self, index: usize, count: usize, mut predicate: F) -> ListResult<Option<usize>>
    where
        F: FnMut(&T) -> bool,
    {
        let range = self.reverse_multi_block_range(index, count)?;
        for part in &range {
            if let Some(local) = self.blocks[part.ordinal].find_last_index(part.local_span(), &mut predicate) {
                return Ok(Some(part.to_global(local)));
            }
        }
        Ok(None)
    }

    /// Clones every element matching `predicate` into a new list sized by the same balancer.
    pub fn find_all<F>(&self, mut predicate: F) -> ChunkedList<T, B>
    where
        T: Clone,
        B: Clone,
        F: FnMut(&T) -> bool,
    {
        let mut found = ChunkedList::from_container(BlockContainer::new(self.balancer().clone()), 0);
        found.extend(self.iter().filter(|&x| predicate(x)).cloned());
        found
    }

    pub fn exists<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.find_index(predicate).is_some()
    }

    pub fn true_for_all<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.blocks.iter().all(|block| block.iter().all(&mut predicate))
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(f);
    }

    /// Binary searches a sorted list for `value`.
    ///
    /// Returns `Ok` with the position of a matching element, or `Err` with the position where
    /// `value` could be inserted to keep the list sorted.
    pub fn binary_search(&self, value: &T) -> Result<usize, usize>
    where
        T: Ord,
    {
        self.binary_search_by(|x| x.cmp(value))
    }

    /// Binary searches with a comparator returning the ordering of an element relative to the target.
    pub fn binary_search_by<F>(&self, compare: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        expect_consistent(self.binary_search_by_in(0, self.len, compare))
    }

    /// Binary searches `[index, index + count)` for `value`. The insertion point on a miss is a
    /// global position.
    pub fn binary_search_in(&self, index: usize, count: usize, value: &T) -> ListResult<Result<usize, usize>>
    where
        T: Ord,
    {
        self.binary_search_by_in(index, count, |x| x.cmp(value))
    }

    pub fn binary_search_by_in<F>(&self, index: usize, count: usize, mut compare: F) -> ListResult<Result<usize, usize>>
    where
        F: FnMut(&T) -> Ordering,
    {
        check_range(index, count, self.len)?;
        let (mut low, mut high) = (index, index + count);
        while low < high {
            let mid = low + (high - low) / 2;
            // The index lock is released before `compare` runs, which may read the list again
            let info = self.block_info(mid)?;
            match compare(&self.blocks[info.ordinal][info.local(mid)]) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(Ok(mid)),
            }
        }
        Ok(Err(low))
    }
}

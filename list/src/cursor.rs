use crate::{
    balancer::Balancer,
    block::Block,
    errors::{ListError, ListResult},
    list::ChunkedList,
};
use std::{
    iter::{Flatten, FusedIterator},
    slice, vec,
};

/// A seekable walker over a [`ChunkedList`].
///
/// Tracks the current block ordinal and in-block offset, so advancing is a bounds check within
/// one block. [`Cursor::seek`] jumps through the structure index. The borrow of the list rules out
/// mutation while the cursor lives.
pub struct Cursor<'a, T, B> {
    list: &'a ChunkedList<T, B>,
    ordinal: usize,
    offset: usize,
    index: usize,
}

impl<'a, T, B: Balancer> Cursor<'a, T, B> {
    pub(crate) fn start(list: &'a ChunkedList<T, B>) -> Self {
        let mut cursor = Self { list, ordinal: 0, offset: 0, index: 0 };
        cursor.skip_exhausted();
        cursor
    }

    /// Global position of the cursor. Equals the list length once past the end.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of elements from the cursor (inclusive) to the end
    pub fn remaining(&self) -> usize {
        self.list.len() - self.index
    }

    pub fn current(&self) -> Option<&'a T> {
        let list = self.list;
        list.blocks().get(self.ordinal).and_then(|block| block.get(self.offset))
    }

    /// Moves to the next element. Returns `false` once the cursor is past the end.
    pub fn advance(&mut self) -> bool {
        if self.index >= self.list.len() {
            return false;
        }
        self.index += 1;
        self.offset += 1;
        self.skip_exhausted();
        self.index < self.list.len()
    }

    /// Positions the cursor at `index`; `index == len()` positions it past the end.
    pub fn seek(&mut self, index: usize) -> ListResult<()> {
        let len = self.list.len();
        if index > len {
            return Err(ListError::IndexOutOfRange { index, len });
        }
        if index == len {
            (self.ordinal, self.offset) = (self.list.block_count(), 0);
        } else {
            let info = self.list.block_info(index)?;
            (self.ordinal, self.offset) = (info.ordinal, info.local(index));
        }
        self.index = index;
        Ok(())
    }

    fn skip_exhausted(&mut self) {
        let blocks = self.list.blocks();
        while let Some(block) = blocks.get(self.ordinal)
            && self.offset >= block.len()
        {
            self.ordinal += 1;
            self.offset = 0;
        }
    }
}

impl<'a, T, B: Balancer> Iterator for Cursor<'a, T, B> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let item = self.current()?;
        self.advance();
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl<T, B: Balancer> ExactSizeIterator for Cursor<'_, T, B> {}

impl<T, B: Balancer> FusedIterator for Cursor<'_, T, B> {}

/// Borrowing iterator over the elements of a [`ChunkedList`].
pub struct Iter<'a, T> {
    blocks: slice::Iter<'a, Block<T>>,
    front: slice::Iter<'a, T>,
    back: slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(blocks: &'a [Block<T>], len: usize) -> Self {
        Self { blocks: blocks.iter(), front: Default::default(), back: Default::default(), remaining: len }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { blocks: self.blocks.clone(), front: self.front.clone(), back: self.back.clone(), remaining: self.remaining }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.front.next() {
                self.remaining -= 1;
                return Some(item);
            }
            match self.blocks.next() {
                Some(block) => self.front = block.iter(),
                None => {
                    let item = self.back.next()?;
                    self.remaining -= 1;
                    return Some(item);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.back.next_back() {
                self.remaining -= 1;
                return Some(item);
            }
            match self.blocks.next_back() {
                Some(block) => self.back = block.iter(),
                None => {
                    let item = self.front.next_back()?;
                    self.remaining -= 1;
                    return Some(item);
                }
            }
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over the elements of a [`ChunkedList`].
pub struct IterMut<'a, T> {
    inner: Flatten<slice::IterMut<'a, Block<T>>>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(blocks: slice::IterMut<'a, Block<T>>, len: usize) -> Self {
        Self { inner: blocks.flatten(), remaining: len }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        let item = self.inner.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator over the elements of a [`ChunkedList`].
pub struct IntoIter<T> {
    inner: Flatten<vec::IntoIter<Block<T>>>,
    remaining: usize,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(blocks: Vec<Block<T>>, len: usize) -> Self {
        Self { inner: blocks.into_iter().flatten(), remaining: len }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        let item = self.inner.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

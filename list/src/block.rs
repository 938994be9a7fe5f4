use std::{
    ops::{Deref, DerefMut, Range},
    slice, vec,
};

/// A contiguous, growable run of elements. The storage unit of a chunked list: positional
/// mutations shift at most one block's worth of elements.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Block<T> {
    items: Vec<T>,
}

impl<T> Block<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Replaces the element at `offset`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= len`.
    pub fn set(&mut self, offset: usize, value: T) -> T {
        std::mem::replace(&mut self.items[offset], value)
    }

    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    pub fn insert(&mut self, offset: usize, value: T) {
        self.items.insert(offset, value);
    }

    /// Inserts all `values` at `offset`, shifting the tail once.
    pub fn insert_many<I: IntoIterator<Item = T>>(&mut self, offset: usize, values: I) {
        self.items.splice(offset..offset, values);
    }

    pub fn remove(&mut self, offset: usize) -> T {
        self.items.remove(offset)
    }

    pub fn remove_range(&mut self, range: Range<usize>) {
        self.items.drain(range);
    }

    pub fn append(&mut self, other: &mut Block<T>) {
        self.items.append(&mut other.items);
    }

    /// Splits the block in two at `offset`, keeping `[0, offset)` and returning the rest.
    pub fn split_off(&mut self, offset: usize) -> Block<T> {
        Block { items: self.items.split_off(offset) }
    }

    pub fn retain<F: FnMut(&T) -> bool>(&mut self, f: F) {
        self.items.retain(f);
    }

    pub fn reverse(&mut self) {
        self.items.reverse();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit();
    }

    /// Reserves room for at least `additional` more elements
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// Returns the offset of the first element in `range` matching `predicate`.
    pub fn find_index<F>(&self, range: Range<usize>, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let start = range.start;
        self.items[range].iter().position(|x| predicate(x)).map(|i| start + i)
    }

    /// Returns the offset of the last element in `range` matching `predicate`.
    pub fn find_last_index<F>(&self, range: Range<usize>, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let start = range.start;
        self.items[range].iter().rposition(|x| predicate(x)).map(|i| start + i)
    }
}

impl<T> Default for Block<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Block<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Block<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

impl<T> Extend<T> for Block<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> Deref for Block<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for Block<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T> IntoIterator for Block<T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Block<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Block<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

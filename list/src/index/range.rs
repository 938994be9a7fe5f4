use super::metadata::BlockInfo;
use smallvec::SmallVec;
use std::{ops::Range, slice};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// The part of one block which intersects a requested global range.
///
/// For a [`Direction::Backward`] range, `local_offset` is the in-block position where a backward
/// walk starts (the last element of the intersection) and the walk visits `count` elements
/// towards the start of the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub ordinal: usize,
    pub local_offset: usize,
    pub count: usize,
    pub block_start: usize,
    pub direction: Direction,
}

impl BlockRange {
    /// Intersects the global range `[index, end)` with `info`, or returns `None` when they do not overlap.
    /// An empty block never overlaps anything.
    pub(crate) fn overlap(info: &BlockInfo, index: usize, end: usize) -> Option<Self> {
        let block_end = info.end();
        if info.count == 0 || index >= end || end <= info.start || index >= block_end {
            return None;
        }
        let (local_offset, count) = if index >= info.start {
            // The range starts inside this block
            (index - info.start, end.min(block_end) - index)
        } else if end < block_end {
            // The range ends inside this block
            (0, end - info.start)
        } else {
            // The block lies entirely inside the range
            (0, info.count)
        };
        Some(Self { ordinal: info.ordinal, local_offset, count, block_start: info.start, direction: Direction::Forward })
    }

    /// Flips a forward range so that its offset points at the last element of the intersection.
    pub(crate) fn mirrored(self) -> Self {
        debug_assert_eq!(self.direction, Direction::Forward);
        Self { local_offset: self.local_offset + self.count - 1, direction: Direction::Backward, ..self }
    }

    /// The in-block positions covered, in ascending order regardless of direction
    pub fn local_span(&self) -> Range<usize> {
        match self.direction {
            Direction::Forward => self.local_offset..self.local_offset + self.count,
            Direction::Backward => self.local_offset + 1 - self.count..self.local_offset + 1,
        }
    }

    /// The global positions covered, in ascending order regardless of direction
    pub fn global_span(&self) -> Range<usize> {
        let local = self.local_span();
        self.block_start + local.start..self.block_start + local.end
    }

    #[inline]
    pub fn to_global(&self, local: usize) -> usize {
        self.block_start + local
    }
}

/// An ordered (or reverse-ordered) decomposition of a global range into per-block ranges.
/// Computed per query, never cached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiBlockRange {
    first_ordinal: usize,
    direction: Direction,
    ranges: SmallVec<[BlockRange; 4]>,
}

impl MultiBlockRange {
    pub(crate) fn new(first_ordinal: usize, ranges: SmallVec<[BlockRange; 4]>) -> Self {
        Self { first_ordinal, direction: Direction::Forward, ranges }
    }

    pub(crate) fn empty(first_ordinal: usize, direction: Direction) -> Self {
        Self { first_ordinal, direction, ranges: SmallVec::new() }
    }

    /// Reverses block order and mirrors every block range.
    pub(crate) fn reversed(self) -> Self {
        debug_assert_eq!(self.direction, Direction::Forward);
        let first_ordinal = self.ranges.last().map_or(self.first_ordinal, |r| r.ordinal);
        let ranges = self.ranges.into_iter().rev().map(BlockRange::mirrored).collect();
        Self { first_ordinal, direction: Direction::Backward, ranges }
    }

    /// Ordinal of the first block visited, i.e. the lowest ordinal of a forward range
    /// and the highest of a backward one
    pub fn first_ordinal(&self) -> usize {
        self.first_ordinal
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of blocks the range touches
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of elements the range covers
    pub fn element_count(&self) -> usize {
        self.ranges.iter().map(|r| r.count).sum()
    }

    pub fn iter(&self) -> slice::Iter<'_, BlockRange> {
        self.ranges.iter()
    }

    pub fn as_slice(&self) -> &[BlockRange] {
        &self.ranges
    }
}

impl<'a> IntoIterator for &'a MultiBlockRange {
    type Item = &'a BlockRange;
    type IntoIter = slice::Iter<'a, BlockRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl IntoIterator for MultiBlockRange {
    type Item = BlockRange;
    type IntoIter = smallvec::IntoIter<[BlockRange; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(start: usize, count: usize, index: usize, end: usize) -> Option<(usize, usize)> {
        BlockRange::overlap(&BlockInfo::new(0, start, count), index, end).map(|r| (r.local_offset, r.count))
    }

    #[test]
    fn test_overlap_cases() {
        // Block [10, 20)
        assert_eq!(overlap(10, 10, 12, 15), Some((2, 3)));
        assert_eq!(overlap(10, 10, 12, 30), Some((2, 8)));
        assert_eq!(overlap(10, 10, 5, 15), Some((0, 5)));
        assert_eq!(overlap(10, 10, 5, 30), Some((0, 10)));
        assert_eq!(overlap(10, 10, 10, 20), Some((0, 10)));
        assert_eq!(overlap(10, 10, 0, 10), None);
        assert_eq!(overlap(10, 10, 20, 25), None);
        assert_eq!(overlap(10, 10, 12, 12), None);
        assert_eq!(overlap(10, 0, 5, 30), None);
        assert_eq!(overlap(10, 0, 10, 11), None);
        assert_eq!(overlap(0, 0, 0, 1), None);
    }

    #[test]
    fn test_mirrored_spans() {
        let forward = BlockRange::overlap(&BlockInfo::new(2, 10, 10), 12, 15).unwrap();
        assert_eq!(forward.local_span(), 2..5);
        assert_eq!(forward.global_span(), 12..15);

        let backward = forward.mirrored();
        assert_eq!(backward.local_offset, 4);
        assert_eq!(backward.local_span(), 2..5);
        assert_eq!(backward.global_span(), 12..15);
        assert_eq!(backward.to_global(backward.local_offset), 14);
    }

    #[test]
    fn test_reversed_multi_range() {
        let infos = [BlockInfo::new(0, 0, 4), BlockInfo::new(1, 4, 4), BlockInfo::new(2, 8, 4)];
        let ranges = infos.iter().filter_map(|info| BlockRange::overlap(info, 2, 10)).collect();
        let forward = MultiBlockRange::new(0, ranges);
        assert_eq!(forward.len(), 3);
        assert_eq!(forward.element_count(), 8);

        let backward = forward.clone().reversed();
        assert_eq!(backward.direction(), Direction::Backward);
        assert_eq!(backward.first_ordinal(), 2);
        let parts = backward.iter().map(|r| (r.ordinal, r.local_offset, r.count)).collect::<Vec<_>>();
        assert_eq!(parts, vec![(2, 1, 2), (1, 3, 4), (0, 3, 2)]);
        assert_eq!(backward.element_count(), forward.element_count());
    }
}

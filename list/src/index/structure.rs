use super::{
    metadata::{BlockInfo, Watermark},
    range::{BlockRange, Direction, MultiBlockRange},
};
use crate::errors::{ListError, ListResult, check_backward_range, check_range};
use chunked_core::trace;

/// Read access to the block sizes the index is built over.
pub trait BlockSizes {
    fn block_count(&self) -> usize;

    /// Element count of the block at `ordinal`. Called only with `ordinal < block_count()`.
    fn block_len(&self, ordinal: usize) -> usize;
}

impl BlockSizes for [usize] {
    fn block_count(&self) -> usize {
        self.len()
    }

    fn block_len(&self, ordinal: usize) -> usize {
        self[ordinal]
    }
}

/// Resolves global positions to blocks.
///
/// Holds a cache of [`BlockInfo`] entries, one per leading block, and a [`Watermark`]. Entries
/// below the watermark are trusted; the rest are recomputed lazily, on the first query which
/// reaches them. The owning container must report every mutation through [`Self::data_changed`]
/// or [`Self::data_changed_after_removal`] with the lowest ordinal it touched.
#[derive(Clone, Debug, Default)]
pub struct StructureIndex {
    entries: Vec<BlockInfo>,
    watermark: Watermark,
}

impl StructureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    /// Number of cached entries, trusted or not
    pub fn cached(&self) -> usize {
        self.entries.len()
    }

    /// Number of leading entries which are known to be valid
    pub fn trusted(&self) -> usize {
        self.watermark.trusted(self.entries.len())
    }

    /// Records that the block at `ordinal` changed size, or that blocks were inserted or removed at `ordinal`.
    pub fn data_changed(&mut self, ordinal: usize) {
        self.watermark = self.watermark.lower(ordinal);
    }

    /// Records that blocks were removed at `ordinal`, leaving `block_count` blocks.
    ///
    /// When only trailing blocks disappeared, the entries before them stay valid and are kept.
    pub fn data_changed_after_removal(&mut self, ordinal: usize, block_count: usize) {
        if ordinal < block_count {
            self.data_changed(ordinal);
            return;
        }
        self.entries.truncate(block_count);
        if let Watermark::StaleFrom(stale) = self.watermark
            && stale >= self.entries.len()
        {
            self.watermark = Watermark::Clean;
        }
    }

    /// Drops every cached entry
    pub fn reset(&mut self) {
        self.entries.clear();
        self.watermark = Watermark::Clean;
    }

    /// Resolves the block holding the global position `index` of a sequence of `total` elements.
    pub fn block_info<S: BlockSizes + ?Sized>(&mut self, blocks: &S, total: usize, index: usize) -> ListResult<BlockInfo> {
        self.block_info_from(blocks, total, index, 0)
    }

    /// Same as [`Self::block_info`], with a hint that the owning block is at or after `min_ordinal`.
    /// A wrong hint only costs a wider search.
    pub fn block_info_from<S: BlockSizes + ?Sized>(
        &mut self,
        blocks: &S,
        total: usize,
        index: usize,
        min_ordinal: usize,
    ) -> ListResult<BlockInfo> {
        if index >= total {
            return Err(ListError::IndexOutOfRange { index, len: total });
        }
        let trusted = self.trusted();
        if trusted > 0 && index < self.entries[trusted - 1].end() {
            let hint = min_ordinal.min(trusted - 1);
            let lo = if self.entries[hint].start <= index { hint } else { 0 };
            return self.interpolation_search(index, lo, trusted - 1);
        }
        self.extend_to(blocks, index)
    }

    /// Searches the trusted entries `[lo, hi]` known to cover `index`.
    ///
    /// Probes are placed proportionally to the position of `index` within the covered span. A probe
    /// which fails to halve the window is followed by a plain bisection, so a skewed size distribution
    /// degrades to O(log n) instead of O(n).
    fn interpolation_search(&self, index: usize, mut lo: usize, mut hi: usize) -> ListResult<BlockInfo> {
        let mut bisect = false;
        while lo <= hi {
            let width = hi - lo;
            let probe = if bisect { lo + width / 2 } else { self.interpolate(index, lo, hi) };
            let candidate = self.entries[probe];
            if index < candidate.start {
                if probe == lo {
                    break;
                }
                hi = probe - 1;
            } else if index >= candidate.end() {
                lo = probe + 1;
            } else {
                return Ok(candidate);
            }
            bisect = !bisect && lo <= hi && hi - lo > width / 2;
        }
        Err(ListError::DataInconsistency(format!("position {} is not covered by trusted blocks {}..={}", index, lo, hi)))
    }

    /// Estimates the ordinal of `index` within entries `[lo, hi]`, clamped into the window.
    #[inline]
    fn interpolate(&self, index: usize, lo: usize, hi: usize) -> usize {
        let (start, end) = (self.entries[lo].start, self.entries[hi].end());
        if end <= start || index <= start {
            return lo;
        }
        let estimate = (index - start) as u128 * (hi - lo + 1) as u128 / (end - start) as u128;
        lo + (estimate as usize).min(hi - lo)
    }

    /// Discards the untrusted entries and walks forward from the last trusted one, recording each
    /// block until the one holding `index` is found.
    fn extend_to<S: BlockSizes + ?Sized>(&mut self, blocks: &S, index: usize) -> ListResult<BlockInfo> {
        let trusted = self.trusted();
        self.entries.truncate(trusted);
        self.watermark = Watermark::Clean;

        let mut start = self.entries.last().map_or(0, BlockInfo::end);
        let block_count = blocks.block_count();
        for ordinal in trusted..block_count {
            let info = BlockInfo::new(ordinal, start, blocks.block_len(ordinal));
            self.entries.push(info);
            if info.contains(index) {
                if ordinal > trusted {
                    trace!("structure index walked blocks {}..={} to resolve position {}", trusted, ordinal, index);
                }
                return Ok(info);
            }
            start = info.end();
        }
        Err(ListError::DataInconsistency(format!("position {} is past the {} elements held by {} blocks", index, start, block_count)))
    }

    /// Decomposes `[index, index + count)` into per-block ranges in ascending ordinal order.
    pub fn multi_block_range<S: BlockSizes + ?Sized>(
        &mut self,
        blocks: &S,
        total: usize,
        index: usize,
        count: usize,
    ) -> ListResult<MultiBlockRange> {
        check_range(index, count, total)?;
        if count == 0 {
            let first_ordinal = if index == 0 {
                0
            } else if index < total {
                self.block_info(blocks, total, index)?.ordinal
            } else {
                blocks.block_count()
            };
            return Ok(MultiBlockRange::empty(first_ordinal, Direction::Forward));
        }

        let end = index + count;
        let first = self.block_info(blocks, total, index)?;
        if end <= first.end() {
            let range = BlockRange::overlap(&first, index, end).into_iter().collect();
            return Ok(MultiBlockRange::new(first.ordinal, range));
        }
        let last = self.block_info_from(blocks, total, end - 1, first.ordinal)?;
        // Resolving `last` left every entry up to it trusted
        let ranges =
            self.entries[first.ordinal..=last.ordinal].iter().filter_map(|info| BlockRange::overlap(info, index, end)).collect();
        Ok(MultiBlockRange::new(first.ordinal, ranges))
    }

    /// Decomposes the `count` positions ending at (and including) `index` into per-block ranges in
    /// descending ordinal order, each mirrored to walk backward from the end of its intersection.
    pub fn reverse_multi_block_range<S: BlockSizes + ?Sized>(
        &mut self,
        blocks: &S,
        total: usize,
        index: usize,
        count: usize,
    ) -> ListResult<MultiBlockRange> {
        check_backward_range(index, count, total)?;
        if count == 0 {
            let first_ordinal = if index < total { self.block_info(blocks, total, index)?.ordinal } else { blocks.block_count() };
            return Ok(MultiBlockRange::empty(first_ordinal, Direction::Backward));
        }
        Ok(self.multi_block_range(blocks, total, index + 1 - count, count)?.reversed())
    }

    /// Checks every trusted entry against the actual block sizes.
    pub fn check_consistency<S: BlockSizes + ?Sized>(&self, blocks: &S) -> ListResult<()> {
        let mut start = 0;
        for (ordinal, info) in self.entries[..self.trusted()].iter().enumerate() {
            if ordinal >= blocks.block_count() {
                let blocks = blocks.block_count();
                return Err(ListError::DataInconsistency(format!("cached {:?} but there are only {} blocks", info, blocks)));
            }
            let expected = BlockInfo::new(ordinal, start, blocks.block_len(ordinal));
            if *info != expected {
                return Err(ListError::DataInconsistency(format!("cached {:?} but the block structure gives {:?}", info, expected)));
            }
            start = expected.end();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn flatten(sizes: &[usize]) -> Vec<(usize, usize)> {
        sizes.iter().enumerate().flat_map(|(ordinal, &len)| (0..len).map(move |local| (ordinal, local))).collect()
    }

    fn assert_resolves_all(index: &mut StructureIndex, sizes: &[usize]) {
        let total = sizes.iter().sum();
        for (position, (ordinal, local)) in flatten(sizes).into_iter().enumerate() {
            let info = index.block_info(sizes, total, position).unwrap();
            assert_eq!((info.ordinal, info.local(position)), (ordinal, local), "position {}", position);
        }
    }

    #[test]
    fn test_resolution_on_cold_and_warm_cache() {
        let sizes = vec![3, 5, 1, 8, 2, 4];
        let mut index = StructureIndex::new();
        // Cold: every lookup walks forward; warm: every lookup is a cached search
        assert_resolves_all(&mut index, &sizes);
        assert_eq!(index.trusted(), sizes.len());
        assert_resolves_all(&mut index, &sizes);

        // Resolving far first fills the cache in one walk, then earlier positions are searched
        let mut index = StructureIndex::new();
        assert_eq!(index.block_info(sizes.as_slice(), 23, 22).unwrap(), BlockInfo::new(5, 19, 4));
        assert_eq!(index.cached(), 6);
        assert_eq!(index.block_info(sizes.as_slice(), 23, 8).unwrap(), BlockInfo::new(2, 8, 1));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let sizes = vec![2, 2];
        let mut index = StructureIndex::new();
        assert_eq!(index.block_info(sizes.as_slice(), 4, 4), Err(ListError::IndexOutOfRange { index: 4, len: 4 }));
        let empty: Vec<usize> = vec![];
        assert!(index.block_info(empty.as_slice(), 0, 0).is_err());
        let one_empty_block = vec![0];
        assert!(StructureIndex::new().block_info(one_empty_block.as_slice(), 0, 0).is_err());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let sizes = vec![4, 4, 4, 4, 4];
        let mut index = StructureIndex::new();
        let first = index.block_info(sizes.as_slice(), 20, 13).unwrap();
        let second = index.block_info(sizes.as_slice(), 20, 13).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, BlockInfo::new(3, 12, 4));
    }

    #[test]
    fn test_invalidation_after_growth() {
        let mut sizes = vec![4, 4, 4, 4];
        let mut index = StructureIndex::new();
        assert_resolves_all(&mut index, &sizes);

        sizes[1] += 3;
        index.data_changed(1);
        assert_eq!(index.watermark(), Watermark::StaleFrom(1));
        assert_eq!(index.trusted(), 1);
        // A position inside the trusted prefix does not touch the stale part
        assert_eq!(index.block_info(sizes.as_slice(), 19, 2).unwrap(), BlockInfo::new(0, 0, 4));
        assert_eq!(index.cached(), 4);
        assert_resolves_all(&mut index, &sizes);
        assert_eq!(index.watermark(), Watermark::Clean);

        // Lowering never raises
        index.data_changed(3);
        index.data_changed(2);
        index.data_changed(3);
        assert_eq!(index.watermark(), Watermark::StaleFrom(2));
        index.check_consistency(sizes.as_slice()).unwrap();
    }

    #[test]
    fn test_trailing_removal_keeps_cache() {
        let mut sizes = vec![4, 4, 4, 4];
        let mut index = StructureIndex::new();
        assert_resolves_all(&mut index, &sizes);

        sizes.truncate(3);
        index.data_changed_after_removal(3, sizes.len());
        assert_eq!(index.watermark(), Watermark::Clean);
        assert_eq!(index.trusted(), 3);
        index.check_consistency(sizes.as_slice()).unwrap();

        // A removal in the middle invalidates from there
        sizes.remove(1);
        index.data_changed_after_removal(1, sizes.len());
        assert_eq!(index.trusted(), 1);
        assert_resolves_all(&mut index, &sizes);

        // An earlier stale mark survives a trailing removal
        index.data_changed(0);
        sizes.pop();
        index.data_changed_after_removal(1, sizes.len());
        assert_eq!(index.watermark(), Watermark::StaleFrom(0));
        assert_resolves_all(&mut index, &sizes);
    }

    #[test]
    fn test_skewed_sizes_terminate() {
        // One huge block among tiny ones defeats interpolation; bisection must take over
        let mut sizes = vec![1; 200];
        sizes[3] = 1_000_000;
        sizes[150] = 500_000;
        let total = sizes.iter().sum();
        let mut index = StructureIndex::new();
        index.block_info(sizes.as_slice(), total, total - 1).unwrap();
        let mut start = 0;
        for (ordinal, &len) in sizes.iter().enumerate() {
            for position in [start, start + len / 2, start + len - 1] {
                assert_eq!(index.block_info(sizes.as_slice(), total, position).unwrap(), BlockInfo::new(ordinal, start, len));
            }
            start += len;
        }
    }

    #[test]
    fn test_multi_block_range_completeness() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sizes: Vec<usize> = (0..40).map(|_| rng.gen_range(1..12)).collect();
        let total: usize = sizes.iter().sum();
        let flat = flatten(&sizes);
        let mut index = StructureIndex::new();
        for _ in 0..500 {
            let position = rng.gen_range(0..=total);
            let count = rng.gen_range(0..=total - position);
            let range = index.multi_block_range(sizes.as_slice(), total, position, count).unwrap();
            assert_eq!(range.element_count(), count);

            let covered: Vec<(usize, usize)> =
                range.iter().flat_map(|r| r.local_span().map(move |local| (r.ordinal, local))).collect();
            assert_eq!(covered, flat[position..position + count]);
            if count > 0 {
                assert_eq!(range.first_ordinal(), flat[position].0);
            }

            if count == 0 {
                continue;
            }
            let reversed = index.reverse_multi_block_range(sizes.as_slice(), total, position + count - 1, count).unwrap();
            assert_eq!(reversed.direction(), Direction::Backward);
            let walked: Vec<(usize, usize)> = reversed
                .iter()
                .flat_map(|r| (0..r.count).map(move |step| (r.ordinal, r.local_offset - step)))
                .collect();
            assert_eq!(walked, flat[position..position + count].iter().rev().copied().collect::<Vec<_>>());
            // Interleave mutations so that the cache is exercised while stale
            if rng.gen_bool(0.1) {
                index.data_changed(rng.gen_range(0..sizes.len()));
            }
        }
    }

    #[test]
    fn test_empty_and_invalid_ranges() {
        let sizes = vec![5, 5];
        let mut index = StructureIndex::new();
        let range = index.multi_block_range(sizes.as_slice(), 10, 0, 0).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.first_ordinal(), 0);
        assert_eq!(index.cached(), 0);

        assert_eq!(index.multi_block_range(sizes.as_slice(), 10, 7, 0).unwrap().first_ordinal(), 1);
        assert_eq!(index.multi_block_range(sizes.as_slice(), 10, 10, 0).unwrap().first_ordinal(), 2);
        assert_eq!(
            index.multi_block_range(sizes.as_slice(), 10, 8, 3),
            Err(ListError::RangeOutOfRange { index: 8, count: 3, len: 10 })
        );
        assert!(index.reverse_multi_block_range(sizes.as_slice(), 10, 3, 5).is_err());
        assert!(index.reverse_multi_block_range(sizes.as_slice(), 10, 10, 1).is_err());

        let empty: Vec<usize> = vec![];
        let range = StructureIndex::new().multi_block_range(empty.as_slice(), 0, 0, 0).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn test_range_within_single_block() {
        let sizes = vec![5, 5, 5];
        let mut index = StructureIndex::new();
        let range = index.multi_block_range(sizes.as_slice(), 15, 6, 3).unwrap();
        let expected = BlockRange { ordinal: 1, local_offset: 1, count: 3, block_start: 5, direction: Direction::Forward };
        assert_eq!(range.as_slice(), &[expected]);
        let range = index.multi_block_range(sizes.as_slice(), 15, 4, 7).unwrap();
        assert_eq!(parts(&range), vec![(0, 4, 1), (1, 0, 5), (2, 0, 1)]);
    }

    fn parts(range: &MultiBlockRange) -> Vec<(usize, usize, usize)> {
        range.iter().map(|r| (r.ordinal, r.local_offset, r.count)).collect()
    }

    #[test]
    fn test_ranges_skip_empty_blocks() {
        let sizes = vec![5, 0, 5];
        let mut index = StructureIndex::new();
        assert_eq!(parts(&index.multi_block_range(sizes.as_slice(), 10, 3, 5).unwrap()), vec![(0, 3, 2), (2, 0, 3)]);
        assert_eq!(parts(&index.reverse_multi_block_range(sizes.as_slice(), 10, 9, 10).unwrap()), vec![(2, 4, 5), (0, 4, 5)]);
        assert_eq!(index.block_info(sizes.as_slice(), 10, 5).unwrap(), BlockInfo::new(2, 5, 5));

        // Leading, trailing and consecutive empty blocks
        let sizes = vec![0, 3, 0, 0, 2, 0];
        let mut index = StructureIndex::new();
        assert_eq!(parts(&index.multi_block_range(sizes.as_slice(), 5, 0, 5).unwrap()), vec![(1, 0, 3), (4, 0, 2)]);
        assert_eq!(parts(&index.reverse_multi_block_range(sizes.as_slice(), 5, 4, 5).unwrap()), vec![(4, 1, 2), (1, 2, 3)]);
        assert_eq!(parts(&index.multi_block_range(sizes.as_slice(), 5, 2, 2).unwrap()), vec![(1, 2, 1), (4, 0, 1)]);
    }

    #[test]
    fn test_randomized_ranges_with_empty_blocks() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let sizes: Vec<usize> = (0..30).map(|_| if rng.gen_bool(0.3) { 0 } else { rng.gen_range(1..6) }).collect();
        let total: usize = sizes.iter().sum();
        let flat = flatten(&sizes);
        let mut index = StructureIndex::new();
        assert_resolves_all(&mut index, &sizes);
        for _ in 0..300 {
            let position = rng.gen_range(0..total);
            let count = rng.gen_range(1..=total - position);
            let range = index.multi_block_range(sizes.as_slice(), total, position, count).unwrap();
            assert!(range.iter().all(|r| r.count > 0));
            let covered: Vec<(usize, usize)> =
                range.iter().flat_map(|r| r.local_span().map(move |local| (r.ordinal, local))).collect();
            assert_eq!(covered, flat[position..position + count]);

            let reversed = index.reverse_multi_block_range(sizes.as_slice(), total, position + count - 1, count).unwrap();
            assert!(reversed.iter().all(|r| r.count > 0));
            assert_eq!(reversed.element_count(), count);
            let walked: Vec<(usize, usize)> =
                reversed.iter().flat_map(|r| (0..r.count).map(move |step| (r.ordinal, r.local_offset - step))).collect();
            assert_eq!(walked, flat[position..position + count].iter().rev().copied().collect::<Vec<_>>());
        }
    }
}

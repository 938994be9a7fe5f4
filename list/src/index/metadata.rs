use std::ops::Range;

/// Cached facts about one block: its ordinal, the global position of its first element and its
/// element count. Stale once any block at or before `ordinal` changes size or position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockInfo {
    pub ordinal: usize,
    pub start: usize,
    pub count: usize,
}

impl BlockInfo {
    pub fn new(ordinal: usize, start: usize, count: usize) -> Self {
        Self { ordinal, start, count }
    }

    /// Global position one past the last element of the block
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end()
    }

    /// Offset of the global position `index` within the block
    #[inline]
    pub fn local(&self, index: usize) -> usize {
        index - self.start
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Marks how much of the metadata cache can be trusted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Watermark {
    /// Every cached entry is valid
    #[default]
    Clean,

    /// Entries at and after this ordinal may be wrong
    StaleFrom(usize),
}

impl Watermark {
    /// Number of leading entries out of `cached` which can be trusted
    #[inline]
    pub fn trusted(self, cached: usize) -> usize {
        match self {
            Watermark::Clean => cached,
            Watermark::StaleFrom(ordinal) => ordinal.min(cached),
        }
    }

    /// Lowers the watermark to `ordinal`. Never raises it.
    #[inline]
    pub fn lower(self, ordinal: usize) -> Self {
        match self {
            Watermark::StaleFrom(current) if current <= ordinal => self,
            _ => Watermark::StaleFrom(ordinal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_info_geometry() {
        let info = BlockInfo::new(3, 10, 5);
        assert_eq!(info.end(), 15);
        assert!(info.contains(10) && info.contains(14));
        assert!(!info.contains(9) && !info.contains(15));
        assert_eq!(info.local(12), 2);
        assert_eq!(info.span(), 10..15);
        assert!(!BlockInfo::new(0, 0, 0).contains(0));
    }

    #[test]
    fn test_watermark_only_lowers() {
        let mark = Watermark::Clean.lower(7);
        assert_eq!(mark, Watermark::StaleFrom(7));
        assert_eq!(mark.lower(9), Watermark::StaleFrom(7));
        assert_eq!(mark.lower(2), Watermark::StaleFrom(2));
        assert_eq!(Watermark::Clean.trusted(4), 4);
        assert_eq!(Watermark::StaleFrom(2).trusted(4), 2);
        assert_eq!(Watermark::StaleFrom(9).trusted(4), 4);
    }
}

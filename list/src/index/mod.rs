//!
//! Position-to-block resolution.
//!
//! [`StructureIndex`] caches the start offset and element count of every block it has visited and
//! resolves a global position to its owning block by interpolation search over the trusted prefix
//! of that cache, extending the cache linearly when the position lies beyond it. Mutations only
//! lower a single watermark, so invalidation is O(1).
//!

mod metadata;
mod range;
mod structure;

pub use metadata::{BlockInfo, Watermark};
pub use range::{BlockRange, Direction, MultiBlockRange};
pub use structure::{BlockSizes, StructureIndex};

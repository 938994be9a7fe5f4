//!
//! # Chunked List
//!
//! A sequence container storing its elements in bounded contiguous blocks, with an index that
//! maps global positions to blocks in better than linear time while the blocks are being divided,
//! inserted and removed.
//!
//! - [`block`] the storage unit
//! - [`balancer`] block sizing policies
//! - [`container`] the ordered block sequence and its division rules
//! - [`index`] position resolution and range decomposition
//! - [`list`] the public [`ChunkedList`](list::ChunkedList) type
//! - [`cursor`] cursors and iterators
//!

pub mod balancer;
pub mod block;
pub mod config;
pub mod container;
pub mod cursor;
pub mod errors;
pub mod index;
pub mod list;

pub mod prelude {
    pub use crate::balancer::{AnyBalancer, Balancer, FixedBalancer, GrowingBalancer};
    pub use crate::config::{BalancerConfig, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_BLOCK_SIZE, ListConfig};
    pub use crate::cursor::Cursor;
    pub use crate::errors::{BalancerError, ListError, ListResult};
    pub use crate::list::ChunkedList;
}

pub use list::ChunkedList;

extern crate self as chunked_core;

pub mod log;

pub use crate::log::{debug, error, info, trace, warn};

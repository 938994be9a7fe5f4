use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalancerError {
    #[error("balancer default block size must be positive (ordinal {0})")]
    ZeroBlockSize(usize),

    #[error("balancer max block size {max} is below the default block size {default} (ordinal {ordinal})")]
    MaxBelowDefault { ordinal: usize, default: usize, max: usize },

    #[error("growing balancer doubling interval must be positive")]
    ZeroGrowthInterval,

    #[error("growing balancer size limit {limit} is below the initial block size {initial}")]
    LimitBelowInitial { initial: usize, limit: usize },

    #[error("growing balancer split factor must be positive")]
    ZeroSplitFactor,
}

pub type BalancerResult<T> = std::result::Result<T, BalancerError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("range of {count} elements at index {index} is out of range for a list of length {len}")]
    RangeOutOfRange { index: usize, count: usize, len: usize },

    #[error("block ordinal {ordinal} is out of range for {blocks} blocks")]
    OrdinalOutOfRange { ordinal: usize, blocks: usize },

    #[error("invalid balancer configuration: {0}")]
    Balancer(#[from] BalancerError),

    /// The block structure and its index disagree. Never expected in correct operation and
    /// not recoverable; the list must be discarded.
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),
}

pub type ListResult<T> = std::result::Result<T, ListError>;

impl ListError {
    /// Returns `true` for the out-of-range family of errors caused by the caller's arguments.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, ListError::IndexOutOfRange { .. } | ListError::RangeOutOfRange { .. } | ListError::OrdinalOutOfRange { .. })
    }
}

/// Checks that `[index, index + count)` lies within a sequence of length `len`.
pub(crate) fn check_range(index: usize, count: usize, len: usize) -> ListResult<()> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ListError::RangeOutOfRange { index, count, len }),
    }
}

/// Checks the backward range of `count` elements ending at (and including) `index`.
pub(crate) fn check_backward_range(index: usize, count: usize, len: usize) -> ListResult<()> {
    if count == 0 {
        return if index <= len { Ok(()) } else { Err(ListError::RangeOutOfRange { index, count, len }) };
    }
    if index < len && count <= index + 1 { Ok(()) } else { Err(ListError::RangeOutOfRange { index, count, len }) }
}

//!
//! Block sizing policies.
//!
//! A balancer answers, per block ordinal, how large a freshly divided block should be, at which
//! size a block must be divided, and how much room to reserve for a block about to be appended.
//!

use crate::{
    config::{DEFAULT_BLOCK_SIZE, DEFAULT_MAX_BLOCK_SIZE},
    errors::{BalancerError, BalancerResult},
};
use std::sync::Arc;

/// Number of leading ordinals probed by the default [`Balancer::validate`] implementation
pub const VALIDATION_PROBE_ORDINALS: usize = 64;

pub trait Balancer {
    /// Size of the pieces a block is divided into, and the fill target of bulk ingestion
    fn default_block_size(&self, ordinal: usize) -> usize;

    /// Size at which a block must be divided before it can grow further
    fn max_block_size(&self, ordinal: usize) -> usize;

    /// Capacity reserved for a new block appended at `ordinal`
    fn new_block_size(&self, ordinal: usize) -> usize {
        self.default_block_size(ordinal)
    }

    /// Checks `max_block_size(o) >= default_block_size(o) > 0`. Policies which cannot be proven
    /// valid for every ordinal from their parameters are probed over the first
    /// [`VALIDATION_PROBE_ORDINALS`] ordinals only.
    ///
    /// Past the probed ordinals a container does not trust the policy: it raises a zero default
    /// size to 1 and a max size below the default size to the default size.
    fn validate(&self) -> BalancerResult<()> {
        for ordinal in 0..VALIDATION_PROBE_ORDINALS {
            check_sizes(ordinal, self.default_block_size(ordinal), self.max_block_size(ordinal))?;
        }
        Ok(())
    }
}

fn check_sizes(ordinal: usize, default: usize, max: usize) -> BalancerResult<()> {
    if default == 0 {
        return Err(BalancerError::ZeroBlockSize(ordinal));
    }
    if max < default {
        return Err(BalancerError::MaxBelowDefault { ordinal, default, max });
    }
    Ok(())
}

/// Same sizes for every block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedBalancer {
    block_size: usize,
    max_block_size: usize,
}

impl FixedBalancer {
    pub fn new(block_size: usize, max_block_size: usize) -> BalancerResult<Self> {
        check_sizes(0, block_size, max_block_size)?;
        Ok(Self { block_size, max_block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn max_size(&self) -> usize {
        self.max_block_size
    }
}

impl Default for FixedBalancer {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE, max_block_size: DEFAULT_MAX_BLOCK_SIZE }
    }
}

impl Balancer for FixedBalancer {
    fn default_block_size(&self, _ordinal: usize) -> usize {
        self.block_size
    }

    fn max_block_size(&self, _ordinal: usize) -> usize {
        self.max_block_size
    }

    fn validate(&self) -> BalancerResult<()> {
        check_sizes(0, self.block_size, self.max_block_size)
    }
}

/// Block sizes double every `doubling_interval` ordinals, up to `block_size_limit`.
///
/// Later blocks hold proportionally more elements, which bounds the number of blocks of very
/// large lists at the price of longer shifts near the tail. The max size of a block is its
/// default size times `split_factor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowingBalancer {
    initial_block_size: usize,
    doubling_interval: usize,
    block_size_limit: usize,
    split_factor: usize,
}

impl GrowingBalancer {
    pub const DEFAULT_INITIAL_BLOCK_SIZE: usize = 256;
    pub const DEFAULT_DOUBLING_INTERVAL: usize = 16;
    pub const DEFAULT_BLOCK_SIZE_LIMIT: usize = 64 * 1024;
    pub const DEFAULT_SPLIT_FACTOR: usize = 2;

    pub fn new(
        initial_block_size: usize,
        doubling_interval: usize,
        block_size_limit: usize,
        split_factor: usize,
    ) -> BalancerResult<Self> {
        let balancer = Self { initial_block_size, doubling_interval, block_size_limit, split_factor };
        balancer.validate()?;
        Ok(balancer)
    }

    pub fn initial_block_size(&self) -> usize {
        self.initial_block_size
    }

    pub fn doubling_interval(&self) -> usize {
        self.doubling_interval
    }

    pub fn block_size_limit(&self) -> usize {
        self.block_size_limit
    }

    pub fn split_factor(&self) -> usize {
        self.split_factor
    }
}

impl Default for GrowingBalancer {
    fn default() -> Self {
        Self {
            initial_block_size: Self::DEFAULT_INITIAL_BLOCK_SIZE,
            doubling_interval: Self::DEFAULT_DOUBLING_INTERVAL,
            block_size_limit: Self::DEFAULT_BLOCK_SIZE_LIMIT,
            split_factor: Self::DEFAULT_SPLIT_FACTOR,
        }
    }
}

impl Balancer for GrowingBalancer {
    fn default_block_size(&self, ordinal: usize) -> usize {
        let doublings = (ordinal / self.doubling_interval.max(1)).min(usize::BITS as usize - 1) as u32;
        self.initial_block_size.saturating_mul(1usize << doublings).min(self.block_size_limit)
    }

    fn max_block_size(&self, ordinal: usize) -> usize {
        self.default_block_size(ordinal).saturating_mul(self.split_factor)
    }

    fn validate(&self) -> BalancerResult<()> {
        if self.initial_block_size == 0 {
            return Err(BalancerError::ZeroBlockSize(0));
        }
        if self.doubling_interval == 0 {
            return Err(BalancerError::ZeroGrowthInterval);
        }
        if self.block_size_limit < self.initial_block_size {
            return Err(BalancerError::LimitBelowInitial { initial: self.initial_block_size, limit: self.block_size_limit });
        }
        if self.split_factor == 0 {
            return Err(BalancerError::ZeroSplitFactor);
        }
        Ok(())
    }
}

/// A balancer chosen at runtime, typically from a [`BalancerConfig`](crate::config::BalancerConfig).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyBalancer {
    Fixed(FixedBalancer),
    Growing(GrowingBalancer),
}

impl Default for AnyBalancer {
    fn default() -> Self {
        AnyBalancer::Fixed(FixedBalancer::default())
    }
}

impl From<FixedBalancer> for AnyBalancer {
    fn from(balancer: FixedBalancer) -> Self {
        AnyBalancer::Fixed(balancer)
    }
}

impl From<GrowingBalancer> for AnyBalancer {
    fn from(balancer: GrowingBalancer) -> Self {
        AnyBalancer::Growing(balancer)
    }
}

impl Balancer for AnyBalancer {
    fn default_block_size(&self, ordinal: usize) -> usize {
        match self {
            AnyBalancer::Fixed(b) => b.default_block_size(ordinal),
            AnyBalancer::Growing(b) => b.default_block_size(ordinal),
        }
    }

    fn max_block_size(&self, ordinal: usize) -> usize {
        match self {
            AnyBalancer::Fixed(b) => b.max_block_size(ordinal),
            AnyBalancer::Growing(b) => b.max_block_size(ordinal),
        }
    }

    fn new_block_size(&self, ordinal: usize) -> usize {
        match self {
            AnyBalancer::Fixed(b) => b.new_block_size(ordinal),
            AnyBalancer::Growing(b) => b.new_block_size(ordinal),
        }
    }

    fn validate(&self) -> BalancerResult<()> {
        match self {
            AnyBalancer::Fixed(b) => b.validate(),
            AnyBalancer::Growing(b) => b.validate(),
        }
    }
}

impl<B: Balancer + ?Sized> Balancer for Arc<B> {
    fn default_block_size(&self, ordinal: usize) -> usize {
        (**self).default_block_size(ordinal)
    }

    fn max_block_size(&self, ordinal: usize) -> usize {
        (**self).max_block_size(ordinal)
    }

    fn new_block_size(&self, ordinal: usize) -> usize {
        (**self).new_block_size(ordinal)
    }

    fn validate(&self) -> BalancerResult<()> {
        (**self).validate()
    }
}

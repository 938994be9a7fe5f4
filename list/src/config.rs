use crate::{
    balancer::{AnyBalancer, FixedBalancer, GrowingBalancer},
    errors::BalancerResult,
};
use serde::{Deserialize, Serialize};

/// Default size of a freshly divided block
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Default size at which a block is divided
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 2 * DEFAULT_BLOCK_SIZE;

/// Serializable description of a block sizing policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum BalancerConfig {
    #[serde(rename_all = "kebab-case")]
    Fixed { block_size: usize, max_block_size: usize },

    #[serde(rename_all = "kebab-case")]
    Growing { initial_block_size: usize, doubling_interval: usize, block_size_limit: usize, split_factor: usize },
}

impl BalancerConfig {
    /// Validates the parameters and builds the described balancer
    pub fn build(&self) -> BalancerResult<AnyBalancer> {
        match *self {
            BalancerConfig::Fixed { block_size, max_block_size } => Ok(FixedBalancer::new(block_size, max_block_size)?.into()),
            BalancerConfig::Growing { initial_block_size, doubling_interval, block_size_limit, split_factor } => {
                Ok(GrowingBalancer::new(initial_block_size, doubling_interval, block_size_limit, split_factor)?.into())
            }
        }
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        BalancerConfig::Fixed { block_size: DEFAULT_BLOCK_SIZE, max_block_size: DEFAULT_MAX_BLOCK_SIZE }
    }
}

impl From<AnyBalancer> for BalancerConfig {
    fn from(balancer: AnyBalancer) -> Self {
        match balancer {
            AnyBalancer::Fixed(b) => BalancerConfig::Fixed { block_size: b.block_size(), max_block_size: b.max_size() },
            AnyBalancer::Growing(b) => BalancerConfig::Growing {
                initial_block_size: b.initial_block_size(),
                doubling_interval: b.doubling_interval(),
                block_size_limit: b.block_size_limit(),
                split_factor: b.split_factor(),
            },
        }
    }
}

/// Per-list configuration. Every list owns its copy; there is no process-wide default holder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListConfig {
    #[serde(default)]
    pub balancer: BalancerConfig,

    /// Number of elements to reserve room for at construction
    #[serde(default)]
    pub initial_capacity: usize,
}

impl ListConfig {
    pub fn new(balancer: BalancerConfig) -> Self {
        Self { balancer, initial_capacity: 0 }
    }

    pub fn with_initial_capacity(self, initial_capacity: usize) -> Self {
        Self { initial_capacity, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{balancer::Balancer, errors::BalancerError};

    #[test]
    fn test_toml_config() {
        let config: ListConfig = toml::from_str(
            r#"
            initial-capacity = 4096

            [balancer]
            policy = "growing"
            initial-block-size = 128
            doubling-interval = 8
            block-size-limit = 8192
            split-factor = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.initial_capacity, 4096);
        let balancer = config.balancer.build().unwrap();
        assert_eq!(balancer, AnyBalancer::Growing(GrowingBalancer::new(128, 8, 8192, 2).unwrap()));
        assert_eq!(balancer.default_block_size(8), 256);
    }

    #[test]
    fn test_defaults_when_omitted() {
        let config: ListConfig = toml::from_str("").unwrap();
        assert_eq!(config, ListConfig::default());
        assert_eq!(config.balancer.build().unwrap(), AnyBalancer::Fixed(FixedBalancer::default()));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ListConfig::new(BalancerConfig::Fixed { block_size: 64, max_block_size: 100 }).with_initial_capacity(10);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"balancer":{"policy":"fixed","block-size":64,"max-block-size":100},"initial-capacity":10}"#);
        assert_eq!(serde_json::from_str::<ListConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BalancerConfig::Fixed { block_size: 100, max_block_size: 64 };
        assert_eq!(config.build(), Err(BalancerError::MaxBelowDefault { ordinal: 0, default: 100, max: 64 }));
        let growing = AnyBalancer::from(GrowingBalancer::default());
        assert_eq!(BalancerConfig::from(growing).build().unwrap(), growing);
    }
}

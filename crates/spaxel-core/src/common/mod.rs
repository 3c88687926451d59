pub mod config;
pub mod constants;

pub use config::{ConfigError, CosmologyConfig, MonteCarloConfig, SpaxelConfig};

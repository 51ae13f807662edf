pub mod strategy_config;

pub use strategy_config::{Mode, StrategyConfig, StrategyParameters, DEFAULT_FEATURES};

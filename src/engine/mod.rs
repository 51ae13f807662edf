pub mod replay;

pub use replay::{ReplayConfig, ReplayEngine, ReplayResult, Trade};

pub mod summary;
pub mod timeseries;

pub use summary::SummaryMetrics;
pub use timeseries::{calculate_return_curve, max_drawdown, ReturnPoint};

use crate::data::Signal;
use crate::metrics::{calculate_return_curve, ReturnPoint, SummaryMetrics};
use crate::strategy::position::{OpenPosition, Side};
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

//a closed round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub return_pct: f64,
}

//result of a replay
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub summary: SummaryMetrics,
    pub return_curve: Vec<ReturnPoint>,
    pub trades: Vec<Trade>,
    //position still open after the last bar, never force-closed
    pub open_position: Option<(Side, OpenPosition)>,
}

//configuration for a replay
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    //starting capital for the compounded return curve
    pub initial_balance: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            initial_balance: 100000.0,
        }
    }
}

//drives a strategy bar by bar, entry first then exit, and records closed trades
pub struct ReplayEngine {
    config: ReplayConfig,
}

impl ReplayEngine {
    pub fn new(config: ReplayConfig) -> Self {
        ReplayEngine { config }
    }

    //runs the strategy over the given timestamps in order
    pub fn run(&self, strategy: &mut dyn Strategy, timestamps: &[DateTime<Utc>]) -> ReplayResult {
        let mut trades = Vec::new();
        let mut pending: Option<(Side, DateTime<Utc>, f64)> = None;

        for &time in timestamps {
            let (signal, _) = strategy.get_entry_signal(time);
            if signal != Signal::Neutral {
                let position = strategy.position();
                if let (Some(side), Some(open)) = (position.side(), position.open_position()) {
                    pending = Some((side, open.entry_time, open.entry_price));
                }
            }

            let (return_pct, exit_time) = strategy.get_exit_signal(time);
            if let Some(exit_time) = exit_time {
                if let Some((side, entry_time, entry_price)) = pending.take() {
                    debug!(?side, %entry_time, %exit_time, return_pct, "trade recorded");
                    trades.push(Trade {
                        side,
                        entry_time,
                        exit_time,
                        entry_price,
                        return_pct,
                    });
                }
            }
        }

        let position = strategy.position();
        let open_position = match (position.side(), position.open_position()) {
            (Some(side), Some(open)) => Some((side, open.clone())),
            _ => None,
        };

        info!(
            strategy = strategy.name(),
            bars = timestamps.len(),
            trades = trades.len(),
            open = open_position.is_some(),
            "replay finished"
        );

        self.build_result(trades, open_position)
    }

    fn build_result(
        &self,
        trades: Vec<Trade>,
        open_position: Option<(Side, OpenPosition)>,
    ) -> ReplayResult {
        let return_curve = calculate_return_curve(&trades, self.config.initial_balance);
        let summary =
            SummaryMetrics::from_trades(&trades, &return_curve, self.config.initial_balance);

        ReplayResult {
            summary,
            return_curve,
            trades,
            open_position,
        }
    }
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

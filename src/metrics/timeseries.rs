use crate::engine::Trade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a point on the per-trade return curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub timestamp: DateTime<Utc>,
    //simple sum of trade returns so far
    pub cumulative_return: f64,
    //compounded balance
    pub equity: f64,
    pub drawdown: f64,
}

impl ReturnPoint {
    pub fn new(
        timestamp: DateTime<Utc>,
        cumulative_return: f64,
        equity: f64,
        drawdown: f64,
    ) -> Self {
        ReturnPoint {
            timestamp,
            cumulative_return,
            equity,
            drawdown,
        }
    }
}

//builds the curve at each exit, with drawdowns measured on the compounded balance
pub fn calculate_return_curve(trades: &[Trade], initial_balance: f64) -> Vec<ReturnPoint> {
    let mut curve = Vec::with_capacity(trades.len());
    let mut peak = initial_balance;
    let mut equity = initial_balance;
    let mut cumulative = 0.0;

    for trade in trades {
        cumulative += trade.return_pct;
        //a loss of 100% or more wipes the balance out, it never goes negative
        equity = (equity * (1.0 + trade.return_pct)).max(0.0);

        if equity > peak {
            peak = equity;
        }

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        curve.push(ReturnPoint::new(trade.exit_time, cumulative, equity, drawdown));
    }

    curve
}

//calculates maximum drawdown from the return curve
pub fn max_drawdown(curve: &[ReturnPoint]) -> f64 {
    curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::max)
}

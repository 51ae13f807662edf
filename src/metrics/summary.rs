use crate::engine::Trade;
use crate::metrics::timeseries::{max_drawdown, ReturnPoint};
use crate::strategy::position::Side;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics over closed trades, returns are fractional and already levered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub compounded_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub num_trades: usize,
    pub num_long_trades: usize,
    pub num_short_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl SummaryMetrics {
    //calculate summary metrics from the trade log and its return curve
    pub fn from_trades(trades: &[Trade], curve: &[ReturnPoint], initial_balance: f64) -> Self {
        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();

        let final_balance = curve.last().map(|p| p.equity).unwrap_or(initial_balance);
        let compounded_return = if initial_balance > 0.0 {
            final_balance / initial_balance - 1.0
        } else {
            0.0
        };

        let winning: Vec<f64> = returns.iter().filter(|&&r| r > 0.0).copied().collect();
        let losing: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();

        let win_rate = if returns.is_empty() {
            0.0
        } else {
            winning.len() as f64 / returns.len() as f64
        };

        let total_wins: f64 = winning.iter().sum();
        let total_losses: f64 = losing.iter().sum::<f64>().abs();

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        SummaryMetrics {
            initial_balance,
            final_balance,
            total_return: returns.iter().sum(),
            compounded_return,
            max_drawdown: max_drawdown(curve),
            sharpe_ratio: calculate_sharpe_ratio(&returns),
            sortino_ratio: calculate_sortino_ratio(&returns),
            win_rate,
            avg_win: mean_or_zero(&winning),
            avg_loss: mean_or_zero(&losing),
            profit_factor,
            num_trades: returns.len(),
            num_long_trades: trades.iter().filter(|t| t.side == Side::Long).count(),
            num_short_trades: trades.iter().filter(|t| t.side == Side::Short).count(),
            num_winning_trades: winning.len(),
            num_losing_trades: losing.len(),
            largest_win: winning.iter().fold(0.0f64, |a, &b| a.max(b)),
            largest_loss: losing.iter().fold(0.0f64, |a, &b| a.min(b)),
        }
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        self.to_table().printstd();
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        let pct = |v: f64| format!("{:.2}%", v * 100.0);
        let rows = vec![
            ("Initial Balance", format!("{:.2}", self.initial_balance)),
            ("Final Balance", format!("{:.2}", self.final_balance)),
            ("Total Return (sum)", pct(self.total_return)),
            ("Compounded Return", pct(self.compounded_return)),
            ("Max Drawdown", pct(self.max_drawdown)),
            ("Sharpe (per trade)", format!("{:.3}", self.sharpe_ratio)),
            ("Sortino (per trade)", format!("{:.3}", self.sortino_ratio)),
            (
                "Number of Trades",
                format!(
                    "{} ({} long / {} short)",
                    self.num_trades, self.num_long_trades, self.num_short_trades
                ),
            ),
            ("Win Rate", pct(self.win_rate)),
            ("Avg Win", pct(self.avg_win)),
            ("Avg Loss", pct(self.avg_loss)),
            ("Largest Win", pct(self.largest_win)),
            ("Largest Loss", pct(self.largest_loss)),
            ("Profit Factor", format!("{:.3}", self.profit_factor)),
        ];

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
        for (name, value) in rows {
            table.add_row(Row::new(vec![Cell::new(name), Cell::new(&value)]));
        }

        table
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.mean()
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 {
        return 0.0;
    }

    mean / std_dev
}

fn calculate_sortino_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.mean();

    //downside deviation (only negative returns)
    let negative_returns: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();

    if negative_returns.is_empty() {
        return if mean > 0.0 { f64::INFINITY } else { 0.0 };
    }
    if negative_returns.len() < 2 {
        return 0.0;
    }

    let downside_dev = negative_returns.std_dev();

    if downside_dev == 0.0 {
        return 0.0;
    }

    mean / downside_dev
}

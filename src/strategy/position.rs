use crate::data::Bar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

//fixed take-profit / stop-loss contract, thresholds are fractional returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitRule {
    pub tp: f64,
    pub sl: f64,
    pub cost: f64,
    pub leverage: f64,
}

impl ExitRule {
    //return credited when the take-profit is deemed hit
    pub fn take_profit_return(&self) -> f64 {
        (self.tp - self.cost) * self.leverage
    }

    //return credited when the stop-loss is deemed hit
    pub fn stop_loss_return(&self) -> f64 {
        (self.sl - self.cost) * self.leverage
    }
}

//direction of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

//why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    //both thresholds crossed at the same instant, closed flat
    Undecided,
}

impl ExitReason {
    pub fn position_return(&self, rule: &ExitRule) -> f64 {
        match self {
            ExitReason::TakeProfit => rule.take_profit_return(),
            ExitReason::StopLoss => rule.stop_loss_return(),
            ExitReason::Undecided => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,

    //last computed excursions of the bar high / low against the entry price
    pub excursion_high: Option<f64>,
    pub excursion_low: Option<f64>,
}

impl OpenPosition {
    pub fn new(entry_price: f64, entry_time: DateTime<Utc>) -> Self {
        OpenPosition {
            entry_price,
            entry_time,
            excursion_high: None,
            excursion_low: None,
        }
    }

    //updates the excursions for this bar and decides whether the position closes
    //
    //long:  excursions are (price - entry) / entry, tp is tested on the high, sl on the low
    //short: excursions are negated, tp is tested on the low, sl on the high
    //when both thresholds are crossed in one bar, whichever extreme printed first wins
    pub fn check_exit(&mut self, side: Side, bar: &Bar, rule: &ExitRule) -> Option<ExitReason> {
        let high = (bar.high - self.entry_price) / self.entry_price;
        let low = (bar.low - self.entry_price) / self.entry_price;

        let (excursion_high, excursion_low) = match side {
            Side::Long => (high, low),
            Side::Short => (-high, -low),
        };
        self.excursion_high = Some(excursion_high);
        self.excursion_low = Some(excursion_low);

        let (tp_hit, sl_hit, tp_first) = match side {
            Side::Long => (
                rule.tp < excursion_high,
                excursion_low < rule.sl,
                bar.high_time.cmp(&bar.low_time),
            ),
            Side::Short => (
                rule.tp < excursion_low,
                excursion_high < rule.sl,
                bar.low_time.cmp(&bar.high_time),
            ),
        };

        match (tp_hit, sl_hit) {
            (true, true) => Some(match tp_first {
                Ordering::Less => ExitReason::TakeProfit,
                Ordering::Greater => ExitReason::StopLoss,
                Ordering::Equal => ExitReason::Undecided,
            }),
            (true, false) => Some(ExitReason::TakeProfit),
            (false, true) => Some(ExitReason::StopLoss),
            (false, false) => None,
        }
    }
}

//a position that has just been closed
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub side: Side,
    pub position: OpenPosition,
    pub reason: ExitReason,
    pub return_pct: f64,
}

//single-position state, long and short are mutually exclusive by construction
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PositionState {
    #[default]
    Flat,
    Long(OpenPosition),
    Short(OpenPosition),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, PositionState::Long(_))
    }

    pub fn is_short(&self) -> bool {
        matches!(self, PositionState::Short(_))
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(_) => Some(Side::Long),
            PositionState::Short(_) => Some(Side::Short),
        }
    }

    pub fn open_position(&self) -> Option<&OpenPosition> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(p) | PositionState::Short(p) => Some(p),
        }
    }

    //opens a position only while flat, returns whether it opened
    pub fn open(&mut self, side: Side, price: f64, time: DateTime<Utc>) -> bool {
        if !self.is_flat() {
            return false;
        }

        let position = OpenPosition::new(price, time);
        *self = match side {
            Side::Long => PositionState::Long(position),
            Side::Short => PositionState::Short(position),
        };
        true
    }

    //runs the exit check for an open position and goes flat when it fires
    pub fn evaluate_exit(&mut self, bar: &Bar, rule: &ExitRule) -> Option<ClosedPosition> {
        let (side, reason) = match self {
            PositionState::Flat => return None,
            PositionState::Long(p) => (Side::Long, p.check_exit(Side::Long, bar, rule)?),
            PositionState::Short(p) => (Side::Short, p.check_exit(Side::Short, bar, rule)?),
        };

        let position = match std::mem::take(self) {
            PositionState::Long(p) | PositionState::Short(p) => p,
            PositionState::Flat => return None,
        };

        Some(ClosedPosition {
            side,
            position,
            reason,
            return_pct: reason.position_return(rule),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indexmap::IndexMap;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 8, minute, 0).unwrap()
    }

    fn bar(high: f64, low: f64, high_minute: u32, low_minute: u32) -> Bar {
        Bar::new_unchecked(
            at(0),
            100.0,
            high,
            low,
            100.0,
            at(high_minute),
            at(low_minute),
            IndexMap::new(),
        )
    }

    fn rule() -> ExitRule {
        ExitRule {
            tp: 0.005,
            sl: -0.0025,
            cost: 0.0002,
            leverage: 5.0,
        }
    }

    #[test]
    fn open_only_while_flat() {
        let mut state = PositionState::Flat;
        assert!(state.open(Side::Long, 100.0, at(0)));
        assert!(!state.open(Side::Short, 101.0, at(1)));
        assert!(state.is_long());
        assert_eq!(state.open_position().unwrap().entry_price, 100.0);
    }

    #[test]
    fn excursions_are_recorded_without_exit() {
        let mut position = OpenPosition::new(100.0, at(0));
        let reason = position.check_exit(Side::Long, &bar(100.2, 99.9, 1, 2), &rule());
        assert_eq!(reason, None);
        assert!((position.excursion_high.unwrap() - 0.002).abs() < 1e-12);
        assert!((position.excursion_low.unwrap() + 0.001).abs() < 1e-12);
    }

    #[test]
    fn short_side_tests_tp_on_the_low() {
        let mut position = OpenPosition::new(100.0, at(0));
        //low 1% under entry is a short take-profit
        let reason = position.check_exit(Side::Short, &bar(100.0, 99.0, 1, 2), &rule());
        assert_eq!(reason, Some(ExitReason::TakeProfit));

        let mut position = OpenPosition::new(100.0, at(0));
        //high 1% over entry is a short stop-loss
        let reason = position.check_exit(Side::Short, &bar(101.0, 100.0, 1, 2), &rule());
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn short_tie_break_uses_low_time_first() {
        let wide = |h, l| bar(101.0, 99.0, h, l);

        let mut p = OpenPosition::new(100.0, at(0));
        assert_eq!(
            p.check_exit(Side::Short, &wide(5, 3), &rule()),
            Some(ExitReason::TakeProfit)
        );
        let mut p = OpenPosition::new(100.0, at(0));
        assert_eq!(
            p.check_exit(Side::Short, &wide(3, 5), &rule()),
            Some(ExitReason::StopLoss)
        );
        let mut p = OpenPosition::new(100.0, at(0));
        assert_eq!(
            p.check_exit(Side::Short, &wide(4, 4), &rule()),
            Some(ExitReason::Undecided)
        );
    }

    #[test]
    fn evaluate_exit_goes_flat() {
        let mut state = PositionState::Flat;
        state.open(Side::Long, 100.0, at(0));
        let closed = state.evaluate_exit(&bar(101.0, 99.9, 1, 2), &rule()).unwrap();
        assert!(state.is_flat());
        assert_eq!(closed.side, Side::Long);
        assert_eq!(closed.return_pct, rule().take_profit_return());
    }
}

pub mod ml_tp_sl;
pub mod position;

use crate::data::Signal;
use chrono::{DateTime, Utc};
use position::PositionState;

//interface a bar-by-bar backtest loop drives
//for each timestamp the loop asks for an entry signal first and then for an exit
pub trait Strategy: Send {
    //returns the entry signal taken at this bar and the entry time of the open position
    //unknown timestamps and too-short history give (neutral, unchanged entry time)
    fn get_entry_signal(&mut self, time: DateTime<Utc>) -> (Signal, Option<DateTime<Utc>>);

    //returns the realized return and exit time if the open position closes on this bar,
    //otherwise (0.0, None)
    fn get_exit_signal(&mut self, time: DateTime<Utc>) -> (f64, Option<DateTime<Utc>>);

    //current position state
    fn position(&self) -> &PositionState;

    //returns the strategy name
    fn name(&self) -> &str;
}

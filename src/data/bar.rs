use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Non-positive open price: {0}")]
    NonPositiveOpen(f64),
}

//ternary classifier output used as the entry signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signal {
    Short,
    #[default]
    Neutral,
    Long,
}

impl Signal {
    //maps a class label to a signal, anything other than 1 / -1 is neutral
    pub fn from_label(label: i8) -> Self {
        match label {
            1 => Signal::Long,
            -1 => Signal::Short,
            _ => Signal::Neutral,
        }
    }

    pub fn as_i8(&self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Neutral => 0,
            Signal::Long => 1,
        }
    }
}

//one row of the time-indexed table
//high_time / low_time are the intra-bar instants at which the high and low printed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub high_time: DateTime<Utc>,
    pub low_time: DateTime<Utc>,
    pub features: IndexMap<String, f64>,
    #[serde(default)]
    pub ml_signal: Signal,
}

impl Bar {
    //creates a new Bar with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        high_time: DateTime<Utc>,
        low_time: DateTime<Utc>,
        features: IndexMap<String, f64>,
    ) -> Result<Self, BarError> {
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        //excursions are ratios against the open, so a zero open is unusable
        if open <= 0.0 {
            return Err(BarError::NonPositiveOpen(open));
        }

        Ok(Self::new_unchecked(
            timestamp, open, high, low, close, high_time, low_time, features,
        ))
    }

    //creates a Bar without validation
    #[allow(clippy::too_many_arguments)]
    pub fn new_unchecked(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        high_time: DateTime<Utc>,
        low_time: DateTime<Utc>,
        features: IndexMap<String, f64>,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            high_time,
            low_time,
            features,
            ml_signal: Signal::Neutral,
        }
    }

    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    //true when every price and feature value is a finite number
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .chain(self.features.values())
            .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, 0, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = Bar::new(ts(0), 1.0, 0.9, 1.1, 1.0, ts(1), ts(2), IndexMap::new());
        assert_eq!(err, Err(BarError::InvalidHighLow { high: 0.9, low: 1.1 }));
    }

    #[test]
    fn non_finite_feature_is_detected() {
        let mut features = IndexMap::new();
        features.insert("rsi".to_string(), f64::NAN);
        let bar = Bar::new_unchecked(ts(0), 1.0, 1.1, 0.9, 1.0, ts(1), ts(2), features);
        assert!(!bar.is_finite());
    }

    #[test]
    fn signal_labels() {
        assert_eq!(Signal::from_label(1), Signal::Long);
        assert_eq!(Signal::from_label(-1), Signal::Short);
        assert_eq!(Signal::from_label(3), Signal::Neutral);
        assert_eq!(Signal::Short.as_i8(), -1);
    }
}

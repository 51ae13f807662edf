use crate::data::bar::{Bar, Signal};
use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use thiserror::Error;
use tracing::warn;

//column holding the training target
pub const LABEL_COLUMN: &str = "dummy";

#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Column '{column}' missing at {timestamp}")]
    MissingColumn {
        column: String,
        timestamp: DateTime<Utc>,
    },
    #[error("Label '{value}' at {timestamp} is not a finite class")]
    InvalidLabel {
        value: f64,
        timestamp: DateTime<Utc>,
    },
    #[error("Signal count {got} does not match bar count {expected}")]
    SignalLength { expected: usize, got: usize },
}

//time-indexed table of bars, sorted and unique by timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarTable {
    bars: Vec<Bar>,
}

impl BarTable {
    //sorts bars chronologically and keeps the first bar of any duplicated timestamp
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let before = bars.len();
        bars.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        if bars.len() < before {
            warn!(
                dropped = before - bars.len(),
                "duplicate timestamps removed from bar table"
            );
        }

        BarTable { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    //row number of an exact timestamp, none if absent
    pub fn position(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.bars
            .binary_search_by(|b| b.timestamp.cmp(&timestamp))
            .ok()
    }

    pub fn bar_at(&self, timestamp: DateTime<Utc>) -> Option<&Bar> {
        self.position(timestamp).map(|i| &self.bars[i])
    }

    //bars with start <= timestamp <= end
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> BarTable {
        let lo = self.bars.partition_point(|b| b.timestamp < start);
        let hi = self.bars.partition_point(|b| b.timestamp <= end);
        let bars = if lo < hi {
            self.bars[lo..hi].to_vec()
        } else {
            Vec::new()
        };
        BarTable { bars }
    }

    //first n rows
    pub fn head(&self, n: usize) -> BarTable {
        BarTable {
            bars: self.bars.iter().take(n).cloned().collect(),
        }
    }

    //removes rows with any infinite or missing price / feature value
    pub fn drop_non_finite(self) -> Self {
        let before = self.bars.len();
        let bars: Vec<Bar> = self.bars.into_iter().filter(Bar::is_finite).collect();
        if bars.len() < before {
            warn!(
                dropped = before - bars.len(),
                "rows with non-finite values removed"
            );
        }
        BarTable { bars }
    }

    //feature column names in the order of the first bar
    pub fn feature_names(&self) -> Vec<String> {
        self.bars
            .first()
            .map(|b| b.features.keys().cloned().collect())
            .unwrap_or_default()
    }

    //n_rows x n_columns matrix of the requested feature columns
    pub fn feature_matrix(&self, columns: &[String]) -> Result<DMatrix<f64>, TableError> {
        let mut values = Vec::with_capacity(self.bars.len() * columns.len());

        for bar in &self.bars {
            for column in columns {
                let value = bar.feature(column).ok_or_else(|| TableError::MissingColumn {
                    column: column.clone(),
                    timestamp: bar.timestamp,
                })?;
                values.push(value);
            }
        }

        Ok(DMatrix::from_row_slice(
            self.bars.len(),
            columns.len(),
            &values,
        ))
    }

    //class labels read from a numeric column, rounded to the nearest integer
    pub fn labels(&self, column: &str) -> Result<Vec<i8>, TableError> {
        self.bars
            .iter()
            .map(|bar| {
                let value = bar.feature(column).ok_or_else(|| TableError::MissingColumn {
                    column: column.to_string(),
                    timestamp: bar.timestamp,
                })?;
                let rounded = value.round();
                if !rounded.is_finite() || rounded < i8::MIN as f64 || rounded > i8::MAX as f64 {
                    return Err(TableError::InvalidLabel {
                        value,
                        timestamp: bar.timestamp,
                    });
                }
                Ok(rounded as i8)
            })
            .collect()
    }

    //writes the derived ml_signal column
    pub fn set_signals(&mut self, signals: &[Signal]) -> Result<(), TableError> {
        if signals.len() != self.bars.len() {
            return Err(TableError::SignalLength {
                expected: self.bars.len(),
                got: signals.len(),
            });
        }

        for (bar, signal) in self.bars.iter_mut().zip(signals) {
            bar.ml_signal = *signal;
        }
        Ok(())
    }
}

impl From<Vec<Bar>> for BarTable {
    fn from(bars: Vec<Bar>) -> Self {
        BarTable::new(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use indexmap::IndexMap;

    fn bar(hour: i64, x: f64) -> Bar {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
        let mut features = IndexMap::new();
        features.insert("x".to_string(), x);
        features.insert(LABEL_COLUMN.to_string(), if x > 0.0 { 1.0 } else { -1.0 });
        Bar::new_unchecked(t, 1.0, 1.0, 1.0, 1.0, t, t, features)
    }

    #[test]
    fn sorts_and_dedups() {
        let table = BarTable::new(vec![bar(2, 1.0), bar(0, 2.0), bar(2, 3.0)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().feature("x"), Some(2.0));
    }

    #[test]
    fn between_is_inclusive() {
        let table = BarTable::new((0..10).map(|h| bar(h, h as f64)).collect());
        let start = table.get(3).unwrap().timestamp;
        let end = table.get(6).unwrap().timestamp;
        assert_eq!(table.between(start, end).len(), 4);
        assert!(table.between(end, start).is_empty());
    }

    #[test]
    fn feature_matrix_reports_missing_column() {
        let table = BarTable::new(vec![bar(0, 1.0)]);
        let err = table.feature_matrix(&["y".to_string()]).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { ref column, .. } if column == "y"));
    }

    #[test]
    fn labels_are_rounded() {
        let table = BarTable::new(vec![bar(0, 1.0), bar(1, -1.0)]);
        assert_eq!(table.labels(LABEL_COLUMN).unwrap(), vec![1, -1]);
    }
}

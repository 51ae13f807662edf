pub mod correlation;
pub mod vif;

pub use correlation::{
    correlation_graphs, correlation_matrix, correlation_table, CorrelationMatrix,
    CorrelationMethod,
};
pub use vif::{calculate_vif, remove_intercollinearity, DEFAULT_VIF_THRESHOLD};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use nalgebra::DMatrix;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
    #[error("{names} column names for a matrix with {columns} columns")]
    ShapeMismatch { names: usize, columns: usize },
    #[error("Unknown feature column '{0}'")]
    UnknownColumn(String),
    #[error("Column '{0}' length differs from the first column")]
    RaggedColumn(String),
}

//named numeric columns, rows are observations
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    names: Vec<String>,
    values: DMatrix<f64>,
}

impl FeatureFrame {
    pub fn new(names: Vec<String>, values: DMatrix<f64>) -> Result<Self, FeatureError> {
        if names.len() != values.ncols() {
            return Err(FeatureError::ShapeMismatch {
                names: names.len(),
                columns: values.ncols(),
            });
        }
        Ok(FeatureFrame { names, values })
    }

    //builds a frame from named columns of equal length
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self, FeatureError> {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, _)) = columns.iter().find(|(_, v)| v.len() != rows) {
            return Err(FeatureError::RaggedColumn(name.clone()));
        }

        let values = DMatrix::from_fn(rows, columns.len(), |i, j| columns[j].1[i]);
        let names = columns.into_iter().map(|(name, _)| name).collect();
        Ok(FeatureFrame { names, values })
    }

    //loads every numeric column of a csv file, other columns are skipped
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .context(format!("Failed to open CSV file: {:?}", path))?;

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut columns: Vec<Option<Vec<f64>>> = vec![Some(Vec::new()); headers.len()];

        for (index, result) in reader.records().enumerate() {
            let record =
                result.context(format!("Failed to parse CSV record at line {}", index + 2))?;
            for (column, raw) in columns.iter_mut().zip(record.iter()) {
                let raw = raw.trim();
                let parsed = if raw.is_empty() {
                    Some(f64::NAN)
                } else {
                    raw.parse::<f64>().ok()
                };
                match parsed {
                    Some(v) => {
                        if let Some(values) = column.as_mut() {
                            values.push(v);
                        }
                    }
                    //one unparsable cell makes the whole column non-numeric
                    None => *column = None,
                }
            }
        }

        let mut kept = Vec::new();
        for (name, column) in headers.into_iter().zip(columns) {
            match column {
                Some(values) => kept.push((name, values)),
                None => warn!(column = %name, "skipping non-numeric column"),
            }
        }

        let frame = Self::from_columns(kept)?;
        info!(
            rows = frame.n_rows(),
            columns = frame.n_cols(),
            path = ?path,
            "loaded feature frame"
        );
        Ok(frame)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.values.column(index).iter().copied().collect()
    }

    //keeps only rows where every column is finite
    pub fn drop_non_finite_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&i| self.values.row(i).iter().all(|v| v.is_finite()))
            .collect();
        if keep.len() < self.n_rows() {
            warn!(
                dropped = self.n_rows() - keep.len(),
                "dropping rows with non-finite values"
            );
        }

        FeatureFrame {
            names: self.names.clone(),
            values: self.values.select_rows(keep.iter()),
        }
    }

    //removes a column by name
    pub fn drop_column(&self, name: &str) -> Result<Self, FeatureError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FeatureError::UnknownColumn(name.to_string()))?;

        let mut names = self.names.clone();
        names.remove(index);
        Ok(FeatureFrame {
            names,
            values: self.values.clone().remove_column(index),
        })
    }
}

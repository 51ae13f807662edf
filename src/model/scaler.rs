use crate::model::ModelError;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

//per-column standardization to zero mean and unit variance
//zero-variance columns keep a scale of 1 so they map to 0 instead of nan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Option<Vec<f64>>,
    scales: Option<Vec<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    //population mean and standard deviation per column
    pub fn fit(&mut self, x: &DMatrix<f64>) -> Result<(), ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::EmptySample);
        }

        let n = x.nrows() as f64;
        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());

        for column in x.column_iter() {
            let mean = column.sum() / n;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            means.push(mean);
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        self.means = Some(means);
        self.scales = Some(scales);
        Ok(())
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ModelError> {
        let (means, scales) = match (&self.means, &self.scales) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(ModelError::NotFitted("StandardScaler")),
        };

        if x.ncols() != means.len() {
            return Err(ModelError::DimensionMismatch {
                expected: means.len(),
                got: x.ncols(),
            });
        }

        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - means[j]) / scales[j]
        }))
    }

    pub fn fit_transform(&mut self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ModelError> {
        self.fit(x)?;
        self.transform(x)
    }
}

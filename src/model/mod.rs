pub mod artifacts;
pub mod forest;
pub mod logistic;
pub mod scaler;
pub mod tree;
pub mod voting;

pub use artifacts::ModelArtifacts;
pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use scaler::StandardScaler;
pub use tree::DecisionTree;
pub use voting::{Estimator, VotingClassifier};

use nalgebra::DMatrix;
use smartcore::linalg::basic::matrix::DenseMatrix;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("{0} has not been fitted yet")]
    NotFitted(&'static str),
    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Sample count mismatch: {samples} rows but {labels} labels")]
    LabelMismatch { samples: usize, labels: usize },
    #[error("Cannot fit on an empty sample")]
    EmptySample,
    #[error("Voting classifier needs at least one estimator")]
    NoEstimators,
    #[error("{estimator} failed: {message}")]
    Backend {
        estimator: &'static str,
        message: String,
    },
}

//a supervised classifier over class labels in i8
pub trait Classifier: Send {
    //fits on an n_samples x n_features matrix and one label per row
    fn fit(&mut self, x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError>;

    //predicts one label per row
    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<i8>, ModelError>;

    //returns the estimator name
    fn name(&self) -> &str;
}

//sorted distinct labels
pub(crate) fn distinct_classes(y: &[i8]) -> Vec<i8> {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

//shared shape checks for fit
pub(crate) fn check_fit_input(x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptySample);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::LabelMismatch {
            samples: x.nrows(),
            labels: y.len(),
        });
    }
    Ok(())
}

//width check shared by predict
pub(crate) fn check_width(expected: usize, x: &DMatrix<f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: x.ncols(),
        });
    }
    Ok(())
}

//row-major copy into the smartcore matrix type
pub(crate) fn dense_matrix(x: &DMatrix<f64>) -> DenseMatrix<f64> {
    let rows: Vec<Vec<f64>> = x
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();
    DenseMatrix::from_2d_vec(&rows)
}

pub(crate) fn to_targets(y: &[i8]) -> Vec<i32> {
    y.iter().map(|label| i32::from(*label)).collect()
}

//labels come back in the i32 target type, anything outside i8 is a backend fault
pub(crate) fn from_targets(
    estimator: &'static str,
    targets: Vec<i32>,
) -> Result<Vec<i8>, ModelError> {
    targets
        .into_iter()
        .map(|target| {
            i8::try_from(target).map_err(|_| ModelError::Backend {
                estimator,
                message: format!("predicted label {} is out of range", target),
            })
        })
        .collect()
}

pub(crate) fn backend_error(
    estimator: &'static str,
) -> impl Fn(smartcore::error::Failed) -> ModelError {
    move |failed| ModelError::Backend {
        estimator,
        message: failed.to_string(),
    }
}

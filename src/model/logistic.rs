use crate::model::{
    backend_error, check_fit_input, check_width, dense_matrix, from_targets, to_targets,
    Classifier, ModelError,
};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{
    LogisticRegression as LogisticModel, LogisticRegressionParameters,
};
use std::sync::Arc;

type Fitted = LogisticModel<f64, i32, DenseMatrix<f64>, Vec<i32>>;

//multinomial logistic regression with an l2 penalty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    alpha: f64,
    n_features: usize,
    model: Option<Arc<Fitted>>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LogisticRegression {
    //alpha is the l2 penalty weight, zero fits without regularization
    pub fn new(alpha: f64) -> Self {
        LogisticRegression {
            alpha,
            n_features: 0,
            model: None,
        }
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError> {
        check_fit_input(x, y)?;

        let parameters = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model = LogisticModel::fit(&dense_matrix(x), &to_targets(y), parameters)
            .map_err(backend_error("LogisticRegression"))?;

        self.n_features = x.ncols();
        self.model = Some(Arc::new(model));
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<i8>, ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or(ModelError::NotFitted("LogisticRegression"))?;
        check_width(self.n_features, x)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }

        let targets = model
            .predict(&dense_matrix(x))
            .map_err(backend_error("LogisticRegression"))?;
        from_targets("LogisticRegression", targets)
    }

    fn name(&self) -> &str {
        "lr"
    }
}

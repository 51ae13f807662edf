use crate::model::{
    backend_error, check_fit_input, check_width, dense_matrix, from_targets, to_targets,
    Classifier, ModelError,
};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::sync::Arc;

type Fitted = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

//bagged gini trees, seeded so a refit on the same sample gives the same forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_trees: u16,
    n_features: usize,
    model: Option<Arc<Fitted>>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_trees: u16) -> Self {
        RandomForest {
            n_trees,
            n_features: 0,
            model: None,
        }
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError> {
        check_fit_input(x, y)?;

        let parameters = RandomForestClassifierParameters::default().with_n_trees(self.n_trees);
        let model = RandomForestClassifier::fit(&dense_matrix(x), &to_targets(y), parameters)
            .map_err(backend_error("RandomForest"))?;

        self.n_features = x.ncols();
        self.model = Some(Arc::new(model));
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<i8>, ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or(ModelError::NotFitted("RandomForest"))?;
        check_width(self.n_features, x)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }

        let targets = model
            .predict(&dense_matrix(x))
            .map_err(backend_error("RandomForest"))?;
        from_targets("RandomForest", targets)
    }

    fn name(&self) -> &str {
        "rfc"
    }
}

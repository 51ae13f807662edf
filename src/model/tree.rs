use crate::model::{
    backend_error, check_fit_input, check_width, dense_matrix, from_targets, to_targets,
    Classifier, ModelError,
};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};
use std::sync::Arc;

type Fitted = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

//single gini tree grown on the full sample
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTree {
    n_features: usize,
    model: Option<Arc<Fitted>>,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError> {
        check_fit_input(x, y)?;

        let model = DecisionTreeClassifier::fit(
            &dense_matrix(x),
            &to_targets(y),
            DecisionTreeClassifierParameters::default(),
        )
        .map_err(backend_error("DecisionTree"))?;

        self.n_features = x.ncols();
        self.model = Some(Arc::new(model));
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<i8>, ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or(ModelError::NotFitted("DecisionTree"))?;
        check_width(self.n_features, x)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }

        let targets = model
            .predict(&dense_matrix(x))
            .map_err(backend_error("DecisionTree"))?;
        from_targets("DecisionTree", targets)
    }

    fn name(&self) -> &str {
        "tree"
    }
}

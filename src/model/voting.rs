use crate::model::{
    check_fit_input, distinct_classes, Classifier, DecisionTree, LogisticRegression, ModelError,
    RandomForest,
};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

//closed set of member estimators so the fitted ensemble can be serialized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    Logistic(LogisticRegression),
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
}

impl Estimator {
    fn inner(&self) -> &dyn Classifier {
        match self {
            Estimator::Logistic(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::DecisionTree(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Estimator::Logistic(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::DecisionTree(m) => m,
        }
    }
}

impl Classifier for Estimator {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<i8>, ModelError> {
        self.inner().predict(x)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

//hard majority vote across member predictions
//a tied vote goes to the smallest label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingClassifier {
    estimators: Vec<Estimator>,
    classes: Vec<i8>,
}

impl Default for VotingClassifier {
    fn default() -> Self {
        VotingClassifier::new(vec![
            Estimator::Logistic(LogisticRegression::default()),
            Estimator::RandomForest(RandomForest::default()),
            Estimator::DecisionTree(DecisionTree::new()),
        ])
    }
}

impl VotingClassifier {
    pub fn new(estimators: Vec<Estimator>) -> Self {
        VotingClassifier {
            estimators,
            classes: Vec::new(),
        }
    }

    pub fn classes(&self) -> &[i8] {
        &self.classes
    }

    fn vote(ballots: &[i8]) -> i8 {
        let mut counts: BTreeMap<i8, usize> = BTreeMap::new();
        for label in ballots {
            *counts.entry(*label).or_insert(0) += 1;
        }

        //btreemap iterates labels in ascending order, so strict > keeps the smallest on ties
        let mut winner = (0i8, 0usize);
        for (label, count) in counts {
            if count > winner.1 {
                winner = (label, count);
            }
        }
        winner.0
    }
}

impl Classifier for VotingClassifier {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[i8]) -> Result<(), ModelError> {
        if self.estimators.is_empty() {
            return Err(ModelError::NoEstimators);
        }
        check_fit_input(x, y)?;

        info!(
            samples = x.nrows(),
            features = x.ncols(),
            estimators = self.estimators.len(),
            "fitting voting classifier"
        );

        //members are independent, fit them in parallel
        self.estimators
            .par_iter_mut()
            .map(|estimator| {
                estimator.fit(x, y)?;
                debug!(estimator = estimator.name(), "member fitted");
                Ok(())
            })
            .collect::<Result<Vec<()>, ModelError>>()?;

        self.classes = distinct_classes(y);
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<i8>, ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::NotFitted("VotingClassifier"));
        }

        let member_predictions = self
            .estimators
            .iter()
            .map(|e| e.predict(x))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..x.nrows())
            .map(|row| {
                let ballots: Vec<i8> = member_predictions.iter().map(|p| p[row]).collect();
                Self::vote(&ballots)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "voting"
    }
}

use crate::config::{Mode, StrategyParameters};
use crate::data::{BarTable, Signal, TableError, LABEL_COLUMN};
use crate::model::{Classifier, ModelArtifacts, ModelError, StandardScaler, VotingClassifier};
use crate::strategy::position::{ExitRule, PositionState, Side};
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy data is empty")]
    EmptyData,
    #[error("No training rows between {start} and {end}")]
    EmptyTrainingWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

//ml entry / fixed take-profit stop-loss exit strategy
//entries follow the classifier prediction of the previous bar, one position at a time
#[derive(Debug, Clone)]
pub struct MlTpSlStrategy {
    list_x: Vec<String>,
    exit_rule: ExitRule,
    artifacts: ModelArtifacts,
    trained: bool,

    data: BarTable,
    start_date_backtest: DateTime<Utc>,

    //state
    position: PositionState,
    entry_time: Option<DateTime<Utc>>,
    exit_time: Option<DateTime<Utc>>,
}

impl MlTpSlStrategy {
    //builds the strategy, training first when the parameters ask for it,
    //then fills the ml_signal column for every bar
    pub fn new(data: BarTable, parameters: StrategyParameters) -> Result<Self, StrategyError> {
        let start_date_backtest = data.first_timestamp().ok_or(StrategyError::EmptyData)?;

        let StrategyParameters { list_x, exit, mode } = parameters;
        let (artifacts, trained) = match mode {
            Mode::Train { training_data } => {
                (Self::train_model(&data, &training_data, &list_x)?, true)
            }
            Mode::Inference { artifacts } => (artifacts, false),
        };

        let mut strategy = MlTpSlStrategy {
            list_x,
            exit_rule: exit,
            artifacts,
            trained,
            data,
            start_date_backtest,
            position: PositionState::Flat,
            entry_time: None,
            exit_time: None,
        };
        strategy.get_predictions()?;
        Ok(strategy)
    }

    //fits scaler and voting classifier on the training rows inside the span of `data`
    pub fn train_model(
        data: &BarTable,
        training_data: &BarTable,
        list_x: &[String],
    ) -> Result<ModelArtifacts, StrategyError> {
        let (start, end) = match (data.first_timestamp(), data.last_timestamp()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(StrategyError::EmptyData),
        };

        let window = training_data.between(start, end);
        if window.is_empty() {
            return Err(StrategyError::EmptyTrainingWindow { start, end });
        }

        let x_train = window.feature_matrix(list_x)?;
        let y_train = window.labels(LABEL_COLUMN)?;

        let mut scaler = StandardScaler::new();
        let x_train_sc = scaler.fit_transform(&x_train)?;

        let mut model = VotingClassifier::default();
        model.fit(&x_train_sc, &y_train)?;

        info!(
            rows = window.len(),
            features = list_x.len(),
            classes = ?model.classes(),
            %start,
            %end,
            "model trained"
        );

        Ok(ModelArtifacts::new(model, scaler))
    }

    //predicts every bar and stores the result in the ml_signal column
    fn get_predictions(&mut self) -> Result<(), StrategyError> {
        let x = self.data.feature_matrix(&self.list_x)?;
        let x_sc = self.artifacts.scaler.transform(&x)?;
        let labels = self.artifacts.model.predict(&x_sc)?;

        let signals: Vec<Signal> = labels.into_iter().map(Signal::from_label).collect();
        self.data.set_signals(&signals)?;

        debug!(
            longs = signals.iter().filter(|s| **s == Signal::Long).count(),
            shorts = signals.iter().filter(|s| **s == Signal::Short).count(),
            "predictions computed"
        );
        Ok(())
    }

    //parameters for the next out-of-sample run, carrying the fitted artifacts
    pub fn output_parameters(&self) -> StrategyParameters {
        StrategyParameters {
            list_x: self.list_x.clone(),
            exit: self.exit_rule,
            mode: Mode::Inference {
                artifacts: self.artifacts.clone(),
            },
        }
    }

    pub fn data(&self) -> &BarTable {
        &self.data
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    pub fn exit_rule(&self) -> &ExitRule {
        &self.exit_rule
    }

    //true when the model was fitted during construction
    pub fn trained(&self) -> bool {
        self.trained
    }

    pub fn start_date_backtest(&self) -> DateTime<Utc> {
        self.start_date_backtest
    }

    pub fn entry_time(&self) -> Option<DateTime<Utc>> {
        self.entry_time
    }

    pub fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_time
    }
}

impl Strategy for MlTpSlStrategy {
    fn get_entry_signal(&mut self, time: DateTime<Utc>) -> (Signal, Option<DateTime<Utc>>) {
        let index = match self.data.position(time) {
            Some(i) => i,
            None => return (Signal::Neutral, self.entry_time),
        };

        //the decision uses the prediction of the previous bar, so two rows are needed
        if index < 1 {
            return (Signal::Neutral, self.entry_time);
        }

        let signal = self.data.bars()[index - 1].ml_signal;
        let open = self.data.bars()[index].open;

        let side = match signal {
            Signal::Long => Side::Long,
            Signal::Short => Side::Short,
            Signal::Neutral => return (Signal::Neutral, self.entry_time),
        };

        if self.position.open(side, open, time) {
            self.entry_time = Some(time);
            debug!(?side, price = open, %time, "position opened");
            (signal, self.entry_time)
        } else {
            (Signal::Neutral, self.entry_time)
        }
    }

    fn get_exit_signal(&mut self, time: DateTime<Utc>) -> (f64, Option<DateTime<Utc>>) {
        let bar = match self.data.bar_at(time) {
            Some(bar) => bar,
            None => return (0.0, None),
        };

        match self.position.evaluate_exit(bar, &self.exit_rule) {
            Some(closed) => {
                self.exit_time = Some(time);
                debug!(
                    side = ?closed.side,
                    reason = ?closed.reason,
                    return_pct = closed.return_pct,
                    %time,
                    "position closed"
                );
                (closed.return_pct, self.exit_time)
            }
            None => (0.0, None),
        }
    }

    fn position(&self) -> &PositionState {
        &self.position
    }

    fn name(&self) -> &str {
        "ML TP/SL"
    }
}

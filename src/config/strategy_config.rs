use crate::data::{load_csv, BarTable};
use crate::model::ModelArtifacts;
use crate::strategy::position::ExitRule;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

//feature columns used when none are configured
pub const DEFAULT_FEATURES: [&str; 20] = [
    "hurst",
    "0_to_20",
    "20_to_40",
    "60_to_80",
    "80_to_100",
    "acceleration",
    "spread",
    "kama_diff",
    "kama_trend",
    "autocorr_10",
    "autocorr_50",
    "ret_log_1",
    "ret_log_5",
    "ret_log_20",
    "ret_log_50",
    "filling",
    "amplitude",
    "rolling_volatility_yang_zhang",
    "linear_slope_6M",
    "linear_slope_3M",
];

//how the strategy obtains its model
#[derive(Debug, Clone)]
pub enum Mode {
    //fit a fresh scaler and classifier on the matching window of this table
    Train { training_data: BarTable },
    //use an already fitted pair
    Inference { artifacts: ModelArtifacts },
}

impl Mode {
    pub fn is_train(&self) -> bool {
        matches!(self, Mode::Train { .. })
    }
}

//runtime parameters handed to the strategy at construction
#[derive(Debug, Clone)]
pub struct StrategyParameters {
    pub list_x: Vec<String>,
    pub exit: ExitRule,
    pub mode: Mode,
}

//flat serializable configuration, resolved into StrategyParameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub list_x: Vec<String>,
    pub tp: f64,
    pub sl: f64,
    pub cost: f64,
    pub leverage: f64,
    pub train_mode: bool,

    //training table, only read in train mode
    pub training_data: Option<PathBuf>,
    //keep only the first n training rows
    pub training_rows: Option<usize>,

    //saved artifacts, only read in inference mode
    pub model_path: Option<PathBuf>,
    pub scaler_path: Option<PathBuf>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            list_x: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
            tp: 0.005,
            sl: -0.0025,
            cost: 0.0002,
            leverage: 5.0,
            train_mode: true,
            training_data: None,
            training_rows: Some(6_000),
            model_path: None,
            scaler_path: None,
        }
    }
}

impl StrategyConfig {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config {:?}", path))?;
        let config: StrategyConfig = serde_json::from_str(&contents)
            .context(format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn exit_rule(&self) -> ExitRule {
        ExitRule {
            tp: self.tp,
            sl: self.sl,
            cost: self.cost,
            leverage: self.leverage,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.list_x.is_empty(), "list_x must name at least one feature");
        ensure!(self.tp.is_finite(), "tp must be finite");
        ensure!(self.sl.is_finite(), "sl must be finite");
        ensure!(self.cost.is_finite(), "cost must be finite");
        ensure!(
            self.leverage.is_finite() && self.leverage > 0.0,
            "leverage must be positive, got {}",
            self.leverage
        );
        if self.train_mode {
            ensure!(
                self.training_data.is_some(),
                "train mode needs a training_data path"
            );
        } else {
            ensure!(
                self.model_path.is_some() && self.scaler_path.is_some(),
                "inference mode needs model_path and scaler_path"
            );
        }
        Ok(())
    }

    //reads the training table or the saved artifacts the mode asks for
    pub fn resolve(&self) -> Result<StrategyParameters> {
        self.validate()?;

        let mode = match (
            self.train_mode,
            &self.training_data,
            &self.model_path,
            &self.scaler_path,
        ) {
            (true, Some(path), _, _) => {
                let mut training_data = load_csv(path)
                    .context(format!("Failed to load training data from {:?}", path))?
                    .drop_non_finite();
                if let Some(rows) = self.training_rows {
                    training_data = training_data.head(rows);
                }
                info!(rows = training_data.len(), "training table ready");
                Mode::Train { training_data }
            }
            (false, _, Some(model_path), Some(scaler_path)) => Mode::Inference {
                artifacts: ModelArtifacts::load(model_path, scaler_path)?,
            },
            _ => anyhow::bail!("configuration does not match its mode"),
        };

        Ok(StrategyParameters {
            list_x: self.list_x.clone(),
            exit: self.exit_rule(),
            mode,
        })
    }
}

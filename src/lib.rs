//a machine-learning entry / take-profit stop-loss exit strategy with feature selection diagnostics

pub mod config;
pub mod data;
pub mod engine;
pub mod features;
pub mod metrics;
pub mod model;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Mode, StrategyConfig, StrategyParameters, DEFAULT_FEATURES};
    pub use crate::data::{load_csv, Bar, BarTable, Signal, LABEL_COLUMN};
    pub use crate::engine::{ReplayConfig, ReplayEngine, ReplayResult, Trade};
    pub use crate::features::{
        calculate_vif, correlation_graphs, correlation_matrix, correlation_table,
        remove_intercollinearity, CorrelationMatrix, CorrelationMethod, FeatureFrame,
        DEFAULT_VIF_THRESHOLD,
    };
    pub use crate::metrics::{calculate_return_curve, ReturnPoint, SummaryMetrics};
    pub use crate::model::{Classifier, ModelArtifacts, StandardScaler, VotingClassifier};
    pub use crate::strategy::{
        ml_tp_sl::{MlTpSlStrategy, StrategyError},
        position::{ExitReason, ExitRule, OpenPosition, PositionState, Side},
        Strategy,
    };
}

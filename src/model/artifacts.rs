use crate::model::{StandardScaler, VotingClassifier};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

//fitted classifier and scaler, trained once and read-only afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub model: VotingClassifier,
    pub scaler: StandardScaler,
}

impl ModelArtifacts {
    pub fn new(model: VotingClassifier, scaler: StandardScaler) -> Self {
        ModelArtifacts { model, scaler }
    }

    //file paths used for a named model under a directory
    pub fn paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
        (
            dir.join(format!("{}_model.json", name)),
            dir.join(format!("{}_sc.json", name)),
        )
    }

    //writes <dir>/<name>_model.json and <dir>/<name>_sc.json
    pub fn save(&self, dir: &Path, name: &str) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create model directory {:?}", dir))?;

        let (model_path, scaler_path) = Self::paths(dir, name);
        write_json(&self.model, &model_path)?;
        write_json(&self.scaler, &scaler_path)?;

        info!(model = ?model_path, scaler = ?scaler_path, "saved model artifacts");
        Ok((model_path, scaler_path))
    }

    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self> {
        let model = read_json(model_path)?;
        let scaler = read_json(scaler_path)?;
        info!(model = ?model_path, scaler = ?scaler_path, "loaded model artifacts");
        Ok(ModelArtifacts { model, scaler })
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string(value)?;
    std::fs::write(path, json).context(format!("Failed to write {:?}", path))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).context(format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).context(format!("Failed to decode {:?}", path))
}

// ============================================================
// Layer 6: Checkpoint Manager
// ============================================================
// Saves and restores the trained classifier using Burn's
// CompactRecorder (MessagePack, half precision).
//
// Directory layout after a training run:
//   <work_dir>/model/
//     model.mpk          ← learned parameters
//     train_config.json  ← hyperparameters + image size + classes
//     metrics.csv        ← written by MetricsLogger
//
// The config is needed to rebuild the exact architecture before
// the weights can be loaded back into it.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::CnnClassifier;

const MODEL_STEM:  &str = "model";
const CONFIG_FILE: &str = "train_config.json";

/// Manages the model artifacts of one training run.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the weights file the recorder writes (`model.mpk`).
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_STEM).with_extension("mpk")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Write the model's parameters to `model.mpk`.
    pub fn save_model<B: Backend>(&self, model: &CnnClassifier<B>) -> Result<PathBuf> {
        // The recorder appends the extension itself
        let stem = self.dir.join(MODEL_STEM);

        CompactRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .with_context(|| format!("Failed to save model to '{}'", stem.display()))?;

        tracing::debug!("Saved model weights to '{}'", self.model_path().display());
        Ok(self.model_path())
    }

    /// Load saved parameters into a freshly initialised model
    /// of the same architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  CnnClassifier<B>,
        device: &B::Device,
    ) -> Result<CnnClassifier<B>> {
        let stem = self.dir.join(MODEL_STEM);

        let record = CompactRecorder::new()
            .load(stem.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained it first?", stem.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<PathBuf> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(path)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed training config '{}'", path.display()))
    }
}

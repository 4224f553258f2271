// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Download dataset.npz          (Layer 6 - infra)
//   Step 2: Load the bundle               (Layer 4 - data)
//   Step 3: Stratified train/val split    (Layer 4 - data)
//   Step 4: Build Burn datasets           (Layer 4 - data)
//   Step 5: Save config for inference     (Layer 6 - infra)
//   Step 6: Run training loop + save      (Layer 5 - ml)
//   Step 7: Upload model if configured    (Layer 6 - infra)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    bundle::DatasetBundle,
    dataset::ImageDataset,
    splitter::stratified_split,
};
use crate::domain::traits::BlobStore;
use crate::infra::{checkpoint::CheckpointManager, config::TrainEnv};
use crate::ml::trainer::{run_training, ComputeDevice, TrainReport};

pub const DATASET_KEY: &str = "dataset.npz";
pub const MODEL_KEY: &str = "model.mpk";
pub const CONFIG_KEY: &str = "train_config.json";

// ─── Training Configuration ──────────────────────────────────────────────────
// Hyperparameters for a training run. Saved next to the model so
// the inferencer can rebuild the same architecture.
// `image_size` and `num_classes` are taken from the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub work_dir:     PathBuf,
    pub epochs:       usize,
    pub batch_size:   usize,
    pub lr:           f64,
    pub val_fraction: f64,
    pub seed:         u64,
    pub dropout:      f64,
    pub device:       ComputeDevice,
    pub image_size:   usize,
    pub num_classes:  usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            work_dir:     PathBuf::from("/tmp"),
            epochs:       10,
            batch_size:   32,
            lr:           1e-4,
            val_fraction: 0.2,
            seed:         42,
            dropout:      0.5,
            device:       ComputeDevice::Cpu,
            image_size:   224,
            num_classes:  2,
        }
    }
}

impl TrainConfig {
    pub fn dataset_path(&self) -> PathBuf {
        self.work_dir.join(DATASET_KEY)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.work_dir.join("model")
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub report:   TrainReport,
    pub train:    usize,
    pub val:      usize,
    /// Keys uploaded to the model bucket (empty without MODEL_BUCKET)
    pub uploaded: Vec<String>,
}

pub struct TrainUseCase<'a> {
    config: TrainConfig,
    env:    TrainEnv,
    store:  &'a dyn BlobStore,
}

impl<'a> TrainUseCase<'a> {
    pub fn new(config: TrainConfig, env: TrainEnv, store: &'a dyn BlobStore) -> Self {
        Self { config, env, store }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let mut cfg = self.config.clone();

        // ── Step 1: Download the dataset bundle ──────────────────────────────
        let dataset_path = cfg.dataset_path();
        tracing::info!("Downloading {} from '{}'", DATASET_KEY, self.env.processed_bucket);
        self.store
            .download_file(&self.env.processed_bucket, DATASET_KEY, &dataset_path)?;

        // ── Step 2: Load matrices ────────────────────────────────────────────
        let bundle = DatasetBundle::read_npz(&dataset_path)?;
        tracing::info!("Loaded X shape: {:?}", bundle.images_shape());
        tracing::info!("Loaded y shape: [{}]", bundle.len());
        ensure!(!bundle.is_empty(), "Dataset bundle is empty");

        cfg.image_size  = bundle.image_size();
        cfg.num_classes = bundle.num_classes();
        if bundle.distinct_labels().len() != cfg.num_classes {
            tracing::warn!(
                "Labels {:?} do not cover all {} classes",
                bundle.distinct_labels(),
                cfg.num_classes
            );
        }

        // ── Step 3: Stratified split ─────────────────────────────────────────
        let samples = bundle.into_samples()?;
        let (train_samples, val_samples) =
            stratified_split(samples, |s| s.label, cfg.val_fraction, cfg.seed)?;
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 4: Build Burn datasets ──────────────────────────────────────
        let train_dataset = ImageDataset::new(train_samples);
        let val_dataset   = ImageDataset::new(val_samples);
        let (train, val)  = (train_dataset.sample_count(), val_dataset.sample_count());

        // ── Step 5: Save config for inference ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(cfg.model_dir())?;
        let config_path  = ckpt_manager.save_config(&cfg)?;

        // ── Step 6: Train and save ───────────────────────────────────────────
        let report = run_training(&cfg, train_dataset, val_dataset, &ckpt_manager)?;
        tracing::info!("Model summary: {} trainable parameters", report.num_params);

        // ── Step 7: Optional upload ──────────────────────────────────────────
        let mut uploaded = Vec::new();
        if let Some(bucket) = &self.env.model_bucket {
            self.store.upload_file(&report.model_path, bucket, MODEL_KEY)?;
            self.store.upload_file(&config_path, bucket, CONFIG_KEY)?;
            uploaded.push(MODEL_KEY.to_string());
            uploaded.push(CONFIG_KEY.to_string());
            tracing::info!("Model uploaded to '{}'", bucket);
        }

        Ok(TrainSummary { report, train, val, uploaded })
    }
}

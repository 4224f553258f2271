// ============================================================
// Layer 5: Training Loop
// ============================================================
// Manual train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on Autodiff<B> so gradients are tracked
//   - model.valid() returns the model on B itself, with dropout
//     disabled, and the validation loader batches on B as well
//   - argmax(1) returns [batch, 1], flattened before .equal()
//
// B is chosen at runtime from --device:
//   cpu → NdArray,  gpu → Wgpu

use anyhow::Result;
use burn::{
    backend::Autodiff,
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::{ImageDataset, ImageSample},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{CnnClassifier, CnnConfig};

/// Where tensors live during training and prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    Gpu,
}

/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history:    Vec<EpochMetrics>,
    pub num_params: usize,
    pub model_path: PathBuf,
}

/// Train on the configured device, then save the final weights.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<TrainReport> {
    match cfg.device {
        ComputeDevice::Cpu => {
            let device = burn::backend::ndarray::NdArrayDevice::Cpu;
            tracing::info!("Using NdArray CPU device");
            train_and_save::<burn::backend::NdArray>(cfg, train_dataset, val_dataset, ckpt_manager, &device)
        }
        ComputeDevice::Gpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_and_save::<burn::backend::Wgpu>(cfg, train_dataset, val_dataset, ckpt_manager, &device)
        }
    }
}

fn train_and_save<B: Backend>(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    ckpt_manager:  &CheckpointManager,
    device:        &B::Device,
) -> Result<TrainReport> {
    let logger = MetricsLogger::new(ckpt_manager.dir())?;
    let (model, history) = train_loop::<B>(cfg, train_dataset, val_dataset, device, &logger)?;

    let num_params = model.num_params();
    let model_path = ckpt_manager.save_model(&model)?;
    tracing::info!("Model saved locally at '{}'", model_path.display());

    Ok(TrainReport { history, num_params, model_path })
}

/// Fit a fresh classifier and return it with its per-epoch metrics.
pub fn train_loop<B: Backend>(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    device:        &B::Device,
    logger:        &MetricsLogger,
) -> Result<(CnnClassifier<Autodiff<B>>, Vec<EpochMetrics>)> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = CnnConfig::new(cfg.num_classes)
        .with_image_size(cfg.image_size)
        .with_dropout(cfg.dropout);
    let mut model: CnnClassifier<Autodiff<B>> = model_cfg.init(device)?;
    tracing::info!(
        "Model ready: {} classes, {}x{} input, {} parameters",
        cfg.num_classes,
        cfg.image_size,
        cfg.image_size,
        model.num_params()
    );

    let mut optim = AdamConfig::new().init::<Autodiff<B>, CnnClassifier<Autodiff<B>>>();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::<Autodiff<B>, ImageSample, ImageBatch<Autodiff<B>>>::new(
        ImageBatcher::new(cfg.image_size),
    )
    .batch_size(cfg.batch_size)
    .shuffle(cfg.seed)
    .num_workers(1)
    .set_device(device.clone())
    .build(train_dataset);

    let val_loader = DataLoaderBuilder::<B, ImageSample, ImageBatch<B>>::new(
        ImageBatcher::new(cfg.image_size),
    )
    .batch_size(cfg.batch_size)
    .num_workers(1)
    .set_device(device.clone())
    .build(val_dataset);

    let mut history = Vec::with_capacity(cfg.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut train = RunningStats::default();

        for batch in train_loader.iter() {
            let batch_len = batch.targets.dims()[0];
            let (loss, logits) = model.forward_loss(batch.images, batch.targets.clone());

            train.add(
                loss.clone().into_scalar().elem::<f64>(),
                count_correct(logits, batch.targets),
                batch_len,
            );

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // Dropout is inactive on the inner backend
        let model_valid = model.valid();
        let mut val = RunningStats::default();

        for batch in val_loader.iter() {
            let batch_len = batch.targets.dims()[0];
            let (loss, logits) = model_valid.forward_loss(batch.images, batch.targets.clone());
            val.add(
                loss.into_scalar().elem::<f64>(),
                count_correct(logits, batch.targets),
                batch_len,
            );
        }

        let metrics = EpochMetrics::new(
            epoch,
            train.mean_loss(),
            train.accuracy(),
            val.mean_loss(),
            val.accuracy(),
        );
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch,
            cfg.epochs,
            metrics.train_loss,
            metrics.train_acc * 100.0,
            metrics.val_loss,
            metrics.val_acc * 100.0,
        );
        logger.log(&metrics)?;
        history.push(metrics);
    }

    tracing::info!("Training complete!");
    Ok((model, history))
}

/// Number of rows whose highest logit matches the target.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let correct: i64 = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct.max(0) as usize
}

/// Loss/accuracy accumulator for one pass over a loader.
#[derive(Debug, Default)]
struct RunningStats {
    loss_sum: f64,
    batches:  usize,
    correct:  usize,
    samples:  usize,
}

impl RunningStats {
    fn add(&mut self, loss: f64, correct: usize, samples: usize) {
        self.loss_sum += loss;
        self.batches  += 1;
        self.correct  += correct;
        self.samples  += samples;
    }

    fn mean_loss(&self) -> f64 {
        if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN }
    }

    fn accuracy(&self) -> f64 {
        if self.samples > 0 { self.correct as f64 / self.samples as f64 } else { 0.0 }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    /// Dark images are class 0, bright images class 1.
    fn toy_samples(n: usize, side: usize) -> Vec<ImageSample> {
        (0..n)
            .map(|i| {
                let label = i % 2;
                let level = if label == 0 { 0.1 } else { 0.9 };
                ImageSample { pixels: vec![level; side * side * 3], label }
            })
            .collect()
    }

    #[test]
    fn test_running_stats() {
        let mut s = RunningStats::default();
        assert!(s.mean_loss().is_nan());
        assert_eq!(s.accuracy(), 0.0);

        s.add(1.0, 3, 4);
        s.add(0.5, 4, 4);
        assert_eq!(s.mean_loss(), 0.75);
        assert_eq!(s.accuracy(), 7.0 / 8.0);
    }

    #[test]
    fn test_count_correct() {
        let device  = NdArrayDevice::Cpu;
        let logits  = Tensor::<NdArray, 2>::from_floats([[2.0, 1.0], [0.0, 3.0], [5.0, 0.0]], &device);
        let targets = Tensor::<NdArray, 1, Int>::from_ints([0, 1, 1], &device);
        assert_eq!(count_correct(logits, targets), 2);
    }

    #[test]
    fn test_one_epoch_smoke_run() -> Result<()> {
        let dir    = tempfile::tempdir()?;
        let logger = MetricsLogger::new(dir.path())?;
        let cfg    = TrainConfig {
            epochs:      1,
            batch_size:  4,
            image_size:  24,
            num_classes: 2,
            ..TrainConfig::default()
        };

        let (model, history) = train_loop::<NdArray>(
            &cfg,
            ImageDataset::new(toy_samples(8, 24)),
            ImageDataset::new(toy_samples(4, 24)),
            &NdArrayDevice::Cpu,
            &logger,
        )?;

        assert_eq!(history.len(), 1);
        assert!(history[0].train_loss.is_finite());
        assert!(history[0].val_loss.is_finite());
        assert!((0.0..=1.0).contains(&history[0].val_acc));
        assert!(model.num_params() > 0);

        let csv = std::fs::read_to_string(logger.csv_path())?;
        assert_eq!(csv.lines().count(), 2);
        Ok(())
    }
}

// ============================================================
// Layer 5: Inferencer
// ============================================================
use anyhow::{anyhow, Context, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageSample,
    transform::ImageTransform,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{CnnClassifier, CnnConfig};

/// Result of classifying one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label:         usize,
    pub confidence:    f32,
    pub probabilities: Vec<f32>,
}

pub struct Inferencer<B: Backend> {
    model:     CnnClassifier<B>,
    transform: ImageTransform,
    device:    B::Device,
}

impl<B: Backend> Inferencer<B> {
    /// Rebuild the trained architecture from its saved config and
    /// load the weights into it.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg = ckpt_manager.load_config()?;
        let model_cfg = CnnConfig::new(cfg.num_classes)
            .with_image_size(cfg.image_size)
            .with_dropout(0.0);

        let model = model_cfg.init::<B>(&device)?;
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from '{}'", ckpt_manager.model_path().display());

        let image_size = u32::try_from(cfg.image_size).context("Image size out of range")?;
        Ok(Self { model, transform: ImageTransform::new(image_size), device })
    }

    /// Classify one encoded image, preprocessed exactly like the
    /// training data.
    pub fn predict(&self, bytes: &[u8]) -> Result<Prediction> {
        let image  = self.transform.apply(bytes)?;
        let sample = ImageSample { pixels: image.flat_pixels().to_vec(), label: 0 };

        let batcher = ImageBatcher::new(self.transform.size() as usize);
        let batch: ImageBatch<B> = batcher.batch(vec![sample], &self.device);

        let probabilities: Vec<f32> = self
            .model
            .predict_proba(batch.images)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;

        let (label, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .context("Model produced no class scores")?;

        tracing::debug!("Prediction: class {} ({:.4})", label, confidence);
        Ok(Prediction { label, confidence, probabilities })
    }
}

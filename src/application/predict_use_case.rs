// ============================================================
// Layer 2: PredictUseCase
// ============================================================
// Loads a trained model from <work_dir>/model and classifies a
// single local image file.

use anyhow::{Context, Result};
use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::sample::Category;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    inferencer::{Inferencer, Prediction},
    trainer::ComputeDevice,
};

/// A prediction paired with a readable class name.
#[derive(Debug, Clone)]
pub struct LabeledPrediction {
    pub prediction: Prediction,
    /// `None` when the model has more classes than Category knows
    pub category:   Option<Category>,
}

pub struct PredictUseCase {
    model_dir: PathBuf,
    device:    ComputeDevice,
}

impl PredictUseCase {
    pub fn new(model_dir: impl Into<PathBuf>, device: ComputeDevice) -> Self {
        Self { model_dir: model_dir.into(), device }
    }

    pub fn classify(&self, image_path: &Path) -> Result<LabeledPrediction> {
        let bytes = fs::read(image_path)
            .with_context(|| format!("Cannot read image '{}'", image_path.display()))?;
        let ckpt_manager = CheckpointManager::new(self.model_dir.clone())?;

        let prediction = match self.device {
            ComputeDevice::Cpu => {
                Inferencer::<NdArray>::from_checkpoint(&ckpt_manager, NdArrayDevice::Cpu)?
                    .predict(&bytes)?
            }
            ComputeDevice::Gpu => {
                Inferencer::<Wgpu>::from_checkpoint(&ckpt_manager, WgpuDevice::default())?
                    .predict(&bytes)?
            }
        };

        let category = Category::from_label(prediction.label as i64);
        tracing::info!(
            "{} → class {} ({:.1}%)",
            image_path.display(),
            prediction.label,
            prediction.confidence * 100.0
        );
        Ok(LabeledPrediction { prediction, category })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::data::transform::encoded_test_image;
    use crate::ml::model::{CnnClassifier, CnnConfig};

    #[test]
    fn test_classify_image_file() -> Result<()> {
        let dir  = tempfile::tempdir()?;
        let ckpt = CheckpointManager::new(dir.path().join("model"))?;

        let cfg = TrainConfig { image_size: 24, num_classes: 2, ..TrainConfig::default() };
        ckpt.save_config(&cfg)?;
        let model: CnnClassifier<NdArray> =
            CnnConfig::new(2).with_image_size(24).init(&NdArrayDevice::Cpu)?;
        ckpt.save_model(&model)?;

        let image = dir.path().join("pet.png");
        fs::write(&image, encoded_test_image(32, 32, image::ImageFormat::Png))?;

        let result = PredictUseCase::new(dir.path().join("model"), ComputeDevice::Cpu).classify(&image)?;
        assert!(result.category.is_some());
        assert_eq!(result.category.map(|c| c.label() as usize), Some(result.prediction.label));
        Ok(())
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PredictUseCase::new(dir.path(), ComputeDevice::Cpu)
            .classify(&dir.path().join("nope.jpg"))
            .unwrap_err();
        assert!(err.to_string().contains("nope.jpg"));
    }
}

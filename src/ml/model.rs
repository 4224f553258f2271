use anyhow::{bail, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    prelude::*,
};

/// Channels produced by the three convolution blocks.
const CONV_CHANNELS: [usize; 3] = [32, 64, 128];
const HIDDEN_UNITS: usize = 128;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct CnnConfig {
    pub num_classes: usize,
    #[config(default = 224)]
    pub image_size:  usize,
    #[config(default = 0.5)]
    pub dropout:     f64,
}

/// Side length of the last feature map for a square input:
/// each block is a 3×3 valid conv (−2) then a 2×2/2 max-pool (÷2).
/// `None` when the input is too small to survive all three blocks.
pub fn feature_map_size(image_size: usize) -> Option<usize> {
    let mut side = image_size;
    for _ in CONV_CHANNELS {
        side = side.checked_sub(2)? / 2;
    }
    (side > 0).then_some(side)
}

impl CnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<CnnClassifier<B>> {
        if self.num_classes < 2 {
            bail!("A classifier needs at least 2 classes, got {}", self.num_classes);
        }
        let Some(side) = feature_map_size(self.image_size) else {
            bail!(
                "Image size {} is too small for three conv/pool blocks (minimum 22)",
                self.image_size
            );
        };

        let [c1, c2, c3] = CONV_CHANNELS;
        let flat = c3 * side * side;
        tracing::debug!(
            "CNN: {0}x{0} input → 128x{1}x{1} features → {2} flat",
            self.image_size,
            side,
            flat
        );

        Ok(CnnClassifier {
            conv1:      Conv2dConfig::new([3, c1], [3, 3]).init(device),
            conv2:      Conv2dConfig::new([c1, c2], [3, 3]).init(device),
            conv3:      Conv2dConfig::new([c2, c3], [3, 3]).init(device),
            pool:       MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            fc1:        LinearConfig::new(flat, HIDDEN_UNITS).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            fc2:        LinearConfig::new(HIDDEN_UNITS, self.num_classes).init(device),
            activation: Relu::new(),
        })
    }
}

#[derive(Module, Debug)]
pub struct CnnClassifier<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub conv2:      Conv2d<B>,
    pub conv3:      Conv2d<B>,
    pub pool:       MaxPool2d,
    pub fc1:        Linear<B>,
    pub dropout:    Dropout,
    pub fc2:        Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> CnnClassifier<B> {
    /// images: [batch, 3, size, size] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block(&self.conv1, images);
        let x = self.block(&self.conv2, x);
        let x = self.block(&self.conv3, x);

        let [batch, c, h, w] = x.dims();
        let x = x.reshape([batch, c * h * w]);

        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    fn block(&self, conv: &Conv2d<B>, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(self.activation.forward(conv.forward(x)))
    }

    /// Mean cross-entropy of the logits against integer targets.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }

    /// Class probabilities: softmax over the logits.
    pub fn predict_proba(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(images), 1)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    #[test]
    fn test_feature_map_size() {
        assert_eq!(feature_map_size(224), Some(26));
        assert_eq!(feature_map_size(22), Some(1));
        assert_eq!(feature_map_size(21), None);
        assert_eq!(feature_map_size(1), None);
    }

    #[test]
    fn test_rejects_tiny_images_and_single_class() {
        let device = NdArrayDevice::Cpu;
        assert!(CnnConfig::new(2).with_image_size(16).init::<NdArray>(&device).is_err());
        assert!(CnnConfig::new(1).with_image_size(32).init::<NdArray>(&device).is_err());
    }

    #[test]
    fn test_forward_shape() {
        let device = NdArrayDevice::Cpu;
        let model: CnnClassifier<NdArray> = CnnConfig::new(2).with_image_size(24).init(&device).unwrap();

        let images = Tensor::<NdArray, 4>::zeros([3, 3, 24, 24], &device);
        assert_eq!(model.forward(images).dims(), [3, 2]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = NdArrayDevice::Cpu;
        let model: CnnClassifier<NdArray> = CnnConfig::new(2).with_image_size(24).init(&device).unwrap();

        let images = Tensor::<NdArray, 4>::ones([2, 3, 24, 24], &device);
        let probs: Vec<f32> = model.predict_proba(images).into_data().to_vec().unwrap();
        assert!((probs[0] + probs[1] - 1.0).abs() < 1e-5);
        assert!((probs[2] + probs[3] - 1.0).abs() < 1e-5);
    }
}

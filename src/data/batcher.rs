// ============================================================
// Layer 4: Image Batcher
// ============================================================
// Implements Burn's Batcher trait: Vec<ImageSample> → tensors.
//
//   Input:  N samples, each size·size·3 floats in (h, w, c) order
//   Output: images  [N, 3, size, size]   (channels first, as
//                                         Burn's Conv2d expects)
//           targets [N]
//
// All samples of a bundle share one image size, so the pixels
// can be concatenated and reshaped in a single step, then the
// channel axis is moved to position 1.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::ImageSample;

#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Shape: [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,

    /// Shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ImageBatcher {
    image_size: usize,
}

impl ImageBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }
}

impl<B: Backend> Batcher<B, ImageSample, ImageBatch<B>> for ImageBatcher {
    fn batch(&self, items: Vec<ImageSample>, device: &B::Device) -> ImageBatch<B> {
        let batch_size = items.len();
        let side       = self.image_size;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();
        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), device)
            .reshape([batch_size, side, side, 3])
            .permute([0, 3, 1, 2]);
        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device);

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    fn sample(side: usize, offset: f32, label: usize) -> ImageSample {
        let pixels = (0..side * side * 3).map(|i| offset + i as f32).collect();
        ImageSample { pixels, label }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = ImageBatcher::new(4);
        let items   = vec![sample(4, 0.0, 0), sample(4, 100.0, 1), sample(4, 200.0, 1)];

        let batch: ImageBatch<NdArray> = batcher.batch(items, &NdArrayDevice::Cpu);
        assert_eq!(batch.images.dims(), [3, 3, 4, 4]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1, 1]);
    }

    #[test]
    fn test_channels_are_moved_first() {
        let side    = 2;
        let batcher = ImageBatcher::new(side);

        let batch: ImageBatch<NdArray> = batcher.batch(vec![sample(side, 0.0, 0)], &NdArrayDevice::Cpu);
        let values: Vec<f32> = batch.images.into_data().to_vec().unwrap();

        // NCHW index (0, c, y, x) must hold HWC value (y·side + x)·3 + c
        let expected: Vec<f32> = (0..3)
            .flat_map(|c| (0..side * side).map(move |yx| (yx * 3 + c) as f32))
            .collect();
        assert_eq!(values, expected);
    }
}

// ============================================================
// Layer 4: Dataset Bundle (.npz)
// ============================================================
// The bundle is the hand-off between `preprocess --format bundle`
// and `train`. It is a zip-deflated NumPy archive containing:
//
//   X.npy  float32  (N, H, W, 3)   normalised pixels
//   y.npy  int64    (N,)           category labels
//
// so it can also be opened with `numpy.load("dataset.npz")`.
//
// Invariant: X and y have the same number of entries. It is
// checked on construction, so both the writer and the reader
// enforce it.

use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array4, Axis};
use ndarray_npy::{NpzReader, NpzWriter};
use std::{collections::BTreeSet, fs::File, path::Path};

use crate::data::dataset::ImageSample;

const IMAGES_NAME: &str = "X";
const LABELS_NAME: &str = "y";

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBundle {
    images: Array4<f32>,
    labels: Array1<i64>,
}

impl DatasetBundle {
    pub fn new(images: Array4<f32>, labels: Array1<i64>) -> Result<Self> {
        let shape = images.shape();
        ensure!(
            shape[0] == labels.len(),
            "Bundle has {} images but {} labels",
            shape[0],
            labels.len()
        );
        ensure!(shape[3] == 3, "Expected 3 colour channels, found {}", shape[3]);
        ensure!(
            shape[1] == shape[2],
            "Expected square images, found {}x{}",
            shape[1],
            shape[2]
        );
        Ok(Self { images, labels })
    }

    /// Build from flat (h, w, c)-ordered pixels, `image_size² · 3` per label.
    pub fn from_flat(image_size: usize, pixels: Vec<f32>, labels: Vec<i64>) -> Result<Self> {
        let n = labels.len();
        let images = Array4::from_shape_vec((n, image_size, image_size, 3), pixels)
            .with_context(|| {
                format!("Pixel buffer does not hold {n} images of {image_size}x{image_size}x3")
            })?;
        Self::new(images, Array1::from(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn image_size(&self) -> usize {
        self.images.shape()[1]
    }

    pub fn images_shape(&self) -> &[usize] {
        self.images.shape()
    }

    pub fn labels(&self) -> &Array1<i64> {
        &self.labels
    }

    /// Number of output classes the classifier needs: one past the
    /// largest label, so every label is a valid class index.
    pub fn num_classes(&self) -> usize {
        self.labels
            .iter()
            .copied()
            .max()
            .map_or(0, |max| usize::try_from(max + 1).unwrap_or(0))
    }

    /// Distinct label values present in the bundle.
    pub fn distinct_labels(&self) -> BTreeSet<i64> {
        self.labels.iter().copied().collect()
    }

    /// Split into per-sample records for the Burn dataset.
    pub fn into_samples(self) -> Result<Vec<ImageSample>> {
        self.images
            .axis_iter(Axis(0))
            .zip(self.labels.iter())
            .map(|(image, &label)| {
                let label = usize::try_from(label)
                    .with_context(|| format!("Negative label {label} in bundle"))?;
                Ok(ImageSample { pixels: image.iter().copied().collect(), label })
            })
            .collect()
    }

    pub fn write_npz(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create bundle '{}'", path.display()))?;

        let mut npz = NpzWriter::new_compressed(file);
        npz.add_array(IMAGES_NAME, &self.images)?;
        npz.add_array(LABELS_NAME, &self.labels)?;
        npz.finish()?;

        tracing::debug!("Wrote bundle '{}' with {} samples", path.display(), self.len());
        Ok(())
    }

    pub fn read_npz(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open bundle '{}'", path.display()))?;
        let mut npz = NpzReader::new(file)
            .with_context(|| format!("'{}' is not an npz archive", path.display()))?;

        let names  = npz.names()?;
        let images: Array4<f32> = npz.by_name(entry_name(&names, IMAGES_NAME)?)?;
        let labels: Array1<i64> = npz.by_name(entry_name(&names, LABELS_NAME)?)?;

        Self::new(images, labels)
    }
}

/// NumPy stores arrays as `<name>.npy` entries; accept either spelling.
fn entry_name<'a>(names: &'a [String], stem: &str) -> Result<&'a str> {
    names
        .iter()
        .find(|n| n.as_str() == stem || n.strip_suffix(".npy") == Some(stem))
        .map(String::as_str)
        .with_context(|| format!("Bundle has no '{stem}' array (found: {names:?})"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_bundle() -> DatasetBundle {
        let pixels: Vec<f32> = (0..3 * 4 * 4 * 3).map(|i| i as f32 / 144.0).collect();
        DatasetBundle::from_flat(4, pixels, vec![0, 1, 1]).unwrap()
    }

    #[test]
    fn test_write_then_read_preserves_contents() -> Result<()> {
        let dir  = tempfile::tempdir()?;
        let path = dir.path().join("dataset.npz");

        let bundle = tiny_bundle();
        bundle.write_npz(&path)?;
        let loaded = DatasetBundle::read_npz(&path)?;

        assert_eq!(loaded, bundle);
        assert_eq!(loaded.images_shape(), &[3, 4, 4, 3]);
        Ok(())
    }

    #[test]
    fn test_count_mismatch_is_rejected() {
        let images = Array4::<f32>::zeros((2, 4, 4, 3));
        let labels = Array1::from(vec![0i64, 1, 0]);
        assert!(DatasetBundle::new(images, labels).is_err());
    }

    #[test]
    fn test_wrong_pixel_count_is_rejected() {
        assert!(DatasetBundle::from_flat(4, vec![0.0; 10], vec![0]).is_err());
    }

    #[test]
    fn test_num_classes() {
        assert_eq!(tiny_bundle().num_classes(), 2);
        assert_eq!(tiny_bundle().distinct_labels().len(), 2);
    }

    #[test]
    fn test_num_classes_counts_missing_lower_labels() -> Result<()> {
        let bundle = DatasetBundle::from_flat(4, vec![0.5; 2 * 4 * 4 * 3], vec![1, 1])?;
        assert_eq!(bundle.num_classes(), 2);
        assert_eq!(bundle.distinct_labels().len(), 1);
        Ok(())
    }

    #[test]
    fn test_into_samples_keeps_order() -> Result<()> {
        let samples = tiny_bundle().into_samples()?;
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].label, 1);
        assert_eq!(samples[0].pixels.len(), 4 * 4 * 3);
        assert_eq!(samples[1].pixels[0], 48.0 / 144.0);
        Ok(())
    }

    #[test]
    fn test_not_an_archive() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.npz");
        std::fs::write(&path, b"nope").unwrap();
        assert!(DatasetBundle::read_npz(&path).is_err());
    }
}

// ============================================================
// Layer 4: Output Sinks
// ============================================================
// A sink receives every transformed sample of a preprocessing run
// and persists it in one output encoding:
//
//   matrix_csv.rs → <name>/image_matrix.csv + <name>/label.txt
//   bundle.rs     → dataset.npz (all samples, one archive)
//   jpeg.rs       → images/<name>.jpg + manifest.csv
//   pixel_csv.rs  → pixels.csv (one flattened row per sample)
//
// Every file is staged under the local work dir first and then
// uploaded to the processed bucket under the same relative key.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::data::transform::TransformedImage;
use crate::domain::{sample::Sample, traits::BlobStore};

pub mod bundle;
pub mod jpeg;
pub mod matrix_csv;
pub mod pixel_csv;

/// The interchangeable output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    MatrixCsv,
    Bundle,
    Jpeg,
    PixelCsv,
}

/// What a finished sink produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    /// Number of samples written
    pub records: usize,

    /// Keys uploaded to the processed bucket, in upload order
    pub artifacts: Vec<String>,
}

pub trait DatasetSink {
    fn write_sample(&mut self, sample: &Sample, image: &TransformedImage) -> Result<()>;

    /// Flush aggregate files and report what was written.
    fn finish(self: Box<Self>) -> Result<SinkSummary>;
}

/// Everything a sink needs to stage and publish files.
pub struct SinkContext<'a> {
    pub store:        &'a dyn BlobStore,
    pub bucket:       String,
    pub work_dir:     PathBuf,
    pub image_size:   u32,
    pub jpeg_quality: u8,
}

impl SinkContext<'_> {
    /// Local staging path for a bucket key.
    pub fn local_path(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.work_dir.clone(), |p, part| p.join(part))
    }

    /// Upload a staged file and record its key.
    pub fn publish(&self, local: &Path, key: &str, summary: &mut SinkSummary) -> Result<()> {
        self.store
            .upload_file(local, &self.bucket, key)
            .with_context(|| format!("Cannot publish '{}' as '{key}'", local.display()))?;
        summary.artifacts.push(key.to_string());
        Ok(())
    }
}

/// Create the sink for `format`, preparing the work dir.
pub fn build_sink<'a>(format: OutputFormat, ctx: SinkContext<'a>) -> Result<Box<dyn DatasetSink + 'a>> {
    std::fs::create_dir_all(&ctx.work_dir)
        .with_context(|| format!("Cannot create work dir '{}'", ctx.work_dir.display()))?;

    Ok(match format {
        OutputFormat::MatrixCsv => Box::new(matrix_csv::MatrixCsvSink::new(ctx)),
        OutputFormat::Bundle    => Box::new(bundle::BundleSink::new(ctx)),
        OutputFormat::Jpeg      => Box::new(jpeg::JpegSink::new(ctx)?),
        OutputFormat::PixelCsv  => Box::new(pixel_csv::PixelCsvSink::new(ctx)?),
    })
}

// ─── Test helpers ─────────────────────────────────────────────────────────────
#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::data::transform::{encoded_test_image, ImageTransform};
    use crate::domain::sample::Category;

    pub const BUCKET: &str = "processed";

    pub fn context<'a>(store: &'a dyn BlobStore, work_dir: &Path, image_size: u32) -> SinkContext<'a> {
        SinkContext {
            store,
            bucket: BUCKET.to_string(),
            work_dir: work_dir.to_path_buf(),
            image_size,
            jpeg_quality: 90,
        }
    }

    /// Two cats and one dog, already transformed.
    pub fn samples(image_size: u32) -> Vec<(Sample, TransformedImage)> {
        let transform = ImageTransform::new(image_size);
        [Category::Cats, Category::Cats, Category::Dogs]
            .into_iter()
            .enumerate()
            .map(|(i, category)| {
                let bytes = encoded_test_image(20 + i as u32, 18, image::ImageFormat::Png);
                let key   = format!("{}img{i}.png", category.prefix());
                (Sample::new(category, key, i + 1), transform.apply(&bytes).unwrap())
            })
            .collect()
    }
}

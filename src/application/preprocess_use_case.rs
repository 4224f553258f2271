// ============================================================
// Layer 2: PreprocessUseCase
// ============================================================
// One linear pass over the raw bucket:
//
//   for each category (cats, dogs):
//     list keys under "<category>/"
//     for each key (folder markers skipped):
//       counter += 1, name = "<singular>_<counter:04>"
//       download → transform → sink.write_sample
//   sink.finish → upload aggregate files
//
// Nothing is retried: the first failing object aborts the run.

use anyhow::{ensure, Context, Result};
use std::path::PathBuf;

use crate::data::{
    sinks::{build_sink, OutputFormat, SinkContext},
    transform::{ImageTransform, DEFAULT_IMAGE_SIZE},
};
use crate::domain::{
    sample::{Category, Sample},
    traits::BlobStore,
};
use crate::infra::config::PreprocessEnv;

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub format:       OutputFormat,
    pub image_size:   u32,
    pub work_dir:     PathBuf,
    pub jpeg_quality: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            format:       OutputFormat::Bundle,
            image_size:   DEFAULT_IMAGE_SIZE,
            work_dir:     PathBuf::from("/tmp/dataset"),
            jpeg_quality: 90,
        }
    }
}

/// Counts reported back to the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Raw objects processed (folder markers excluded)
    pub objects:   usize,

    /// Records written by the sink
    pub records:   usize,

    /// Keys uploaded to the processed bucket
    pub artifacts: Vec<String>,
}

pub struct PreprocessUseCase<'a> {
    config: PreprocessConfig,
    env:    PreprocessEnv,
    store:  &'a dyn BlobStore,
}

impl<'a> PreprocessUseCase<'a> {
    pub fn new(config: PreprocessConfig, env: PreprocessEnv, store: &'a dyn BlobStore) -> Self {
        Self { config, env, store }
    }

    pub fn execute(&self) -> Result<PreprocessReport> {
        let cfg       = &self.config;
        let transform = ImageTransform::new(cfg.image_size);

        let mut sink = build_sink(
            cfg.format,
            SinkContext {
                store:        self.store,
                bucket:       self.env.processed_bucket.clone(),
                work_dir:     cfg.work_dir.clone(),
                image_size:   cfg.image_size,
                jpeg_quality: cfg.jpeg_quality,
            },
        )?;

        let mut counter = 0usize;

        for category in Category::ALL {
            let prefix = category.prefix();
            let keys   = self
                .store
                .list_keys(&self.env.raw_bucket, &prefix)
                .with_context(|| format!("Cannot list '{prefix}' in '{}'", self.env.raw_bucket))?;
            tracing::info!("Found {} objects under {}", keys.len(), prefix);

            for key in keys {
                if key.ends_with('/') {
                    continue;
                }

                counter += 1;
                let sample = Sample::new(category, key, counter);

                let bytes = self
                    .store
                    .get_object(&self.env.raw_bucket, &sample.key)
                    .with_context(|| format!("Cannot download '{}'", sample.key))?;
                let image = transform
                    .apply(&bytes)
                    .with_context(|| format!("Cannot process '{}'", sample.key))?;
                sink.write_sample(&sample, &image)?;

                tracing::info!("Stored {} for {}", sample.name, sample.key);
            }
        }

        let summary = sink.finish()?;
        ensure!(
            summary.records == counter,
            "Wrote {} records for {} objects",
            summary.records,
            counter
        );

        tracing::info!("Dataset created: {} samples", summary.records);
        Ok(PreprocessReport {
            objects:   counter,
            records:   summary.records,
            artifacts: summary.artifacts,
        })
    }
}

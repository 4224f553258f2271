// ============================================================
// Layer 4: JPEG + manifest sink
// ============================================================
//   images/<name>.jpg   resized image, re-encoded as JPEG
//   manifest.csv        filename,label  (one row per image)

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;
use std::fs;

use super::{DatasetSink, SinkContext, SinkSummary};
use crate::data::transform::TransformedImage;
use crate::domain::sample::Sample;

pub const MANIFEST_KEY: &str = "manifest.csv";

#[derive(Debug, Serialize)]
struct ManifestRow {
    filename: String,
    label:    u8,
}

pub struct JpegSink<'a> {
    ctx:      SinkContext<'a>,
    manifest: Vec<ManifestRow>,
    summary:  SinkSummary,
}

impl<'a> JpegSink<'a> {
    pub fn new(ctx: SinkContext<'a>) -> Result<Self> {
        fs::create_dir_all(ctx.work_dir.join("images"))?;
        Ok(Self { ctx, manifest: Vec::new(), summary: SinkSummary::default() })
    }
}

impl DatasetSink for JpegSink<'_> {
    fn write_sample(&mut self, sample: &Sample, image: &TransformedImage) -> Result<()> {
        let filename = format!("{}.jpg", sample.name);
        let key      = format!("images/{filename}");
        let path     = self.ctx.local_path(&key);

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.ctx.jpeg_quality)
            .encode_image(&image.resized)
            .with_context(|| format!("Cannot encode {} as JPEG", sample.name))?;
        fs::write(&path, &encoded)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        self.ctx.publish(&path, &key, &mut self.summary)?;
        self.manifest.push(ManifestRow { filename, label: sample.label() });
        self.summary.records += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<SinkSummary> {
        let mut this = *self;
        let path     = this.ctx.local_path(MANIFEST_KEY);

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        for row in &this.manifest {
            writer.serialize(row)?;
        }
        // An empty run still gets a header
        if this.manifest.is_empty() {
            writer.write_record(["filename", "label"])?;
        }
        writer.flush()?;

        this.ctx.publish(&path, MANIFEST_KEY, &mut this.summary)?;
        Ok(this.summary)
    }
}

// ============================================================
// Layer 4: Per-sample CSV matrix sink
// ============================================================
// For every sample:
//   <name>/image_matrix.csv  H rows, each row = W pixels × 3
//                            channels flattened (r,g,b,r,g,b,...)
//   <name>/label.txt         the integer label, no newline

use anyhow::{Context, Result};
use std::fs;

use super::{DatasetSink, SinkContext, SinkSummary};
use crate::data::transform::TransformedImage;
use crate::domain::sample::Sample;

pub struct MatrixCsvSink<'a> {
    ctx:     SinkContext<'a>,
    summary: SinkSummary,
}

impl<'a> MatrixCsvSink<'a> {
    pub fn new(ctx: SinkContext<'a>) -> Self {
        Self { ctx, summary: SinkSummary::default() }
    }
}

impl DatasetSink for MatrixCsvSink<'_> {
    fn write_sample(&mut self, sample: &Sample, image: &TransformedImage) -> Result<()> {
        let matrix_key  = format!("{}/image_matrix.csv", sample.name);
        let label_key   = format!("{}/label.txt", sample.name);
        let matrix_path = self.ctx.local_path(&matrix_key);
        let label_path  = self.ctx.local_path(&label_key);

        if let Some(dir) = matrix_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&matrix_path)
            .with_context(|| format!("Cannot create '{}'", matrix_path.display()))?;
        for row in image.matrix.outer_iter() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;

        fs::write(&label_path, sample.label().to_string())
            .with_context(|| format!("Cannot write '{}'", label_path.display()))?;

        self.ctx.publish(&matrix_path, &matrix_key, &mut self.summary)?;
        self.ctx.publish(&label_path, &label_key, &mut self.summary)?;

        self.summary.records += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<SinkSummary> {
        Ok(self.summary)
    }
}

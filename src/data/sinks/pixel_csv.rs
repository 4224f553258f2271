// ============================================================
// Layer 4: Flattened pixel CSV sink
// ============================================================
// One file for the whole run:
//
//   label,p0,p1,...,p{H*W*3-1}
//   0,0.5019608,0.21960784,...
//
// Pixels are flattened in (row, column, channel) order.

use anyhow::{ensure, Context, Result};
use std::{fs::File, path::PathBuf};

use super::{DatasetSink, SinkContext, SinkSummary};
use crate::data::transform::TransformedImage;
use crate::domain::sample::Sample;

pub const PIXELS_KEY: &str = "pixels.csv";

pub struct PixelCsvSink<'a> {
    ctx:     SinkContext<'a>,
    path:    PathBuf,
    writer:  csv::Writer<File>,
    width:   usize,
    records: usize,
}

impl<'a> PixelCsvSink<'a> {
    pub fn new(ctx: SinkContext<'a>) -> Result<Self> {
        let path   = ctx.local_path(PIXELS_KEY);
        let side   = ctx.image_size as usize;
        let width  = side * side * 3;

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        let header = std::iter::once("label".to_string()).chain((0..width).map(|i| format!("p{i}")));
        writer.write_record(header)?;

        Ok(Self { ctx, path, writer, width, records: 0 })
    }
}

impl DatasetSink for PixelCsvSink<'_> {
    fn write_sample(&mut self, sample: &Sample, image: &TransformedImage) -> Result<()> {
        let pixels = image.flat_pixels();
        ensure!(
            pixels.len() == self.width,
            "{} has {} pixel values, expected {}",
            sample.name,
            pixels.len(),
            self.width
        );

        let row = std::iter::once(sample.label().to_string()).chain(pixels.iter().map(|v| v.to_string()));
        self.writer.write_record(row)?;
        self.records += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<SinkSummary> {
        let mut this = *self;
        this.writer.flush()?;
        drop(this.writer);

        let mut summary = SinkSummary { records: this.records, artifacts: Vec::new() };
        this.ctx.publish(&this.path, PIXELS_KEY, &mut summary)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sinks::test_support::{context, samples, BUCKET};
    use crate::domain::traits::BlobStore;
    use crate::infra::storage::memory::MemoryStore;

    #[test]
    fn test_one_row_per_sample() -> Result<()> {
        let dir   = tempfile::tempdir()?;
        let store = MemoryStore::new();
        let mut sink: Box<dyn DatasetSink + '_> = Box::new(PixelCsvSink::new(context(&store, dir.path(), 4))?);

        for (sample, image) in samples(4) {
            sink.write_sample(&sample, &image)?;
        }
        let summary = sink.finish()?;
        assert_eq!(summary.records, 3);

        let body = store.get_object(BUCKET, PIXELS_KEY)?;
        let mut reader = csv::Reader::from_reader(body.as_slice());
        assert_eq!(reader.headers()?.len(), 1 + 4 * 4 * 3);

        let labels: Vec<String> = reader
            .records()
            .map(|r| r.map(|rec| rec[0].to_string()))
            .collect::<Result<_, _>>()?;
        assert_eq!(labels, vec!["0", "0", "1"]);
        Ok(())
    }

    #[test]
    fn test_size_mismatch_is_rejected() -> Result<()> {
        let dir   = tempfile::tempdir()?;
        let store = MemoryStore::new();
        let mut sink = PixelCsvSink::new(context(&store, dir.path(), 4))?;

        let (sample, image) = samples(8).remove(0);
        assert!(sink.write_sample(&sample, &image).is_err());
        Ok(())
    }
}

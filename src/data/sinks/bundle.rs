// ============================================================
// Layer 4: Compressed bundle sink
// ============================================================
// Accumulates every sample in memory and writes a single
// dataset.npz when the run finishes. Images and labels are
// pushed together, so their counts cannot drift apart.

use anyhow::Result;

use super::{DatasetSink, SinkContext, SinkSummary};
use crate::data::bundle::DatasetBundle;
use crate::data::transform::TransformedImage;
use crate::domain::sample::Sample;

pub const BUNDLE_KEY: &str = "dataset.npz";

pub struct BundleSink<'a> {
    ctx:    SinkContext<'a>,
    pixels: Vec<f32>,
    labels: Vec<i64>,
}

impl<'a> BundleSink<'a> {
    pub fn new(ctx: SinkContext<'a>) -> Self {
        Self { ctx, pixels: Vec::new(), labels: Vec::new() }
    }
}

impl DatasetSink for BundleSink<'_> {
    fn write_sample(&mut self, sample: &Sample, image: &TransformedImage) -> Result<()> {
        self.pixels.extend_from_slice(image.flat_pixels());
        self.labels.push(i64::from(sample.label()));
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<SinkSummary> {
        let this    = *self;
        let records = this.labels.len();
        let bundle  = DatasetBundle::from_flat(this.ctx.image_size as usize, this.pixels, this.labels)?;

        let path = this.ctx.local_path(BUNDLE_KEY);
        bundle.write_npz(&path)?;
        tracing::info!("Bundle shape X={:?} y=({},)", bundle.images_shape(), bundle.len());

        let mut summary = SinkSummary { records, artifacts: Vec::new() };
        this.ctx.publish(&path, BUNDLE_KEY, &mut summary)?;
        Ok(summary)
    }
}

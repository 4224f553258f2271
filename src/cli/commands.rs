// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Three subcommands: `preprocess`, `train` and `predict`.
//
// Bucket names and the region come from the environment
// (see infra::config); everything tunable is a flag here.

use clap::{builder::RangedU64ValueParser, Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{preprocess_use_case::PreprocessConfig, train_use_case::TrainConfig};
use crate::data::{sinks::OutputFormat, transform::DEFAULT_IMAGE_SIZE};
use crate::infra::storage::StorageKind;
use crate::ml::trainer::ComputeDevice;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download raw images, resize them and publish a processed dataset
    Preprocess(PreprocessArgs),

    /// Train the CNN on dataset.npz from the processed bucket
    Train(TrainArgs),

    /// Classify a local image with a trained model
    Predict(PredictArgs),
}

/// Where buckets live. Shared by `preprocess` and `train`.
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Storage backend
    #[arg(long, value_enum, default_value_t = StorageArg::S3)]
    pub storage: StorageArg,

    /// Root directory holding one sub-directory per bucket (local backend only)
    #[arg(long, default_value = "buckets")]
    pub storage_root: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArg {
    S3,
    Local,
}

impl From<StorageArg> for StorageKind {
    fn from(a: StorageArg) -> Self {
        match a {
            StorageArg::S3    => StorageKind::S3,
            StorageArg::Local => StorageKind::Local,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Per-sample image_matrix.csv + label.txt
    MatrixCsv,
    /// One compressed dataset.npz with X and y
    Bundle,
    /// Resized JPEGs + manifest.csv
    Jpeg,
    /// One pixels.csv, a row per image
    PixelCsv,
}

impl From<FormatArg> for OutputFormat {
    fn from(a: FormatArg) -> Self {
        match a {
            FormatArg::MatrixCsv => OutputFormat::MatrixCsv,
            FormatArg::Bundle    => OutputFormat::Bundle,
            FormatArg::Jpeg      => OutputFormat::Jpeg,
            FormatArg::PixelCsv  => OutputFormat::PixelCsv,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    Cpu,
    Gpu,
}

impl From<DeviceArg> for ComputeDevice {
    fn from(a: DeviceArg) -> Self {
        match a {
            DeviceArg::Cpu => ComputeDevice::Cpu,
            DeviceArg::Gpu => ComputeDevice::Gpu,
        }
    }
}

/// All arguments for the `preprocess` command.
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Output encoding
    #[arg(long, value_enum, default_value_t = FormatArg::Bundle)]
    pub format: FormatArg,

    /// Side length images are resized to
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    pub image_size: u32,

    /// Scratch directory for files before upload
    #[arg(long, default_value = "/tmp/dataset")]
    pub work_dir: PathBuf,

    /// JPEG quality for the jpeg format (1-100)
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    #[command(flatten)]
    pub storage: StorageArgs,
}

impl From<&PreprocessArgs> for PreprocessConfig {
    fn from(a: &PreprocessArgs) -> Self {
        PreprocessConfig {
            format:       a.format.into(),
            image_size:   a.image_size,
            work_dir:     a.work_dir.clone(),
            jpeg_quality: a.jpeg_quality,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Scratch directory; the bundle lands here and the model under <work-dir>/model
    #[arg(long, default_value = "/tmp")]
    pub work_dir: PathBuf,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 10, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub epochs: usize,

    #[arg(long, default_value_t = 32, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Fraction of each class held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Seed for the split and for batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Dropout before the output layer
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<&TrainArgs> for TrainConfig {
    fn from(a: &TrainArgs) -> Self {
        TrainConfig {
            work_dir:     a.work_dir.clone(),
            epochs:       a.epochs,
            batch_size:   a.batch_size,
            lr:           a.lr,
            val_fraction: a.val_fraction,
            seed:         a.seed,
            dropout:      a.dropout,
            device:       a.device.into(),
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `predict` command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image file to classify
    #[arg(long)]
    pub image: PathBuf,

    /// Directory holding model.mpk and train_config.json
    #[arg(long, default_value = "/tmp/model")]
    pub model_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}

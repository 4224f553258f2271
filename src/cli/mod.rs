// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, reads bucket settings from the
// environment and hands off to Layer 2. Results are printed
// here and nowhere else.
//
//   1. `preprocess` → raw bucket → processed bucket
//   2. `train`      → dataset.npz → model (+ optional upload)
//   3. `predict`    → model + image → class

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, PreprocessArgs, TrainArgs};

use crate::infra::{
    config::{PreprocessEnv, TrainEnv},
    storage::open_store,
};

#[derive(Parser, Debug)]
#[command(
    name = "catdog-pipeline",
    version,
    about = "Prepare cat/dog image datasets from blob storage and train a small CNN on them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Preprocess(args) => run_preprocess(args),
            Commands::Train(args)      => run_train(args),
            Commands::Predict(args)    => run_predict(args),
        }
    }
}

fn run_preprocess(args: PreprocessArgs) -> Result<()> {
    use crate::application::preprocess_use_case::PreprocessUseCase;

    let env   = PreprocessEnv::from_env()?;
    let store = open_store(args.storage.storage.into(), &args.storage.storage_root, &env.region)?;

    tracing::info!("Preprocessing '{}' into '{}'", env.raw_bucket, env.processed_bucket);
    let report = PreprocessUseCase::new((&args).into(), env, store.as_ref()).execute()?;

    println!("Processed {} images into {} records.", report.objects, report.records);
    for key in &report.artifacts {
        println!("  uploaded {key}");
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let env   = TrainEnv::from_env()?;
    let store = open_store(args.storage.storage.into(), &args.storage.storage_root, &env.region)?;

    let summary = TrainUseCase::new((&args).into(), env, store.as_ref()).execute()?;

    if let Some(last) = summary.report.history.last() {
        println!(
            "Training complete: val_loss={:.4}, val_acc={:.1}% ({} train / {} val)",
            last.val_loss,
            last.val_acc * 100.0,
            summary.train,
            summary.val
        );
    }
    println!("Model saved to {}", summary.report.model_path.display());
    if !summary.uploaded.is_empty() {
        println!("Uploaded: {}", summary.uploaded.join(", "));
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let result = PredictUseCase::new(args.model_dir, args.device.into()).classify(&args.image)?;
    let name   = result.category.map_or("unknown", |c| c.name());

    println!(
        "{}: {} (class {}, {:.1}% confidence)",
        args.image.display(),
        name,
        result.prediction.label,
        result.prediction.confidence * 100.0
    );
    Ok(())
}

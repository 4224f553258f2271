// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// All Burn model and optimisation code lives here; the data
// layer only implements Burn's Dataset/Batcher traits.
//
//   model.rs      : the fixed-topology CNN classifier
//                   3 × (conv 3x3 + ReLU + max-pool 2x2)
//                   → dense 128 + ReLU → dropout → dense N
//
//   trainer.rs    : Adam training loop with per-epoch
//                   validation, metrics and final save
//
//   inferencer.rs : rebuilds a saved model and classifies
//                   a single image

/// CNN classifier architecture
pub mod model;

/// Training loop and device selection
pub mod trainer;

/// Loads a saved model and predicts image classes
pub mod inferencer;

// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between raw object bytes and tensor batches.
//
// Preprocessing path:
//
//   object bytes
//       │
//       ▼
//   ImageTransform  → decode, RGB, resize, /255
//       │
//       ▼
//   DatasetSink     → one of four output encodings
//
// Training path:
//
//   dataset.npz
//       │
//       ▼
//   DatasetBundle   → X (N,H,W,3) + y (N,)
//       │
//       ▼
//   stratified_split → train / validation
//       │
//       ▼
//   ImageDataset + ImageBatcher → Burn DataLoader

/// Decode, resize and normalise images
pub mod transform;

/// Output encodings for preprocessed samples
pub mod sinks;

/// The .npz dataset bundle
pub mod bundle;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Stratified train/validation split
pub mod splitter;

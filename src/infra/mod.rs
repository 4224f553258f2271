// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the application layer:
//
//   config.rs     : required/optional environment variables
//   storage.rs    : S3 and local-directory BlobStore backends
//   checkpoint.rs : saving/loading model weights and config
//   metrics.rs    : per-epoch training metrics CSV

/// Environment variable validation
pub mod config;

/// Blob storage backends
pub mod storage;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the pipeline
// works on. No Burn types, no image buffers, no network calls.

/// Categories, labels and sample naming
pub mod sample;

/// Abstractions implemented by the infra layer
pub mod traits;

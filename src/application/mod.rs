// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Each use case wires the lower layers together for one command.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - Storage is only reached through the BlobStore trait

// Raw bucket → processed dataset
pub mod preprocess_use_case;

// dataset.npz → trained model
pub mod train_use_case;

// Trained model + image → class
pub mod predict_use_case;

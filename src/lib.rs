//! Windowed Image Cleaning Library
//!
//! Pure Rust core for window-based image decomposition and reconstruction.
//! An image is cut into overlapping rectangular windows persisted through a
//! pluggable store, an external factorization of the window matrix is
//! reduced to a chosen component subset, and the image is rebuilt by
//! overlap-add averaging. Includes spectral window-size estimation and a
//! radially-averaged autocorrelation diagnostic.

pub mod batch;
pub mod error;
pub mod extract;
pub mod float_trait;
pub mod geometry;
pub mod radial;
pub mod reconstruct;
pub mod selector;
pub mod store;
pub mod transforms;
pub mod window_size;

// Re-export commonly used types at the crate root
pub use batch::{BatchPolicy, MemoryBudget};
pub use error::CleanError;
pub use extract::{extract_windows, ExtractOptions};
pub use float_trait::CleanFloat;
pub use geometry::WindowGeometry;
pub use radial::{radial_autocorrelation, RadialProfile, RadialStats};
pub use reconstruct::{
    reconstruct, reconstruct_by_component, DecompositionFactors, FactorizationKind,
    PerComponentImage, ReconstructionOutput,
};
pub use selector::{ComponentSelection, ComponentSpec};
pub use store::{MemoryStore, WindowSet, WindowStore};
pub use window_size::{estimate_window_size, EstimateOptions};

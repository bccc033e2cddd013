//! Error taxonomy for the windowing and reconstruction core.
//!
//! Every fatal condition maps to one variant so call sites can match on the
//! failure class instead of parsing message strings. Fit non-convergence in
//! the window-size estimator is the only recovered condition; it surfaces
//! here as `FitFailure` internally and is handled before reaching callers
//! of `estimate_window_size`.

use thiserror::Error;

/// Errors produced by the windowing, estimation, and reconstruction routines.
#[derive(Debug, Error)]
pub enum CleanError {
    /// Window/step/image-size combination that cannot produce any window.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Image with no dynamic range (max == min); normalization is undefined.
    #[error("degenerate image: max equals min, cannot normalize")]
    DegenerateImage,

    /// 2D field with no dynamic range in its autocorrelation.
    #[error("degenerate field: autocorrelation has no dynamic range")]
    DegenerateField,

    /// Memory ceiling too small for even a single batch item under the
    /// strict policy.
    #[error("insufficient memory: {needed} bytes per item exceeds the {available} byte ceiling")]
    InsufficientMemory {
        /// Bytes required per batch item.
        needed: usize,
        /// Effective ceiling after budget adjustments.
        available: usize,
    },

    /// Original/cleaned image shapes disagree when forming the residual.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape implied by the window set metadata.
        expected: (usize, usize),
        /// Shape actually supplied.
        actual: (usize, usize),
    },

    /// Malformed component specification.
    #[error("unsupported component selector: {0}")]
    UnsupportedSelector(String),

    /// Failure surfaced by the persistent store backend.
    #[error("store error: {0}")]
    Store(String),

    /// Least-squares fit did not converge. Recovered inside the
    /// window-size estimator by the analytic fallback.
    #[error("fit did not converge: {0}")]
    FitFailure(String),
}

impl CleanError {
    /// Convenience constructor used by store backends.
    pub fn store(msg: impl Into<String>) -> Self {
        CleanError::Store(msg.into())
    }
}

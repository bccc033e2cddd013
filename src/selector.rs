//! Component selection.
//!
//! Callers describe which factorization components to keep with a
//! [`ComponentSpec`]; it is resolved once at this boundary into the
//! canonical [`ComponentSelection`], and every downstream consumer only
//! ever sees the canonical form. The same selection is applied to the
//! leading axis of S and V and the trailing axis of U.

use crate::error::CleanError;

/// User-facing component specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentSpec {
    /// Keep every component.
    All,
    /// Keep components `[0, n)`.
    Count(usize),
    /// Keep components `[start, stop)`.
    Range(usize, usize),
    /// Keep an explicit set of component indices.
    Indices(Vec<usize>),
}

/// Canonical resolved selection, always a subset of `[0, k)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentSelection {
    /// Contiguous slice `[start, stop)`.
    Slice {
        /// First retained component.
        start: usize,
        /// One past the last retained component.
        stop: usize,
    },
    /// Explicit ascending, duplicate-free index set.
    Indices(Vec<usize>),
}

impl ComponentSpec {
    /// Resolve against a factorization with `k` components.
    ///
    /// `Count` and `Range` are clamped to `[0, k)` like the slicing they
    /// mirror; a selection that comes out empty, a reversed range, or an
    /// index at or beyond `k` is `UnsupportedSelector`.
    pub fn resolve(&self, k: usize) -> Result<ComponentSelection, CleanError> {
        match self {
            ComponentSpec::All => {
                if k == 0 {
                    return Err(CleanError::UnsupportedSelector(
                        "factorization has no components".to_string(),
                    ));
                }
                Ok(ComponentSelection::Slice { start: 0, stop: k })
            }
            ComponentSpec::Count(n) => {
                let stop = (*n).min(k);
                if stop == 0 {
                    return Err(CleanError::UnsupportedSelector(format!(
                        "component count {} selects nothing from {} components",
                        n, k
                    )));
                }
                Ok(ComponentSelection::Slice { start: 0, stop })
            }
            ComponentSpec::Range(start, stop) => {
                let stop = (*stop).min(k);
                if *start >= stop {
                    return Err(CleanError::UnsupportedSelector(format!(
                        "range [{}, {}) is empty against {} components",
                        start, stop, k
                    )));
                }
                Ok(ComponentSelection::Slice {
                    start: *start,
                    stop,
                })
            }
            ComponentSpec::Indices(indices) => {
                if indices.is_empty() {
                    return Err(CleanError::UnsupportedSelector(
                        "empty index set".to_string(),
                    ));
                }
                let mut sorted = indices.clone();
                sorted.sort_unstable();
                sorted.dedup();
                if let Some(&bad) = sorted.iter().find(|&&i| i >= k) {
                    return Err(CleanError::UnsupportedSelector(format!(
                        "index {} out of range for {} components",
                        bad, k
                    )));
                }
                Ok(ComponentSelection::Indices(sorted))
            }
        }
    }
}

impl ComponentSelection {
    /// Number of retained components.
    pub fn len(&self) -> usize {
        match self {
            ComponentSelection::Slice { start, stop } => stop - start,
            ComponentSelection::Indices(indices) => indices.len(),
        }
    }

    /// A resolved selection is never empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The retained component indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            ComponentSelection::Slice { start, stop } => (*start..*stop).collect(),
            ComponentSelection::Indices(indices) => indices.clone(),
        }
    }
}

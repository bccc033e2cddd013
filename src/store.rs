//! Persistent store contract and the window-set handle.
//!
//! The columnar store that holds raw images, windows, and derived datasets
//! is an external collaborator; this crate only consumes it through the
//! [`WindowStore`] trait: typed 2D row-range read/write, an append-style
//! write with flush-based durability boundaries, a position table, and
//! integer attribute metadata. [`MemoryStore`] is the in-crate reference
//! backend used by tests; real deployments put an HDF5-style backend behind
//! the same trait.

use std::collections::HashMap;
use std::ops::Range;

use ndarray::{Array2, ArrayView2};

use crate::error::CleanError;
use crate::float_trait::CleanFloat;
use crate::geometry::WindowGeometry;

/// Attribute names persisted alongside a window dataset.
pub mod attrs {
    /// Window width.
    pub const WIN_X: &str = "win_x";
    /// Window height.
    pub const WIN_Y: &str = "win_y";
    /// Step along x.
    pub const WIN_STEP_X: &str = "win_step_x";
    /// Step along y.
    pub const WIN_STEP_Y: &str = "win_step_y";
    /// Source image width.
    pub const IMAGE_X: &str = "image_x";
    /// Source image height.
    pub const IMAGE_Y: &str = "image_y";
}

/// Store contract consumed by the extractor and the reconstruction engine.
pub trait WindowStore<F: CleanFloat> {
    /// Create (or replace) an `n_windows` x `win_pixels` dataset under
    /// `key`. `chunk_rows` is a chunking hint for backends that chunk.
    fn create_windows(
        &mut self,
        key: &str,
        n_windows: usize,
        win_pixels: usize,
        chunk_rows: usize,
    ) -> Result<(), CleanError>;

    /// Write a contiguous block of window rows starting at `start_row`.
    fn write_windows(
        &mut self,
        key: &str,
        start_row: usize,
        rows: ArrayView2<F>,
    ) -> Result<(), CleanError>;

    /// Read the window rows in `range` as an owned array.
    fn read_windows(&self, key: &str, range: Range<usize>) -> Result<Array2<F>, CleanError>;

    /// Persist the ordered window origin table for `key`.
    fn write_positions(
        &mut self,
        key: &str,
        positions: &[(usize, usize)],
    ) -> Result<(), CleanError>;

    /// Read back the ordered window origin table.
    fn read_positions(&self, key: &str) -> Result<Vec<(usize, usize)>, CleanError>;

    /// Set an integer attribute on the dataset at `key`.
    fn set_attr(&mut self, key: &str, name: &str, value: u64) -> Result<(), CleanError>;

    /// Read an integer attribute from the dataset at `key`.
    fn get_attr(&self, key: &str, name: &str) -> Result<u64, CleanError>;

    /// Durability boundary; called after every written batch.
    fn flush(&mut self) -> Result<(), CleanError>;
}

/// HashMap-backed reference implementation of [`WindowStore`].
#[derive(Debug, Default)]
pub struct MemoryStore<F: CleanFloat> {
    windows: HashMap<String, Array2<F>>,
    positions: HashMap<String, Vec<(usize, usize)>>,
    attrs: HashMap<(String, String), u64>,
    flushes: usize,
}

impl<F: CleanFloat> MemoryStore<F> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            positions: HashMap::new(),
            attrs: HashMap::new(),
            flushes: 0,
        }
    }

    /// Number of flush boundaries observed so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl<F: CleanFloat> WindowStore<F> for MemoryStore<F> {
    fn create_windows(
        &mut self,
        key: &str,
        n_windows: usize,
        win_pixels: usize,
        _chunk_rows: usize,
    ) -> Result<(), CleanError> {
        self.windows
            .insert(key.to_string(), Array2::zeros((n_windows, win_pixels)));
        Ok(())
    }

    fn write_windows(
        &mut self,
        key: &str,
        start_row: usize,
        rows: ArrayView2<F>,
    ) -> Result<(), CleanError> {
        let dataset = self
            .windows
            .get_mut(key)
            .ok_or_else(|| CleanError::store(format!("no dataset at '{}'", key)))?;
        let (n, p) = dataset.dim();
        let (b, bp) = rows.dim();
        if bp != p || start_row + b > n {
            return Err(CleanError::store(format!(
                "write of {}x{} rows at {} does not fit dataset {}x{}",
                b, bp, start_row, n, p
            )));
        }
        for (i, row) in rows.outer_iter().enumerate() {
            dataset.row_mut(start_row + i).assign(&row);
        }
        Ok(())
    }

    fn read_windows(&self, key: &str, range: Range<usize>) -> Result<Array2<F>, CleanError> {
        let dataset = self
            .windows
            .get(key)
            .ok_or_else(|| CleanError::store(format!("no dataset at '{}'", key)))?;
        if range.end > dataset.nrows() {
            return Err(CleanError::store(format!(
                "row range {:?} exceeds dataset with {} rows",
                range,
                dataset.nrows()
            )));
        }
        let mut out = Array2::zeros((range.len(), dataset.ncols()));
        for (i, r) in range.enumerate() {
            out.row_mut(i).assign(&dataset.row(r));
        }
        Ok(out)
    }

    fn write_positions(
        &mut self,
        key: &str,
        positions: &[(usize, usize)],
    ) -> Result<(), CleanError> {
        self.positions.insert(key.to_string(), positions.to_vec());
        Ok(())
    }

    fn read_positions(&self, key: &str) -> Result<Vec<(usize, usize)>, CleanError> {
        self.positions
            .get(key)
            .cloned()
            .ok_or_else(|| CleanError::store(format!("no position table at '{}'", key)))
    }

    fn set_attr(&mut self, key: &str, name: &str, value: u64) -> Result<(), CleanError> {
        self.attrs.insert((key.to_string(), name.to_string()), value);
        Ok(())
    }

    fn get_attr(&self, key: &str, name: &str) -> Result<u64, CleanError> {
        self.attrs
            .get(&(key.to_string(), name.to_string()))
            .copied()
            .ok_or_else(|| CleanError::store(format!("no attribute '{}' at '{}'", name, key)))
    }

    fn flush(&mut self) -> Result<(), CleanError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Handle to a persisted window set: the store key plus the geometry and
/// ordered positions recovered from the store's metadata.
///
/// Reconstruction always goes through this handle so the window ordering in
/// use is the ordering that was persisted at extraction time, never one
/// recomputed by convention.
#[derive(Debug, Clone)]
pub struct WindowSet {
    /// Store key of the window dataset.
    pub key: String,
    /// Geometry the windows were extracted with.
    pub geometry: WindowGeometry,
    /// Ordered origin table, x-major.
    pub positions: Vec<(usize, usize)>,
}

impl WindowSet {
    /// Reopen a window set from the store's persisted metadata.
    pub fn open<F, S>(store: &S, key: &str) -> Result<Self, CleanError>
    where
        F: CleanFloat,
        S: WindowStore<F>,
    {
        let win_w = store.get_attr(key, attrs::WIN_X)? as usize;
        let win_h = store.get_attr(key, attrs::WIN_Y)? as usize;
        let step_w = store.get_attr(key, attrs::WIN_STEP_X)? as usize;
        let step_h = store.get_attr(key, attrs::WIN_STEP_Y)? as usize;
        let image_w = store.get_attr(key, attrs::IMAGE_X)? as usize;
        let image_h = store.get_attr(key, attrs::IMAGE_Y)? as usize;

        let geometry = WindowGeometry::plan(image_w, image_h, win_w, win_h, step_w, step_h)?;
        let positions = store.read_positions(key)?;
        if positions.len() != geometry.n_windows() {
            return Err(CleanError::store(format!(
                "position table has {} entries, geometry implies {}",
                positions.len(),
                geometry.n_windows()
            )));
        }

        Ok(Self {
            key: key.to_string(),
            geometry,
            positions,
        })
    }

    /// Number of windows in the set.
    pub fn n_windows(&self) -> usize {
        self.positions.len()
    }
}

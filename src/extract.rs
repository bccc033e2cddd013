//! Window extraction into the persistent store.
//!
//! Materializes each window of an image as a flattened row of an
//! out-of-core window matrix, batching writes so peak memory stays under
//! the caller's ceiling, and persists the geometry attributes and the
//! ordered position table the reconstruction engine later reads back.

use log::{debug, info};
use ndarray::{s, Array2, ArrayView2};

use crate::batch::{batches, compute_batch_size, BatchPolicy, MemoryBudget};
use crate::error::CleanError;
use crate::float_trait::CleanFloat;
use crate::geometry::WindowGeometry;
use crate::store::{attrs, WindowSet, WindowStore};
use crate::window_size::{estimate_window_size, EstimateOptions};

/// Options for [`extract_windows`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Window width; estimated from the image spectrum when `None`.
    pub win_w: Option<usize>,
    /// Window height; estimated from the image spectrum when `None`.
    pub win_h: Option<usize>,
    /// Step along x. Default 1.
    pub step_w: usize,
    /// Step along y. Default 1.
    pub step_h: usize,
    /// Estimator options used when a window dimension is unset.
    pub estimate: EstimateOptions,
}

impl ExtractOptions {
    /// Default options: unit steps, both window dimensions estimated.
    pub fn new() -> Self {
        Self {
            win_w: None,
            win_h: None,
            step_w: 1,
            step_h: 1,
            estimate: EstimateOptions::default(),
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract all windows of `image` into the store under `key`.
///
/// The image is indexed (x, y): axis 0 is x. When either window dimension
/// is unset the spectral estimate is applied to both axes, with an explicit
/// dimension overriding its axis. Geometry attributes and the x-major
/// position table are persisted before any window data; window rows are
/// written in memory-bounded batches with a flush after each batch.
pub fn extract_windows<F, S>(
    image: ArrayView2<F>,
    store: &mut S,
    key: &str,
    options: &ExtractOptions,
    budget: MemoryBudget,
) -> Result<WindowSet, CleanError>
where
    F: CleanFloat,
    S: WindowStore<F>,
{
    let (image_w, image_h) = image.dim();

    let (win_w, win_h) = match (options.win_w, options.win_h) {
        (Some(w), Some(h)) => (w, h),
        (w, h) => {
            let guess = estimate_window_size(image, &options.estimate)?;
            (w.unwrap_or(guess), h.unwrap_or(guess))
        }
    };
    let step_w = options.step_w.max(1);
    let step_h = options.step_h.max(1);

    let geometry = WindowGeometry::plan(image_w, image_h, win_w, win_h, step_w, step_h)?;
    info!(
        "windowing {}x{} image into {} windows of {}x{} px",
        image_w,
        image_h,
        geometry.n_windows(),
        geometry.win_w,
        geometry.win_h
    );

    let positions = geometry.positions();
    let n_windows = geometry.n_windows();
    let win_pixels = geometry.win_pixels();

    store.create_windows(key, n_windows, win_pixels, 1)?;
    store.set_attr(key, attrs::WIN_X, geometry.win_w as u64)?;
    store.set_attr(key, attrs::WIN_Y, geometry.win_h as u64)?;
    store.set_attr(key, attrs::WIN_STEP_X, geometry.step_w as u64)?;
    store.set_attr(key, attrs::WIN_STEP_Y, geometry.step_h as u64)?;
    store.set_attr(key, attrs::IMAGE_X, image_w as u64)?;
    store.set_attr(key, attrs::IMAGE_Y, image_h as u64)?;
    store.write_positions(key, &positions)?;
    store.flush()?;

    // Batch size from per-window bytes against whatever ceiling remains
    // after the resident image. Floors to one window per batch.
    let item_bytes = std::mem::size_of::<F>();
    let per_window = win_pixels * item_bytes;
    let available = budget
        .effective()
        .saturating_sub(image_w * image_h * item_bytes);
    let batch_size = compute_batch_size(available, per_window, BatchPolicy::FloorToOne)?;

    for range in batches(n_windows, batch_size) {
        let mut block = Array2::<F>::zeros((range.len(), win_pixels));
        for (i, win) in range.clone().enumerate() {
            let (x, y) = positions[win];
            let patch = image.slice(s![x..x + geometry.win_w, y..y + geometry.win_h]);
            for (dst, &src) in block.row_mut(i).iter_mut().zip(patch.iter()) {
                *dst = src;
            }
        }
        store.write_windows(key, range.start, block.view())?;
        store.flush()?;
        debug!(
            "windowing image... {}%",
            (100 * range.end) / n_windows.max(1)
        );
    }

    Ok(WindowSet {
        key: key.to_string(),
        geometry,
        positions,
    })
}

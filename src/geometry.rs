//! Window geometry planning.
//!
//! Computes window dimensions, step sizes, and the full ordered set of
//! window origins for a given image size. The origin list is the canonical
//! x-major ordering (x varies slower) that the extractor persists and the
//! reconstruction engine reads back; nothing downstream re-derives it.

use crate::error::CleanError;

/// Immutable window geometry for one image.
///
/// Created through [`WindowGeometry::plan`], which applies the clamping
/// rules; the fields are never mutated once a window set has been extracted
/// with this geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowGeometry {
    /// Image width in pixels.
    pub image_w: usize,
    /// Image height in pixels.
    pub image_h: usize,
    /// Window width in pixels.
    pub win_w: usize,
    /// Window height in pixels.
    pub win_h: usize,
    /// Step between window origins along x.
    pub step_w: usize,
    /// Step between window origins along y.
    pub step_h: usize,
}

/// Clamp one axis: the step may not exceed a quarter of the dimension, and
/// the window is forced into [2*step, dim].
fn clamp_axis(dim: usize, win: usize, step: usize) -> (usize, usize) {
    let step = step.clamp(1, (dim / 4).max(1));
    let win = win.min(dim).max(2 * step);
    (win, step)
}

impl WindowGeometry {
    /// Plan a geometry for an `image_w` x `image_h` image.
    ///
    /// The requested step is clamped to at most a quarter of each dimension
    /// and the requested window size into `[2*step, dimension]`. Fails with
    /// `InvalidGeometry` if the image is empty or the clamped window still
    /// cannot fit.
    pub fn plan(
        image_w: usize,
        image_h: usize,
        win_w: usize,
        win_h: usize,
        step_w: usize,
        step_h: usize,
    ) -> Result<Self, CleanError> {
        if image_w == 0 || image_h == 0 {
            return Err(CleanError::InvalidGeometry(format!(
                "image dimensions must be positive, got {}x{}",
                image_w, image_h
            )));
        }
        if win_w == 0 || win_h == 0 || step_w == 0 || step_h == 0 {
            return Err(CleanError::InvalidGeometry(format!(
                "window {}x{} and step {}x{} must be positive",
                win_w, win_h, step_w, step_h
            )));
        }

        let (win_w, step_w) = clamp_axis(image_w, win_w, step_w);
        let (win_h, step_h) = clamp_axis(image_h, win_h, step_h);

        if win_w > image_w || win_h > image_h {
            return Err(CleanError::InvalidGeometry(format!(
                "clamped window {}x{} exceeds image {}x{}",
                win_w, win_h, image_w, image_h
            )));
        }

        Ok(Self {
            image_w,
            image_h,
            win_w,
            win_h,
            step_w,
            step_h,
        })
    }

    /// Number of window origins along x.
    pub fn nx(&self) -> usize {
        (self.image_w - self.win_w) / self.step_w + 1
    }

    /// Number of window origins along y.
    pub fn ny(&self) -> usize {
        (self.image_h - self.win_h) / self.step_h + 1
    }

    /// Total number of windows, nx * ny.
    pub fn n_windows(&self) -> usize {
        self.nx() * self.ny()
    }

    /// Pixels per flattened window.
    pub fn win_pixels(&self) -> usize {
        self.win_w * self.win_h
    }

    /// The full ordered origin list, x-major: x varies slower than y.
    pub fn positions(&self) -> Vec<(usize, usize)> {
        let mut positions = Vec::with_capacity(self.n_windows());
        let mut x = 0;
        while x + self.win_w <= self.image_w {
            let mut y = 0;
            while y + self.win_h <= self.image_h {
                positions.push((x, y));
                y += self.step_h;
            }
            x += self.step_w;
        }
        positions
    }
}

//! Radially-averaged autocorrelation of a 2D field.
//!
//! Diagnostic companion to reconstruction: the autocorrelation of the
//! removed noise (or of any 2D field) is computed through the power
//! spectrum, normalized to [0, 1], and summarized per radial shell so
//! feature scales stand out as peaks over the shell radius.

use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex;

use crate::error::CleanError;
use crate::float_trait::CleanFloat;
use crate::transforms::{fft2d, fftshift, ifft2d, magnitude};

/// Summary statistics of one radial shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialStats<F: CleanFloat> {
    /// Shell mean.
    pub mean: F,
    /// Shell minimum.
    pub min: F,
    /// Shell maximum.
    pub max: F,
    /// Population standard deviation over the shell.
    pub std_dev: F,
}

/// Result of [`radial_autocorrelation`].
#[derive(Debug, Clone)]
pub struct RadialProfile<F: CleanFloat> {
    /// Shifted autocorrelation map, min-max normalized to [0, 1].
    pub autocorrelation: Array2<F>,
    /// Center radius of each shell, in the normalized [-1, 1] coordinates.
    pub radii: Vec<F>,
    /// Per-shell statistics; `None` for shells no pixel falls into, which
    /// is reported distinctly from a shell of zero-valued pixels.
    pub shells: Vec<Option<RadialStats<F>>>,
}

/// Normalized coordinate of index `i` on an axis of length `n`, evenly
/// spaced over [-1, 1].
fn axis_coord<F: CleanFloat>(i: usize, n: usize) -> F {
    if n < 2 {
        return -F::one();
    }
    let t = F::usize_as(2) * F::usize_as(i) / F::usize_as(n - 1);
    t - F::one()
}

/// Compute the autocorrelation of `field` and bin it into `num_r_bin`
/// radial shells.
///
/// The autocorrelation is obtained as the inverse transform of the power
/// spectrum, shifted so zero lag sits at the center, then min-max
/// normalized. Shell `k` covers the open radius interval
/// `(k/(num_r_bin-1), k/(num_r_bin-1) + step)` with `step = 1/(num_r_bin-1)`,
/// so shells overlap their neighbors by half a width and the zero-lag pixel
/// itself (radius inside no open interval at r = 0 only when it lands
/// exactly on a bin edge) follows the same rule as every other pixel.
pub fn radial_autocorrelation<F: CleanFloat>(
    field: ArrayView2<F>,
    num_r_bin: usize,
) -> Result<RadialProfile<F>, CleanError> {
    if num_r_bin < 2 {
        return Err(CleanError::InvalidGeometry(format!(
            "radial binning needs at least 2 shells, got {}",
            num_r_bin
        )));
    }
    let (w, h) = field.dim();

    let power = magnitude(&fftshift(&fft2d(field))).mapv(|v| v * v);
    let power_c = power.mapv(|v| Complex::new(v, F::zero()));
    let auto = magnitude(&fftshift(&ifft2d(&power_c)));

    let min_a = auto.iter().copied().fold(F::infinity(), F::min);
    let max_a = auto.iter().copied().fold(F::neg_infinity(), F::max);
    let range = max_a - min_a;
    if !(range > F::zero()) {
        return Err(CleanError::DegenerateField);
    }
    let auto = auto.mapv(|v| (v - min_a) / range);

    let radius = Array2::from_shape_fn((w, h), |(x, y)| {
        let rx: F = axis_coord(x, w);
        let ry: F = axis_coord(y, h);
        (rx * rx + ry * ry).sqrt()
    });

    let step = F::one() / F::usize_as(num_r_bin - 1);
    let half = F::from_f64_c(0.5);
    let mut radii = Vec::with_capacity(num_r_bin);
    let mut shells = Vec::with_capacity(num_r_bin);

    for k in 0..num_r_bin {
        let r_bin = F::usize_as(k) * step;
        radii.push(r_bin + half * step);

        let mut count = 0usize;
        let mut sum = F::zero();
        let mut min = F::infinity();
        let mut max = F::neg_infinity();
        for (&r, &a) in radius.iter().zip(auto.iter()) {
            if r > r_bin && r < r_bin + step {
                count += 1;
                sum += a;
                min = min.min(a);
                max = max.max(a);
            }
        }
        if count == 0 {
            shells.push(None);
            continue;
        }

        let n = F::usize_as(count);
        let mean = sum / n;
        let mut var = F::zero();
        for (&r, &a) in radius.iter().zip(auto.iter()) {
            if r > r_bin && r < r_bin + step {
                let d = a - mean;
                var += d * d;
            }
        }
        shells.push(Some(RadialStats {
            mean,
            min,
            max,
            std_dev: (var / n).sqrt(),
        }));
    }

    Ok(RadialProfile {
        autocorrelation: auto,
        radii,
        shells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_flat_field_is_degenerate() {
        let field = Array2::<f64>::from_elem((16, 16), 3.0);
        let err = radial_autocorrelation(field.view(), 8).unwrap_err();
        assert!(matches!(err, CleanError::DegenerateField));
    }

    #[test]
    fn test_too_few_shells_rejected() {
        let field = Array2::from_shape_fn((8, 8), |(x, y)| (x + y) as f64);
        let err = radial_autocorrelation(field.view(), 1).unwrap_err();
        assert!(matches!(err, CleanError::InvalidGeometry(_)));
    }

    #[test]
    fn test_zero_lag_peak_is_centered_and_one() {
        // Zero lag dominates any autocorrelation, so after the shift the
        // center pixel of an even-sized map holds the normalized maximum.
        let field = Array2::from_shape_fn((16, 16), |(x, y)| {
            ((x * 2654435761 + y * 40503) % 101) as f64
        });
        let profile = radial_autocorrelation(field.view(), 8).unwrap();
        assert!(approx_eq(profile.autocorrelation[[8, 8]], 1.0, 1e-12));
        for &v in profile.autocorrelation.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_impulse_shell_statistics() {
        // An impulse has a flat power spectrum, so its autocorrelation is a
        // single spike at zero lag: shell 0 sees the spike, every farther
        // shell holds only zeros.
        let mut field = Array2::<f64>::zeros((8, 8));
        field[[0, 0]] = 1.0;
        let profile = radial_autocorrelation(field.view(), 5).unwrap();

        let first = profile.shells[0].unwrap();
        assert!(approx_eq(first.max, 1.0, 1e-12));
        assert!(approx_eq(first.min, 0.0, 1e-12));
        assert!(first.mean > 0.0 && first.std_dev > 0.0);

        for shell in &profile.shells[1..] {
            let stats = shell.expect("shell unexpectedly empty");
            assert!(approx_eq(stats.max, 0.0, 1e-12));
            assert!(approx_eq(stats.mean, 0.0, 1e-12));
            assert!(approx_eq(stats.std_dev, 0.0, 1e-12));
        }
    }

    #[test]
    fn test_shell_centers() {
        let field = Array2::from_shape_fn((8, 8), |(x, y)| ((x * 3 + y) % 5) as f64);
        let profile = radial_autocorrelation(field.view(), 5).unwrap();
        // step = 1/4; centers sit half a step past each linspace(0,1) point.
        assert!(approx_eq(profile.radii[0], 0.125, 1e-12));
        assert!(approx_eq(profile.radii[2], 0.625, 1e-12));
        assert!(approx_eq(profile.radii[4], 1.125, 1e-12));
    }

    #[test]
    fn test_empty_shells_are_none_not_zero() {
        // On a 2x2 grid every pixel sits at radius sqrt(2), which falls
        // outside every open shell interval, so all shells are undefined.
        let mut field = Array2::<f64>::zeros((2, 2));
        field[[0, 0]] = 1.0;
        let profile = radial_autocorrelation(field.view(), 5).unwrap();
        assert!(profile.shells.iter().all(|s| s.is_none()));
    }
}

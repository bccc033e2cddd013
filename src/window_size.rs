//! Automatic window-size estimation from spatial-frequency content.
//!
//! Guesses a window size that captures the dominant periodic feature scale:
//! normalize, taper, transform, bin the spectral magnitude into radial
//! annuli, pick the dominant peaks, then either fit a radial Gaussian
//! envelope or fall back to an analytic estimate from the strongest peak.

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};

use crate::error::CleanError;
use crate::float_trait::CleanFloat;
use crate::transforms::{fft2d, fftshift, magnitude};

/// Maximum Levenberg-Marquardt iterations for the peak-envelope fit.
const MAX_FIT_ITERATIONS: usize = 250;

/// Convergence threshold on the parameter step.
const FIT_CONVERGENCE: f64 = 1e-9;

/// Residual floor below which the fit is an exact interpolation; points
/// lying on the model leave chi-squared at rounding noise and no step can
/// strictly improve it.
const CHI2_FLOOR: f64 = 1e-24;

/// Initial damping for the L-M loop.
const INITIAL_LAMBDA: f64 = 1e-3;

/// Damping adjustment on failed / successful steps.
const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;

/// Options for [`estimate_window_size`].
#[derive(Debug, Clone)]
pub struct EstimateOptions {
    /// Number of spectral peaks retained for the fit. Default 2.
    pub num_peaks: usize,
    /// Number of radial annuli; defaults to span/4 when `None`.
    pub num_r_bin: Option<usize>,
    /// Fit a radial Gaussian to the retained peaks; when disabled the
    /// analytic estimate from the strongest peak is used directly.
    pub do_fit: bool,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            num_peaks: 2,
            num_r_bin: None,
            do_fit: true,
        }
    }
}

/// Estimate an optimal window size (in pixels) from an image.
///
/// The result is an even integer applied to both axes by callers unless one
/// axis is overridden explicitly. Fit non-convergence is recovered: a
/// warning is logged and the analytic estimate is returned instead.
///
/// Fails with `DegenerateImage` if the image has no dynamic range.
pub fn estimate_window_size<F: CleanFloat>(
    image: ArrayView2<F>,
    options: &EstimateOptions,
) -> Result<usize, CleanError> {
    let (image_w, image_h) = image.dim();
    info!("determining window size from {}x{} image", image_w, image_h);

    // Normalize to [0, 1]
    let lo = image
        .iter()
        .copied()
        .fold(F::infinity(), |a, b| if b < a { b } else { a });
    let hi = image
        .iter()
        .copied()
        .fold(F::neg_infinity(), |a, b| if b > a { b } else { a });
    if !(hi > lo) {
        return Err(CleanError::DegenerateImage);
    }
    let range = hi - lo;
    let normalized = image.mapv(|v| (v - lo) / range);

    // Mean-subtract, then taper with a separable raised cosine to suppress
    // edge leakage before the transform.
    let mean = normalized.sum() / F::usize_as(image_w * image_h);
    let tapered = raised_cosine_taper(&normalized.mapv(|v| v - mean));

    let spectrum = magnitude(&fftshift(&fft2d(tapered.view())));

    let span = image_w.min(image_h);
    let num_r_bin = options.num_r_bin.unwrap_or(span / 4).max(4);
    let annuli = radial_annulus_maxima(spectrum.view(), num_r_bin);

    // Strict local maxima among adjacent annulus maxima.
    let mut peaks: Vec<(f64, f64)> = Vec::new();
    for k in 1..annuli.len().saturating_sub(1) {
        if annuli[k].1 > annuli[k - 1].1 && annuli[k].1 > annuli[k + 1].1 {
            peaks.push(annuli[k]);
        }
    }
    if peaks.is_empty() {
        // No interior peak structure at all; take the strongest non-DC
        // annulus as the single peak.
        if let Some(&best) = annuli[1..]
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|p| p.1 > 0.0)
        {
            peaks.push(best);
        } else {
            return Err(CleanError::DegenerateImage);
        }
    }

    // Discard peaks at radius smaller than the tallest peak's radius, then
    // keep the strongest `num_peaks` by magnitude.
    let tallest = peaks
        .iter()
        .enumerate()
        .max_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut retained: Vec<(f64, f64)> = peaks.split_off(tallest);
    retained.sort_by(|a, b| b.1.total_cmp(&a.1));
    retained.truncate(options.num_peaks.max(1));

    let r_strongest = retained[0].0;
    let span_f = span as f64;
    let analytic = span_f / (r_strongest + 0.5);

    let window_size = if options.do_fit {
        if retained.len() < 2 {
            warn!(
                "peak-envelope fit is underdetermined ({} peak retained); \
                 using analytic estimate",
                retained.len()
            );
            analytic
        } else {
            let a0 = 2.0 * retained[0].1;
            match fit_radial_gaussian(&retained, a0, r_strongest) {
                Ok((_, sigma)) => span_f / (std::f64::consts::PI * sigma),
                Err(err) => {
                    warn!("{}; using analytic estimate", err);
                    analytic
                }
            }
        }
    } else {
        analytic
    };

    // Round down to the nearest even integer; consumers assume even
    // window sizes for their padding.
    let even = ((window_size.max(2.0) as usize) / 2) * 2;
    debug!("estimated window size: {} px", even.max(2));
    Ok(even.max(2))
}

/// Apply the separable raised-cosine taper
/// (1 - cos(2*pi*u)) * (1 - cos(2*pi*v)) / 4 over normalized coordinates.
fn raised_cosine_taper<F: CleanFloat>(image: &Array2<F>) -> Array2<F> {
    let (rows, cols) = image.dim();
    let two_pi = F::PI + F::PI;
    let quarter = F::from_f64_c(0.25);
    let row_w: Vec<F> = (0..rows)
        .map(|i| F::one() - (two_pi * F::usize_as(i) / F::usize_as(rows)).cos())
        .collect();
    let col_w: Vec<F> = (0..cols)
        .map(|j| F::one() - (two_pi * F::usize_as(j) / F::usize_as(cols)).cos())
        .collect();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        image[[i, j]] * row_w[i] * col_w[j] * quarter
    })
}

/// Maximum spectral magnitude per radial annulus.
///
/// Returns (annulus center radius, max magnitude) for `num_r_bin` annuli of
/// width (span/2)/num_r_bin, measured from the shifted spectrum's center.
fn radial_annulus_maxima<F: CleanFloat>(
    spectrum: ArrayView2<F>,
    num_r_bin: usize,
) -> Vec<(f64, f64)> {
    let (rows, cols) = spectrum.dim();
    let span = rows.min(cols);
    let r_max = span as f64 / 2.0;
    let width = r_max / num_r_bin as f64;
    let center_r = (rows / 2) as f64;
    let center_c = (cols / 2) as f64;

    let mut maxima = vec![0.0f64; num_r_bin];
    for ((i, j), &v) in spectrum.indexed_iter() {
        let dr = i as f64 - center_r;
        let dc = j as f64 - center_c;
        let r = (dr * dr + dc * dc).sqrt();
        if r > r_max {
            continue;
        }
        // Inclusive edges on both sides, matching the annulus selection
        // r1 <= r <= r2; an exact-edge radius lands in both bins.
        let lower = ((r / width).floor() as usize).min(num_r_bin - 1);
        let mag = v.to_f64().unwrap_or(0.0);
        if mag > maxima[lower] {
            maxima[lower] = mag;
        }
        if lower > 0 && r == lower as f64 * width && mag > maxima[lower - 1] {
            maxima[lower - 1] = mag;
        }
    }

    maxima
        .into_iter()
        .enumerate()
        .map(|(k, m)| (k as f64 * width + width / 2.0, m))
        .collect()
}

/// Least-squares fit of A * exp(-(r/sigma)^2) to (radius, magnitude) points
/// under relative residuals ((y - fit)/y), via Levenberg-Marquardt.
///
/// Returns (A, sigma) or `FitFailure` when the loop does not converge
/// within the iteration bound.
fn fit_radial_gaussian(
    points: &[(f64, f64)],
    a0: f64,
    sigma0: f64,
) -> Result<(f64, f64), CleanError> {
    let mut a = a0;
    let mut sigma = sigma0.max(f64::EPSILON);
    let mut lambda = INITIAL_LAMBDA;
    let mut chi2 = relative_chi2(points, a, sigma);

    for _ in 0..MAX_FIT_ITERATIONS {
        if chi2 < CHI2_FLOOR {
            return Ok((a, sigma));
        }

        // Normal equations from the residual Jacobian.
        let mut jtj = [[0.0f64; 2]; 2];
        let mut jtr = [0.0f64; 2];
        for &(r, y) in points {
            if y == 0.0 {
                continue;
            }
            let e = (-(r / sigma).powi(2)).exp();
            let g = a * e;
            let resid = (y - g) / y;
            let da = -e / y;
            let ds = -a * e * (2.0 * r * r / sigma.powi(3)) / y;
            jtj[0][0] += da * da;
            jtj[0][1] += da * ds;
            jtj[1][1] += ds * ds;
            jtr[0] += da * resid;
            jtr[1] += ds * resid;
        }
        jtj[1][0] = jtj[0][1];

        // Damped 2x2 solve.
        let d00 = jtj[0][0] * (1.0 + lambda);
        let d11 = jtj[1][1] * (1.0 + lambda);
        let det = d00 * d11 - jtj[0][1] * jtj[1][0];
        if det.abs() < 1e-300 || !det.is_finite() {
            return Err(CleanError::FitFailure(
                "singular normal equations in radial Gaussian fit".to_string(),
            ));
        }
        let delta_a = (-jtr[0] * d11 + jtr[1] * jtj[0][1]) / det;
        let delta_s = (jtr[0] * jtj[1][0] - jtr[1] * d00) / det;

        let cand_a = a + delta_a;
        let cand_s = sigma + delta_s;
        let candidate_ok = cand_s > 0.0 && cand_a.is_finite() && cand_s.is_finite();
        let cand_chi2 = if candidate_ok {
            relative_chi2(points, cand_a, cand_s)
        } else {
            f64::INFINITY
        };

        if cand_chi2 < chi2 {
            a = cand_a;
            sigma = cand_s;
            chi2 = cand_chi2;
            lambda *= LAMBDA_DOWN;
            if delta_a.abs().max(delta_s.abs()) < FIT_CONVERGENCE {
                return Ok((a, sigma));
            }
        } else {
            // A rejected step that barely changes chi-squared means the
            // loop sits on a plateau around the optimum, not a failure.
            if cand_chi2.is_finite() && cand_chi2 - chi2 < FIT_CONVERGENCE * (1.0 + chi2) {
                return Ok((a, sigma));
            }
            lambda *= LAMBDA_UP;
            if lambda > 1e12 {
                return Err(CleanError::FitFailure(format!(
                    "no descent direction after damping (chi2 {:.3e})",
                    chi2
                )));
            }
        }
    }

    Err(CleanError::FitFailure(format!(
        "no convergence in {} iterations (chi2 {:.3e})",
        MAX_FIT_ITERATIONS, chi2
    )))
}

fn relative_chi2(points: &[(f64, f64)], a: f64, sigma: f64) -> f64 {
    points
        .iter()
        .filter(|&&(_, y)| y != 0.0)
        .map(|&(r, y)| {
            let g = a * (-(r / sigma).powi(2)).exp();
            ((y - g) / y).powi(2)
        })
        .sum()
}

//! Whole-image 2D Fourier transforms and spectrum helpers.
//!
//! The window-size estimator, the reconstruction diagnostics, and the radial
//! autocorrelation all operate on the full image spectrum, so these routines
//! plan their FFTs internally per call instead of threading pre-computed
//! plans through every signature.

use ndarray::{Array2, ArrayView2};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::float_trait::CleanFloat;

/// Compute the unnormalized 2D FFT of a real-valued image.
pub fn fft2d<F: CleanFloat>(input: ArrayView2<F>) -> Array2<Complex<F>> {
    let (rows, cols) = input.dim();
    let mut planner = FftPlanner::<F>::new();
    let row_plan = planner.plan_fft_forward(cols);
    let col_plan = planner.plan_fft_forward(rows);

    // 1. Transform rows
    let mut intermediate = Array2::<Complex<F>>::zeros((rows, cols));
    let mut row_vec = vec![Complex::new(F::zero(), F::zero()); cols];
    for r in 0..rows {
        for (c, &v) in input.row(r).iter().enumerate() {
            row_vec[c] = Complex::new(v, F::zero());
        }
        row_plan.process(&mut row_vec);
        for c in 0..cols {
            intermediate[[r, c]] = row_vec[c];
        }
    }

    // 2. Transform columns
    let mut col_vec = vec![Complex::new(F::zero(), F::zero()); rows];
    for c in 0..cols {
        for r in 0..rows {
            col_vec[r] = intermediate[[r, c]];
        }
        col_plan.process(&mut col_vec);
        for r in 0..rows {
            intermediate[[r, c]] = col_vec[r];
        }
    }

    intermediate
}

/// Compute the 2D inverse FFT, normalized by 1/(rows*cols).
///
/// The output stays complex; callers that expect a real field take the
/// magnitude or real part themselves (the autocorrelation path needs the
/// magnitude of a shifted complex array).
pub fn ifft2d<F: CleanFloat>(input: &Array2<Complex<F>>) -> Array2<Complex<F>> {
    let (rows, cols) = input.dim();
    let mut planner = FftPlanner::<F>::new();
    let row_plan = planner.plan_fft_inverse(cols);
    let col_plan = planner.plan_fft_inverse(rows);

    // 1. Transform columns
    let mut intermediate = input.clone();
    let mut col_vec = vec![Complex::new(F::zero(), F::zero()); rows];
    for c in 0..cols {
        for r in 0..rows {
            col_vec[r] = intermediate[[r, c]];
        }
        col_plan.process(&mut col_vec);
        for r in 0..rows {
            intermediate[[r, c]] = col_vec[r];
        }
    }

    // 2. Transform rows and normalize
    let norm = F::one() / F::usize_as(rows * cols);
    let mut row_vec = vec![Complex::new(F::zero(), F::zero()); cols];
    for r in 0..rows {
        for c in 0..cols {
            row_vec[c] = intermediate[[r, c]];
        }
        row_plan.process(&mut row_vec);
        for c in 0..cols {
            intermediate[[r, c]] = Complex::new(row_vec[c].re * norm, row_vec[c].im * norm);
        }
    }

    intermediate
}

/// Shift the zero-frequency component to the center of the spectrum.
///
/// Rolls each axis by floor(len/2), matching the usual fftshift convention
/// for both even and odd dimensions.
pub fn fftshift<T: Clone>(input: &Array2<T>) -> Array2<T> {
    let (rows, cols) = input.dim();
    let row_shift = rows / 2;
    let col_shift = cols / 2;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        input[[(r + rows - row_shift) % rows, (c + cols - col_shift) % cols]].clone()
    })
}

/// Element-wise magnitude of a complex spectrum.
pub fn magnitude<F: CleanFloat>(input: &Array2<Complex<F>>) -> Array2<F> {
    input.mapv(|v| v.norm())
}

//! Rank-reduced image reconstruction from window factorizations.
//!
//! Given the persisted window set of an image and an externally computed
//! factorization `windows ~ U * diag(S) * V`, rebuilds the image from a
//! chosen subset of components by overlap-add averaging. `diag(S)` is folded
//! into `V` once up front, so the two factorization provenances reconstruct
//! bit-identically and batching only ever touches rows of `U`.

use log::{debug, info};
use ndarray::{s, Array1, Array2, Array3, ArrayView2};
use rustfft::num_complex::Complex;

use crate::batch::{batches, compute_batch_size, BatchPolicy, MemoryBudget};
use crate::error::CleanError;
use crate::float_trait::CleanFloat;
use crate::selector::ComponentSpec;
use crate::store::WindowSet;
use crate::transforms::fft2d;

/// Provenance of a factorization. Carried as metadata only; both kinds
/// reconstruct identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorizationKind {
    /// Computed in one pass over the full window matrix.
    Direct,
    /// Accumulated incrementally over window batches.
    IncrementalBatched,
}

/// An externally computed `U * diag(S) * V` factorization of a window set.
#[derive(Debug, Clone)]
pub struct DecompositionFactors<F: CleanFloat> {
    /// Per-window component scores, `n_windows` x `k`.
    pub u: Array2<F>,
    /// Component weights, length `k`.
    pub s: Array1<F>,
    /// Component patterns, `k` x `win_pixels`.
    pub v: Array2<F>,
    /// How the factorization was produced.
    pub kind: FactorizationKind,
}

impl<F: CleanFloat> DecompositionFactors<F> {
    /// Number of components.
    pub fn k(&self) -> usize {
        self.s.len()
    }

    /// Check the row/column contracts between the three factors.
    pub fn validate(&self) -> Result<(), CleanError> {
        let k = self.s.len();
        if self.u.ncols() != k {
            return Err(CleanError::ShapeMismatch {
                expected: (self.u.nrows(), k),
                actual: self.u.dim(),
            });
        }
        if self.v.nrows() != k {
            return Err(CleanError::ShapeMismatch {
                expected: (k, self.v.ncols()),
                actual: self.v.dim(),
            });
        }
        Ok(())
    }
}

/// Result of [`reconstruct`]: the averaged image, what was removed, and the
/// spectra of both.
#[derive(Debug, Clone)]
pub struct ReconstructionOutput<F: CleanFloat> {
    /// Overlap-add average of the retained components.
    pub cleaned: Array2<F>,
    /// `image - cleaned`.
    pub residual: Array2<F>,
    /// 2D FFT of `cleaned`.
    pub fft_cleaned: Array2<Complex<F>>,
    /// 2D FFT of `residual`.
    pub fft_residual: Array2<Complex<F>>,
}

/// Result of [`reconstruct_by_component`]: one reconstructed image per
/// retained component, stacked along the trailing axis.
#[derive(Debug, Clone)]
pub struct PerComponentImage<F: CleanFloat> {
    /// `image_w` x `image_h` x `k'` stack, in `components` order.
    pub data: Array3<F>,
    /// Original component indices, ascending.
    pub components: Vec<usize>,
}

/// Pre-flight checks shared by both reconstruction paths. Returns the
/// resolved component indices; nothing is allocated or read from the store
/// until these pass.
fn check_inputs<F: CleanFloat>(
    set: &WindowSet,
    image: &ArrayView2<F>,
    factors: &DecompositionFactors<F>,
    spec: &ComponentSpec,
) -> Result<Vec<usize>, CleanError> {
    factors.validate()?;

    let expected_image = (set.geometry.image_w, set.geometry.image_h);
    if image.dim() != expected_image {
        return Err(CleanError::ShapeMismatch {
            expected: expected_image,
            actual: image.dim(),
        });
    }
    if factors.u.nrows() != set.n_windows() {
        return Err(CleanError::ShapeMismatch {
            expected: (set.n_windows(), factors.k()),
            actual: factors.u.dim(),
        });
    }
    if factors.v.ncols() != set.geometry.win_pixels() {
        return Err(CleanError::ShapeMismatch {
            expected: (factors.k(), set.geometry.win_pixels()),
            actual: factors.v.dim(),
        });
    }

    let selection = spec.resolve(factors.k())?;
    Ok(selection.indices())
}

/// `diag(s[sel]) * v[sel, :]` as a dense `k'` x `win_pixels` matrix.
fn weighted_patterns<F: CleanFloat>(
    factors: &DecompositionFactors<F>,
    indices: &[usize],
) -> Array2<F> {
    let p = factors.v.ncols();
    let mut w = Array2::<F>::zeros((indices.len(), p));
    for (row, &idx) in indices.iter().enumerate() {
        let scale = factors.s[idx];
        for (dst, &src) in w.row_mut(row).iter_mut().zip(factors.v.row(idx).iter()) {
            *dst = scale * src;
        }
    }
    w
}

/// The columns of `u` named by `indices`, restricted to window rows `rows`.
fn gather_scores<F: CleanFloat>(
    u: &Array2<F>,
    rows: std::ops::Range<usize>,
    indices: &[usize],
) -> Array2<F> {
    Array2::from_shape_fn((rows.len(), indices.len()), |(i, j)| {
        u[[rows.start + i, indices[j]]]
    })
}

/// Divide the accumulated sum by per-pixel coverage; uncovered pixels
/// become zero, never NaN.
fn normalize_coverage<F: CleanFloat>(sum: &mut Array2<F>, count: &Array2<F>) {
    for (v, &n) in sum.iter_mut().zip(count.iter()) {
        if n > F::zero() {
            *v /= n;
        } else {
            *v = F::zero();
        }
    }
}

/// Rebuild the image from the selected components of `factors`.
///
/// Windows are regenerated batch by batch as `u[batch, sel] * diag(s) * v`
/// and overlap-added at the position table persisted with the window set,
/// then divided by per-pixel coverage. The result is deterministic and
/// independent of where batch boundaries fall.
pub fn reconstruct<F: CleanFloat>(
    set: &WindowSet,
    image: ArrayView2<F>,
    factors: &DecompositionFactors<F>,
    spec: &ComponentSpec,
    budget: MemoryBudget,
) -> Result<ReconstructionOutput<F>, CleanError> {
    let indices = check_inputs(set, &image, factors, spec)?;

    let geo = &set.geometry;
    let (win_w, win_h) = (geo.win_w, geo.win_h);
    let n_windows = set.n_windows();
    let p = geo.win_pixels();
    info!(
        "rebuilding {}x{} image from {} of {} components",
        geo.image_w,
        geo.image_h,
        indices.len(),
        factors.k()
    );

    let w = weighted_patterns(factors, &indices);

    let item_bytes = std::mem::size_of::<F>();
    let available = budget
        .effective()
        .saturating_sub(w.len() * item_bytes);
    let batch_size = compute_batch_size(available, p * item_bytes, BatchPolicy::FloorToOne)?;

    let mut sum = Array2::<F>::zeros((geo.image_w, geo.image_h));
    let mut count = Array2::<F>::zeros((geo.image_w, geo.image_h));

    for range in batches(n_windows, batch_size) {
        let scores = gather_scores(&factors.u, range.clone(), &indices);
        let block = scores.dot(&w);
        for (i, win) in range.clone().enumerate() {
            let (x, y) = set.positions[win];
            let mut sum_patch = sum.slice_mut(s![x..x + win_w, y..y + win_h]);
            let mut count_patch = count.slice_mut(s![x..x + win_w, y..y + win_h]);
            for ((dst, n), &src) in sum_patch
                .iter_mut()
                .zip(count_patch.iter_mut())
                .zip(block.row(i).iter())
            {
                *dst += src;
                *n += F::one();
            }
        }
        debug!(
            "rebuilding image... {}%",
            (100 * range.end) / n_windows.max(1)
        );
    }

    normalize_coverage(&mut sum, &count);
    let cleaned = sum;
    let residual = image.to_owned() - &cleaned;
    let fft_cleaned = fft2d(cleaned.view());
    let fft_residual = fft2d(residual.view());

    Ok(ReconstructionOutput {
        cleaned,
        residual,
        fft_cleaned,
        fft_residual,
    })
}

/// Rebuild one image per selected component.
///
/// The accumulator is a full `image_w` x `image_h` x `k'` stack, so this
/// path refuses to run rather than thrash when even a one-window batch does
/// not fit the budget.
pub fn reconstruct_by_component<F: CleanFloat>(
    set: &WindowSet,
    image: ArrayView2<F>,
    factors: &DecompositionFactors<F>,
    spec: &ComponentSpec,
    budget: MemoryBudget,
) -> Result<PerComponentImage<F>, CleanError> {
    let indices = check_inputs(set, &image, factors, spec)?;

    let geo = &set.geometry;
    let (win_w, win_h) = (geo.win_w, geo.win_h);
    let n_windows = set.n_windows();
    let p = geo.win_pixels();
    let kp = indices.len();
    info!(
        "rebuilding {} per-component {}x{} images",
        kp, geo.image_w, geo.image_h
    );

    let item_bytes = std::mem::size_of::<F>();
    let stack_bytes = geo.image_w * geo.image_h * kp * item_bytes;
    let available = budget.effective().saturating_sub(stack_bytes);
    let per_item = (kp + kp * p) * item_bytes;
    let batch_size = compute_batch_size(available, per_item, BatchPolicy::Fail)?;

    let mut sum = Array3::<F>::zeros((geo.image_w, geo.image_h, kp));
    let mut count = Array2::<F>::zeros((geo.image_w, geo.image_h));

    for range in batches(n_windows, batch_size) {
        // Materialize the batch's unreduced window contributions, one P-long
        // row per (window, component) pair; this block is the working set
        // the batch size was computed for.
        let scores = gather_scores(&factors.u, range.clone(), &indices);
        let mut block = Array3::<F>::zeros((range.len(), kp, p));
        for i in 0..range.len() {
            for (j, &idx) in indices.iter().enumerate() {
                let coef = scores[[i, j]] * factors.s[idx];
                for (dst, &src) in block
                    .slice_mut(s![i, j, ..])
                    .iter_mut()
                    .zip(factors.v.row(idx).iter())
                {
                    *dst = coef * src;
                }
            }
        }

        for (i, win) in range.clone().enumerate() {
            let (x, y) = set.positions[win];
            for j in 0..kp {
                let mut patch = sum.slice_mut(s![x..x + win_w, y..y + win_h, j]);
                for (dst, &src) in patch.iter_mut().zip(block.slice(s![i, j, ..]).iter()) {
                    *dst += src;
                }
            }
            let mut count_patch = count.slice_mut(s![x..x + win_w, y..y + win_h]);
            for n in count_patch.iter_mut() {
                *n += F::one();
            }
        }
        debug!(
            "rebuilding component stack... {}%",
            (100 * range.end) / n_windows.max(1)
        );
    }

    for j in 0..kp {
        let mut plane = sum.slice_mut(s![.., .., j]);
        for (v, &n) in plane.iter_mut().zip(count.iter()) {
            if n > F::zero() {
                *v /= n;
            } else {
                *v = F::zero();
            }
        }
    }

    Ok(PerComponentImage {
        data: sum,
        components: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_windows, ExtractOptions};
    use crate::store::{MemoryStore, WindowStore};
    use ndarray::{arr1, Array2};

    // Deterministic LCG so the tests carry no external RNG dependency.
    struct SimpleLcg {
        state: u64,
    }

    impl SimpleLcg {
        fn new(seed: u64) -> Self {
            Self { state: seed }
        }

        fn next_f64(&mut self) -> f64 {
            self.state = self
                .state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.state >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn options(win: usize, step: usize) -> ExtractOptions {
        ExtractOptions {
            win_w: Some(win),
            win_h: Some(win),
            step_w: step,
            step_h: step,
            ..ExtractOptions::new()
        }
    }

    fn big_budget() -> MemoryBudget {
        MemoryBudget::new(1 << 26)
    }

    /// Exact rank-1 factorization of a window matrix where every window is
    /// identical: u is a constant column, v the shared window.
    fn rank1_factors(
        n_windows: usize,
        window: &[f64],
        kind: FactorizationKind,
    ) -> DecompositionFactors<f64> {
        DecompositionFactors {
            u: Array2::from_elem((n_windows, 1), 0.5),
            s: arr1(&[2.0]),
            v: Array2::from_shape_vec((1, window.len()), window.to_vec()).unwrap(),
            kind,
        }
    }

    fn random_factors(n_windows: usize, k: usize, p: usize, seed: u64) -> DecompositionFactors<f64> {
        let mut rng = SimpleLcg::new(seed);
        DecompositionFactors {
            u: Array2::from_shape_fn((n_windows, k), |_| rng.next_f64() - 0.5),
            s: ndarray::Array1::from_shape_fn(k, |i| 1.0 / (i + 1) as f64),
            v: Array2::from_shape_fn((k, p), |_| rng.next_f64() - 0.5),
            kind: FactorizationKind::Direct,
        }
    }

    #[test]
    fn test_all_ones_worked_example() {
        // 8x8 image of ones with 4x4 windows: full coverage, and a perfect
        // rank-1 factorization of a constant window, so the average must
        // return the image exactly and a zero residual.
        let image = Array2::<f64>::from_elem((8, 8), 1.0);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 4), big_budget())
            .unwrap();

        let factors = rank1_factors(set.n_windows(), &[1.0; 16], FactorizationKind::Direct);
        let out = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap();

        assert!(out.cleaned.iter().all(|&v| approx_eq(v, 1.0, 1e-12)));
        assert!(out.residual.iter().all(|&v| approx_eq(v, 0.0, 1e-12)));
        // DC bin of an all-ones 8x8 image is 64.
        assert!(approx_eq(out.fft_cleaned[[0, 0]].re, 64.0, 1e-9));
        assert!(approx_eq(out.fft_residual[[0, 0]].norm(), 0.0, 1e-9));
    }

    #[test]
    fn test_overlap_average_roundtrip() {
        // Overlapping windows of a smooth ramp: a perfect factorization of
        // the true window matrix must average back to the exact image.
        let image = Array2::from_shape_fn((12, 10), |(x, y)| (x as f64) * 0.3 + (y as f64) * 0.7);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 2), big_budget())
            .unwrap();

        // Rank-N "factorization": u = window matrix itself, s = ones,
        // v = identity. Reconstruction then replays the windows verbatim.
        let windows = store.read_windows("w", 0..set.n_windows()).unwrap();
        let p = set.geometry.win_pixels();
        let factors = DecompositionFactors {
            u: windows,
            s: ndarray::Array1::from_elem(p, 1.0),
            v: Array2::from_shape_fn((p, p), |(i, j)| if i == j { 1.0 } else { 0.0 }),
            kind: FactorizationKind::Direct,
        };

        let out = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap();

        for ((x, y), &v) in image.indexed_iter() {
            assert!(
                approx_eq(v, out.cleaned[[x, y]], 1e-9),
                "pixel ({}, {}): {} vs {}",
                x,
                y,
                v,
                out.cleaned[[x, y]]
            );
        }
    }

    #[test]
    fn test_uncovered_border_is_zero() {
        // 11x11 image, 4x4 windows at step 2: origins 0,2,4,6 cover pixels
        // [0, 10) per axis, so the last row and column are never touched.
        let image = Array2::<f64>::from_elem((11, 11), 5.0);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 2), big_budget())
            .unwrap();
        let factors = rank1_factors(set.n_windows(), &[5.0; 16], FactorizationKind::Direct);
        let out = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            MemoryBudget::new(1 << 20),
        )
        .unwrap();

        for i in 0..10 {
            assert!(approx_eq(out.cleaned[[i, 5]], 5.0, 1e-12));
            assert_eq!(out.cleaned[[10, i]], 0.0);
            assert_eq!(out.cleaned[[i, 10]], 0.0);
        }
        // Residual at uncovered pixels is the raw image value.
        assert!(approx_eq(out.residual[[10, 10]], 5.0, 1e-12));
    }

    #[test]
    fn test_batch_invariance() {
        let image = Array2::from_shape_fn((16, 16), |(x, y)| ((x * 31 + y * 7) % 13) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 2), big_budget())
            .unwrap();
        let n = set.n_windows();
        let p = set.geometry.win_pixels();
        let factors = random_factors(n, 5, p, 42);

        let item = std::mem::size_of::<f64>();
        let w_bytes = 5 * p * item;
        // Budgets sized to force batches of exactly 1, 7, and all windows.
        let runs: Vec<_> = [1usize, 7, n]
            .iter()
            .map(|&b| {
                reconstruct(
                    &set,
                    image.view(),
                    &factors,
                    &ComponentSpec::All,
                    MemoryBudget::new(w_bytes + b * p * item),
                )
                .unwrap()
            })
            .collect();

        for run in &runs[1..] {
            for (a, b) in runs[0].cleaned.iter().zip(run.cleaned.iter()) {
                assert!(approx_eq(*a, *b, 1e-12));
            }
            for (a, b) in runs[0].residual.iter().zip(run.residual.iter()) {
                assert!(approx_eq(*a, *b, 1e-12));
            }
        }
    }

    #[test]
    fn test_deterministic_across_calls() {
        let image = Array2::from_shape_fn((10, 10), |(x, y)| (x + 2 * y) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 3), big_budget())
            .unwrap();
        let factors = random_factors(set.n_windows(), 3, set.geometry.win_pixels(), 7);

        let a = reconstruct(&set, image.view(), &factors, &ComponentSpec::All, big_budget())
            .unwrap();
        let b = reconstruct(&set, image.view(), &factors, &ComponentSpec::All, big_budget())
            .unwrap();
        assert_eq!(a.cleaned, b.cleaned);
    }

    #[test]
    fn test_slice_and_indices_selections_agree() {
        let image = Array2::from_shape_fn((12, 12), |(x, y)| ((x * y) % 5) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 4), big_budget())
            .unwrap();
        let factors = random_factors(set.n_windows(), 6, set.geometry.win_pixels(), 3);

        let by_range = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::Range(1, 4),
            big_budget(),
        )
        .unwrap();
        let by_indices = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::Indices(vec![3, 1, 2]),
            big_budget(),
        )
        .unwrap();
        assert_eq!(by_range.cleaned, by_indices.cleaned);
    }

    #[test]
    fn test_direct_and_incremental_agree() {
        let image = Array2::from_shape_fn((12, 12), |(x, y)| (x ^ y) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 2), big_budget())
            .unwrap();
        let mut factors = random_factors(set.n_windows(), 4, set.geometry.win_pixels(), 11);

        let direct = reconstruct(&set, image.view(), &factors, &ComponentSpec::All, big_budget())
            .unwrap();
        factors.kind = FactorizationKind::IncrementalBatched;
        let incremental =
            reconstruct(&set, image.view(), &factors, &ComponentSpec::All, big_budget())
                .unwrap();
        assert_eq!(direct.cleaned, incremental.cleaned);
    }

    #[test]
    fn test_shape_mismatch_rejected_before_work() {
        let image = Array2::<f64>::from_elem((8, 8), 1.0);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 4), big_budget())
            .unwrap();
        let factors = rank1_factors(set.n_windows(), &[1.0; 16], FactorizationKind::Direct);

        let wrong = Array2::<f64>::from_elem((8, 9), 1.0);
        let err = reconstruct(
            &set,
            wrong.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap_err();
        assert!(matches!(err, CleanError::ShapeMismatch { .. }));

        let bad_u = rank1_factors(3, &[1.0; 16], FactorizationKind::Direct);
        let err = reconstruct(
            &set,
            image.view(),
            &bad_u,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap_err();
        assert!(matches!(err, CleanError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_per_component_stack_matches_sum() {
        let image = Array2::from_shape_fn((12, 12), |(x, y)| ((x * 3 + y) % 7) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 2), big_budget())
            .unwrap();
        let factors = random_factors(set.n_windows(), 3, set.geometry.win_pixels(), 19);

        let combined = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap();
        let stack = reconstruct_by_component(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap();

        assert_eq!(stack.components, vec![0, 1, 2]);
        assert_eq!(stack.data.dim(), (12, 12, 3));
        // Summing the stack over components reproduces the combined image.
        for ((x, y), &v) in combined.cleaned.indexed_iter() {
            let total: f64 = (0..3).map(|j| stack.data[[x, y, j]]).sum();
            assert!(approx_eq(v, total, 1e-9), "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_per_component_batch_invariance() {
        let image = Array2::from_shape_fn((12, 12), |(x, y)| ((x * 5 + y * 3) % 11) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 2), big_budget())
            .unwrap();
        let p = set.geometry.win_pixels();
        let factors = random_factors(set.n_windows(), 3, p, 23);

        // Budget sized for the accumulator stack plus exactly one window's
        // per-component block, forcing single-window batches.
        let item = std::mem::size_of::<f64>();
        let tight = MemoryBudget::new(12 * 12 * 3 * item + (3 + 3 * p) * item);
        let batched = reconstruct_by_component(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            tight,
        )
        .unwrap();
        let whole = reconstruct_by_component(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap();

        assert_eq!(batched.components, whole.components);
        assert_eq!(batched.data, whole.data);
    }

    #[test]
    fn test_per_component_strict_memory_policy() {
        let image = Array2::<f64>::from_elem((8, 8), 1.0);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(4, 4), big_budget())
            .unwrap();
        let factors = rank1_factors(set.n_windows(), &[1.0; 16], FactorizationKind::Direct);

        let tiny = MemoryBudget::new(64);
        let err = reconstruct_by_component(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            tiny,
        )
        .unwrap_err();
        assert!(matches!(err, CleanError::InsufficientMemory { .. }));

        // The combined path floors to one-window batches under the same
        // budget instead of refusing.
        assert!(reconstruct(&set, image.view(), &factors, &ComponentSpec::All, tiny).is_ok());
    }

    #[test]
    fn test_single_window_covers_whole_image() {
        let image = Array2::from_shape_fn((6, 6), |(x, y)| (x * 6 + y) as f64);
        let mut store = MemoryStore::<f64>::new();
        let set = extract_windows(image.view(), &mut store, "w", &options(6, 3), big_budget())
            .unwrap();
        assert_eq!(set.n_windows(), 1);

        let window: Vec<f64> = image.iter().copied().collect();
        let mut factors = rank1_factors(1, &window, FactorizationKind::Direct);
        factors.u = Array2::from_elem((1, 1), 1.0);
        factors.s = arr1(&[1.0]);

        let out = reconstruct(
            &set,
            image.view(),
            &factors,
            &ComponentSpec::All,
            big_budget(),
        )
        .unwrap();
        for ((x, y), &v) in image.indexed_iter() {
            assert!(approx_eq(v, out.cleaned[[x, y]], 1e-12));
        }
    }
}

//! Normalization of power spectra before dimensionality reduction.
//!
//! Power spectra span many orders of magnitude, they are first weighted by `k^2`
//! (flattening the large scales vs small scales dynamic range), then log transformed.
//! The result is centered by a single global mean and scaled by the standard
//! deviation of each column (i.e. each `(z, k)` bin).
use crate::errors::{EmulatorError, Result};

use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};

/// Frozen normalization constants of a set of power spectra.
///
/// Spectra are given as rows of length `n_redshifts * n_wavenumbers`, ordered by
/// redshift block then wavenumber within block.
#[derive(Debug, Clone)]
pub struct SpectrumNormalizer<F: Float> {
    /// `k^2` tiled over redshift blocks, (n_redshifts * n_wavenumbers,)
    k2: Array1<F>,
    /// Number of redshift blocks
    n_redshifts: usize,
    /// Global mean of `ln(k^2 P)`
    mean: F,
    /// Per-column population standard deviation of `ln(k^2 P)`
    std: Array1<F>,
}

impl<F: Float> SpectrumNormalizer<F> {
    /// Compute normalization constants from training `power_spectra` (n, n_redshifts * nk)
    /// given wavenumbers `k` (nk,) and return them with the normalized spectra.
    ///
    /// # Errors
    ///
    /// * [EmulatorError::InvalidShape] when the spectra length is not `n_redshifts * nk`
    /// * [EmulatorError::NumericalError] when a weighted value `k^2 P` is not strictly
    ///   positive and finite, as its log is undefined
    pub fn fit_transform(
        power_spectra: &ArrayBase<impl Data<Elem = F>, Ix2>,
        k: &ArrayBase<impl Data<Elem = F>, Ix1>,
        n_redshifts: usize,
    ) -> Result<(Self, Array2<F>)> {
        let n_features = k.len() * n_redshifts;
        if n_features == 0 || power_spectra.ncols() != n_features {
            return Err(EmulatorError::InvalidShape(format!(
                "power spectra should have {} x {} = {} columns, got {}",
                n_redshifts,
                k.len(),
                n_features,
                power_spectra.ncols()
            )));
        }
        if power_spectra.nrows() == 0 {
            return Err(EmulatorError::InvalidShape(
                "at least one power spectrum is required".to_string(),
            ));
        }

        let k2 = tile_k2(k, n_redshifts);
        let lnk2p = log_weighted(power_spectra, &k2)?;
        let mean = lnk2p.mean().ok_or_else(|| {
            EmulatorError::InvalidShape("cannot normalize empty power spectra".to_string())
        })?;
        let mut std = lnk2p.std_axis(Axis(0), F::zero());
        std.mapv_inplace(|v| if v == F::zero() { F::one() } else { v });

        let normalizer = SpectrumNormalizer {
            k2,
            n_redshifts,
            mean,
            std,
        };
        let normalized = normalizer.normalize_log(lnk2p);
        Ok((normalizer, normalized))
    }

    /// Normalize `power_spectra` (n, n_features) with the frozen constants
    pub fn transform(&self, power_spectra: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_features(power_spectra.ncols())?;
        let lnk2p = log_weighted(power_spectra, &self.k2)?;
        Ok(self.normalize_log(lnk2p))
    }

    /// Recover power spectra from normalized ones (n, n_features):
    /// `P = exp(normalized * std + mean) / k^2`
    pub fn inverse_transform(
        &self,
        normalized: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        self.check_features(normalized.ncols())?;
        let mut spectra = normalized.to_owned();
        Zip::from(spectra.columns_mut())
            .and(&self.std)
            .and(&self.k2)
            .for_each(|mut col, &std, &k2| {
                col.mapv_inplace(|v| (v * std + self.mean).exp() / k2);
            });
        Ok(spectra)
    }

    /// Map normalized spectra (n, n_features) and their standard deviations in the
    /// normalized space to central power spectra and a `n_sigma` band.
    ///
    /// As the normalized space is the log of the spectra up to an affine map,
    /// the band is log-normal: `[P exp(-n_sigma std sd), P exp(n_sigma std sd)]`.
    /// Returns (central, lower, upper) spectra.
    pub fn log_std_to_bounds(
        &self,
        normalized: &ArrayBase<impl Data<Elem = F>, Ix2>,
        normalized_std: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_sigma: F,
    ) -> Result<(Array2<F>, Array2<F>, Array2<F>)> {
        if normalized.dim() != normalized_std.dim() {
            return Err(EmulatorError::InvalidShape(format!(
                "normalized spectra {:?} and standard deviations {:?} shapes mismatch",
                normalized.dim(),
                normalized_std.dim()
            )));
        }
        let center = self.inverse_transform(normalized)?;
        let log_sd = normalized_std * &self.std;
        let lower = &center * &log_sd.mapv(|v| (-n_sigma * v).exp());
        let upper = &center * &log_sd.mapv(|v| (n_sigma * v).exp());
        Ok((center, lower, upper))
    }

    /// Global mean of the log weighted spectra
    pub fn mean(&self) -> F {
        self.mean
    }

    /// Per-column standard deviation of the log weighted spectra
    pub fn std(&self) -> &Array1<F> {
        &self.std
    }

    /// `k^2` weights tiled over redshift blocks
    pub fn k2_weights(&self) -> &Array1<F> {
        &self.k2
    }

    /// Number of redshift blocks
    pub fn n_redshifts(&self) -> usize {
        self.n_redshifts
    }

    /// Length of a spectrum
    pub fn n_features(&self) -> usize {
        self.k2.len()
    }

    fn check_features(&self, ncols: usize) -> Result<()> {
        if ncols != self.n_features() {
            return Err(EmulatorError::InvalidShape(format!(
                "expected spectra of length {}, got {}",
                self.n_features(),
                ncols
            )));
        }
        Ok(())
    }

    fn normalize_log(&self, mut lnk2p: Array2<F>) -> Array2<F> {
        Zip::from(lnk2p.columns_mut())
            .and(&self.std)
            .for_each(|mut col, &std| col.mapv_inplace(|v| (v - self.mean) / std));
        lnk2p
    }
}

fn tile_k2<F: Float>(k: &ArrayBase<impl Data<Elem = F>, Ix1>, n_redshifts: usize) -> Array1<F> {
    let k2 = k.mapv(|v| v * v);
    Array1::from_iter((0..n_redshifts).flat_map(|_| k2.iter().copied()))
}

/// `ln(k^2 P)` elementwise, failing on the first value which has no real log
fn log_weighted<F: Float>(
    power_spectra: &ArrayBase<impl Data<Elem = F>, Ix2>,
    k2: &Array1<F>,
) -> Result<Array2<F>> {
    let mut lnk2p = power_spectra * k2;
    if let Some(((i, j), v)) = lnk2p
        .indexed_iter()
        .find(|(_, v)| !(v.is_finite() && **v > F::zero()))
    {
        return Err(EmulatorError::NumericalError(format!(
            "k^2 P = {v} at sample {i}, column {j}: power spectra weighted by k^2 should be strictly positive and finite"
        )));
    }
    lnk2p.mapv_inplace(|v| v.ln());
    Ok(lnk2p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn test_fit_transform() {
        let k = array![1., 2.];
        // one redshift block
        let ps = array![[1., 1.], [std::f64::consts::E, 0.25 * std::f64::consts::E.powi(3)]];
        let (normalizer, normalized) = SpectrumNormalizer::fit_transform(&ps, &k, 1).unwrap();
        // ln(k^2 P) = [[0, ln 4], [1, 3]]
        let lnk2p = array![[0., 4f64.ln()], [1., 3.]];
        let mean = lnk2p.mean().unwrap();
        assert_abs_diff_eq!(normalizer.mean(), mean, epsilon = 1e-12);
        let std = array![0.5, (3. - 4f64.ln()) / 2.];
        assert_abs_diff_eq!(normalizer.std(), &std, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized, (lnk2p - mean) / &std, epsilon = 1e-12);
    }

    #[test]
    fn test_k2_tiling() {
        let k = array![1., 2., 3.];
        let ps = Array2::from_elem((2, 6), 1.);
        let (normalizer, _) = SpectrumNormalizer::fit_transform(&ps, &k, 2).unwrap();
        assert_eq!(normalizer.k2_weights(), &array![1., 4., 9., 1., 4., 9.]);
        assert_eq!(normalizer.n_redshifts(), 2);
        assert_eq!(normalizer.n_features(), 6);
    }

    #[test]
    fn test_round_trip() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let k = Array1::logspace(10., -3., 1., 20);
        let ps = Array2::random_using((7, 3 * 20), Uniform::new(1e-2, 1e4), &mut rng);
        let (normalizer, normalized) = SpectrumNormalizer::fit_transform(&ps, &k, 3).unwrap();
        let recovered = normalizer.inverse_transform(&normalized).unwrap();
        Zip::from(&recovered).and(&ps).for_each(|r, p| {
            assert_abs_diff_eq!(r / p, 1., epsilon = 1e-10);
        });
        let transformed = normalizer.transform(&ps).unwrap();
        assert_abs_diff_eq!(transformed, normalized, epsilon = 1e-12);
    }

    #[test]
    fn test_single_sample() {
        let k = array![0.1, 1.];
        let ps = array![[10., 2.]];
        let (normalizer, normalized) = SpectrumNormalizer::fit_transform(&ps, &k, 1).unwrap();
        assert_abs_diff_eq!(normalizer.std(), &array![1., 1.]);
        assert!(normalized.iter().all(|v: &f64| v.is_finite()));
        let recovered = normalizer.inverse_transform(&normalized).unwrap();
        assert_abs_diff_eq!(recovered, ps, epsilon = 1e-10);
    }

    #[test]
    fn test_non_positive_spectra() {
        let k = array![1., 2.];
        let ps = array![[1., 2.], [3., 0.]];
        match SpectrumNormalizer::fit_transform(&ps, &k, 1) {
            Err(EmulatorError::NumericalError(msg)) => {
                assert!(msg.contains("sample 1, column 1"))
            }
            other => panic!("expected numerical error, got {other:?}"),
        }
        let ps = array![[1., -2.]];
        assert!(matches!(
            SpectrumNormalizer::fit_transform(&ps, &k, 1),
            Err(EmulatorError::NumericalError(_))
        ));
        let ps = array![[1., f64::NAN]];
        assert!(matches!(
            SpectrumNormalizer::fit_transform(&ps, &k, 1),
            Err(EmulatorError::NumericalError(_))
        ));
    }

    #[test]
    fn test_bad_shapes() {
        let k = array![1., 2.];
        let ps = array![[1., 2., 3.]];
        assert!(matches!(
            SpectrumNormalizer::fit_transform(&ps, &k, 2),
            Err(EmulatorError::InvalidShape(_))
        ));
        let (normalizer, _) = SpectrumNormalizer::fit_transform(&array![[1., 2.]], &k, 1).unwrap();
        assert!(matches!(
            normalizer.inverse_transform(&array![[1., 2., 3.]]),
            Err(EmulatorError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let k = array![1., 2.];
        let ps = array![[1., 3.], [2., 1.]];
        let (normalizer, normalized) = SpectrumNormalizer::fit_transform(&ps, &k, 1).unwrap();
        let zero_sd = Array2::zeros(normalized.dim());
        let (center, lower, upper) = normalizer
            .log_std_to_bounds(&normalized, &zero_sd, 2.)
            .unwrap();
        assert_abs_diff_eq!(center, ps, epsilon = 1e-10);
        assert_abs_diff_eq!(lower, ps, epsilon = 1e-10);
        assert_abs_diff_eq!(upper, ps, epsilon = 1e-10);

        let sd = Array2::from_elem(normalized.dim(), 0.1);
        let (center, lower, upper) = normalizer.log_std_to_bounds(&normalized, &sd, 1.).unwrap();
        Zip::from(&center).and(&lower).and(&upper).for_each(|c: &f64, l: &f64, u: &f64| {
            assert!(l < c && c < u);
            // log-normal band is symmetric in log space
            assert_abs_diff_eq!((u / c).ln(), (c / l).ln(), epsilon = 1e-12);
        });
    }
}

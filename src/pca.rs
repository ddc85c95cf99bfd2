//! Principal component analysis of normalized spectra.
use crate::errors::{EmulatorError, Result};

use linfa::Float;
use linfa_linalg::svd::*;
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};

/// Principal components of a (n_samples, n_features) matrix `X` computed from its thin SVD
/// `X = U S V^T`, keeping the `n_components` leading singular values.
///
/// The basis rows are `phi_j = s_j v_j / sqrt(n_samples)` and the weights of the training
/// samples are `w_j = sqrt(n_samples) u_j`, hence `X ~ W^T Phi` and the weights have a
/// unit mean square over the training samples.
#[derive(Debug, Clone)]
pub struct PrincipalComponents<F: Float> {
    /// Retained basis, (n_components, n_features)
    basis: Array2<F>,
    /// Weights of the training samples, (n_components, n_samples)
    weights: Array2<F>,
    /// All singular values in descending order
    singular_values: Array1<F>,
}

impl<F: Float> PrincipalComponents<F> {
    /// Compute the `n_components` leading principal components of `normalized` (n_samples, n_features)
    ///
    /// # Errors
    ///
    /// [EmulatorError::InvalidConfiguration] when `n_components` is zero or greater than
    /// `min(n_samples, n_features)`, checked before any decomposition.
    pub fn fit(
        normalized: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_components: usize,
    ) -> Result<Self> {
        let (n_samples, n_features) = normalized.dim();
        let max_components = n_samples.min(n_features);
        if n_components == 0 || n_components > max_components {
            return Err(EmulatorError::InvalidConfiguration(format!(
                "number of components should be in [1, {max_components}] for {n_samples} samples of {n_features} features, got {n_components}"
            )));
        }

        let (u, sv, vt) = sorted_thin_svd(normalized)?;

        let sqrt_n = F::cast(n_samples).sqrt();
        let lead = sv.slice(s![..n_components]);
        let basis = &vt.slice(s![..n_components, ..]) * &lead.insert_axis(Axis(1)) / sqrt_n;
        let weights = u.slice(s![.., ..n_components]).t().mapv(|v| v * sqrt_n);

        Ok(PrincipalComponents {
            basis,
            weights,
            singular_values: sv,
        })
    }

    /// Number of retained components
    pub fn n_components(&self) -> usize {
        self.basis.nrows()
    }

    /// Retained basis, (n_components, n_features)
    pub fn basis(&self) -> &Array2<F> {
        &self.basis
    }

    /// Weights of the training samples, (n_components, n_samples)
    pub fn weights(&self) -> &Array2<F> {
        &self.weights
    }

    /// Singular values of the decomposed matrix in descending order
    pub fn singular_values(&self) -> &Array1<F> {
        &self.singular_values
    }

    /// Variance of the training data along each retained component, `s_j^2 / n_samples`
    pub fn explained_variance(&self) -> Array1<F> {
        let n_samples = F::cast(self.weights.ncols());
        self.singular_values
            .slice(s![..self.n_components()])
            .mapv(|v| v * v / n_samples)
    }

    /// Fraction of the total variance carried by each retained component
    pub fn explained_variance_ratio(&self) -> Array1<F> {
        let total = self.singular_values.mapv(|v| v * v).sum();
        if total == F::zero() {
            return Array1::zeros(self.n_components());
        }
        self.singular_values
            .slice(s![..self.n_components()])
            .mapv(|v| v * v / total)
    }

    /// Linear combination of the basis given weights (n, n_components), returns (n, n_features)
    pub fn reconstruct(&self, weights: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        if weights.ncols() != self.n_components() {
            return Err(EmulatorError::InvalidShape(format!(
                "expected weights for {} components, got {}",
                self.n_components(),
                weights.ncols()
            )));
        }
        Ok(weights.dot(&self.basis))
    }

    /// Least squares weights (n, n_components) of normalized data (n, n_features) on the basis
    pub fn project(&self, normalized: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        if normalized.ncols() != self.basis.ncols() {
            return Err(EmulatorError::InvalidShape(format!(
                "expected data with {} features, got {}",
                self.basis.ncols(),
                normalized.ncols()
            )));
        }
        // Basis rows are orthogonal
        let norms2 = self.basis.map_axis(Axis(1), |row| row.dot(&row));
        let mut proj = normalized.dot(&self.basis.t());
        for (mut col, &n2) in proj.columns_mut().into_iter().zip(norms2.iter()) {
            if n2 > F::zero() {
                col.mapv_inplace(|v| v / n2);
            } else {
                col.fill(F::zero());
            }
        }
        Ok(proj)
    }
}

/// Thin SVD `x = u diag(s) vt` with u (n, r), s (r,) and vt (r, m) where r = min(n, m),
/// singular values being sorted in descending order.
fn sorted_thin_svd<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<(Array2<F>, Array1<F>, Array2<F>)> {
    let (u, sv, vt) = if x.nrows() >= x.ncols() {
        let (u, sv, vt) = x.svd(true, true)?;
        (u, sv, vt)
    } else {
        // x^T = u' s vt' hence x = vt'^T s u'^T
        let (ut, sv, vtt) = x.t().svd(true, true)?;
        (vtt.map(|m| m.reversed_axes()), sv, ut.map(|m| m.reversed_axes()))
    };
    let (u, vt) = match (u, vt) {
        (Some(u), Some(vt)) => (u, vt),
        _ => {
            return Err(EmulatorError::NumericalError(
                "SVD did not return singular vectors".to_string(),
            ))
        }
    };

    let mut order: Vec<usize> = (0..sv.len()).collect();
    order.sort_by(|&a, &b| sv[b].partial_cmp(&sv[a]).unwrap_or(std::cmp::Ordering::Equal));
    Ok((
        u.select(Axis(1), &order),
        sv.select(Axis(0), &order),
        vt.select(Axis(0), &order),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::{Normal, Uniform};
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    fn reconstruction_error(x: &Array2<f64>, npc: usize) -> f64 {
        let pca = PrincipalComponents::fit(x, npc).unwrap();
        let rec = pca.reconstruct(&pca.weights().t()).unwrap();
        (&rec - x).mapv(|v| v * v).sum().sqrt()
    }

    #[test]
    fn test_full_rank_reconstruction() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        // both tall and wide matrices
        for (n, m) in [(8, 5), (5, 8), (6, 6)] {
            let x = Array2::random_using((n, m), Uniform::new(-2., 2.), &mut rng);
            let npc = n.min(m);
            let pca = PrincipalComponents::fit(&x, npc).unwrap();
            assert_eq!(pca.basis().dim(), (npc, m));
            assert_eq!(pca.weights().dim(), (npc, n));
            let rec = pca.reconstruct(&pca.weights().t()).unwrap();
            assert_abs_diff_eq!(rec, x, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_monotone_reconstruction_error() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let x = Array2::random_using((10, 15), Uniform::new(0., 1.), &mut rng);
        let errors: Vec<f64> = (1..=10).map(|npc| reconstruction_error(&x, npc)).collect();
        for w in errors.windows(2) {
            assert!(w[1] <= w[0] + 1e-12, "errors not decreasing: {errors:?}");
        }
        assert_abs_diff_eq!(errors[9], 0., epsilon = 1e-10);
    }

    #[test]
    fn test_descending_singular_values() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let x = Array2::random_using((7, 4), Uniform::new(-1., 1.), &mut rng);
        let pca = PrincipalComponents::fit(&x, 2).unwrap();
        let sv = pca.singular_values();
        assert_eq!(sv.len(), 4);
        for w in sv.to_vec().windows(2) {
            assert!(w[0] >= w[1]);
        }
        let ratio = pca.explained_variance_ratio();
        assert!(ratio[0] >= ratio[1]);
        assert!(ratio.sum() <= 1. + 1e-12);
        assert_abs_diff_eq!(pca.explained_variance()[0], sv[0] * sv[0] / 7., epsilon = 1e-12);
    }

    #[test]
    fn test_dominant_mode() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let (n, m) = (12, 30);
        let a = Array::linspace(-1f64, 1., n);
        let a = &a / a.dot(&a).sqrt();
        let b = Array::linspace(0f64, 3., m).mapv(f64::sin);
        let b = &b / b.dot(&b).sqrt();
        let top = 10.;
        let signal = a.clone().insert_axis(Axis(1)).dot(&b.clone().insert_axis(Axis(0))) * top;
        let noise = Array2::random_using((n, m), Normal::new(0., 1e-3).unwrap(), &mut rng);
        let x = signal + noise;

        let pca = PrincipalComponents::fit(&x, 1).unwrap();
        assert_abs_diff_eq!(pca.singular_values()[0], top, epsilon = 0.05);
        assert_abs_diff_eq!(
            pca.explained_variance()[0],
            top * top / n as f64,
            epsilon = 0.1
        );
        let phi = pca.basis().row(0).to_owned();
        let cos = phi.dot(&b) / phi.dot(&phi).sqrt();
        assert_abs_diff_eq!(cos.abs(), 1., epsilon = 1e-4);
        assert!(pca.explained_variance_ratio()[0] > 0.99);
    }

    #[test]
    fn test_weights_scaling() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let x = Array2::random_using((9, 4), Uniform::new(-1., 1.), &mut rng);
        let pca = PrincipalComponents::fit(&x, 3).unwrap();
        // sqrt(n) u_j has a unit mean square over samples
        for w in pca.weights().rows() {
            assert_abs_diff_eq!(w.dot(&w) / 9., 1., epsilon = 1e-10);
        }
    }

    #[test]
    fn test_project() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let x = Array2::random_using((6, 10), Uniform::new(-1., 1.), &mut rng);
        let pca = PrincipalComponents::fit(&x, 3).unwrap();
        let w = pca.project(&x).unwrap();
        assert_abs_diff_eq!(w, pca.weights().t(), epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_components() {
        let x = array![[1., 2., 3.], [4., 5., 6.]];
        assert!(matches!(
            PrincipalComponents::fit(&x, 0),
            Err(EmulatorError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            PrincipalComponents::fit(&x, 3),
            Err(EmulatorError::InvalidConfiguration(_))
        ));
        let pca = PrincipalComponents::fit(&x, 2).unwrap();
        assert!(matches!(
            pca.reconstruct(&array![[1.]]),
            Err(EmulatorError::InvalidShape(_))
        ));
    }
}

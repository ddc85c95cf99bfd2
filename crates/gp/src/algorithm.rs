use crate::correlation_models::*;
use crate::errors::{GpError, Result};
use crate::mean_models::*;
use crate::optimization::optimize_params;
use crate::parameters::{GpParams, GpValidParams, HyperTuning};
use crate::utils::{input_scales, pairwise_differences, DiffMatrix};

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};

use log::{debug, warn};
use std::fmt;
use std::time::Instant;

/// Value returned to the optimizer in place of the negative log-likelihood
/// when the latter cannot be computed (e.g. singular covariance matrix)
pub const GP_NLL_PENALTY: f64 = 1e25;
/// Default number of correction pairs kept by the L-BFGS optimizer
pub const GP_LBFGS_MEMORY: usize = 7;
/// Default max number of L-BFGS iterations for hyperparameters optimization
pub const GP_DEFAULT_MAX_ITERS: u64 = 200;

/// Pack process variance and length scales as the log hyperparameters vector
/// `[ln(variance), ln(l_1), ..., ln(l_nx)]` which is the optimization variable.
pub fn pack_hyperparameters<F: Float>(
    variance: F,
    length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array1<F> {
    let mut hyper = Array1::zeros(length_scales.len() + 1);
    hyper[0] = variance.ln();
    Zip::from(hyper.slice_mut(ndarray::s![1..]))
        .and(length_scales)
        .for_each(|h, &l| *h = l.ln());
    hyper
}

/// Unpack log hyperparameters vector into process variance and length scales
pub fn unpack_hyperparameters<F: Float>(
    hyper: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (F, Array1<F>) {
    (
        hyper[0].exp(),
        hyper.slice(ndarray::s![1..]).mapv(|v| v.exp()),
    )
}

/// Factorization of the covariance matrix at given hyperparameters
#[derive(Debug, Clone)]
pub(crate) struct GpInnerParams<F: Float> {
    /// Cholesky decomposition of the covariance matrix \[K\] = variance * (\[R\] + nugget * I)
    k_chol: Array2<F>,
    /// Solution of the linear equation system : \[K\] x alpha = y - mean
    alpha: Array1<F>,
}

/// Log-marginal-likelihood of a zero mean GP conditioned on training inputs
/// and centered training outputs, seen as a function of the log hyperparameters.
///
/// For `K` the covariance matrix, `r` the centered outputs and `n` the number of
/// training points:
///
/// `log L = -1/2 r^T K^-1 r - 1/2 log|K| - n/2 log(2 pi)`
#[derive(Debug, Clone)]
pub struct MarginalLikelihood<F: Float, Corr: CorrelationModel<F>> {
    corr: Corr,
    x_distances: DiffMatrix<F>,
    residuals: Array1<F>,
    nugget: F,
}

impl<F: Float, Corr: CorrelationModel<F>> MarginalLikelihood<F, Corr> {
    /// Condition on training inputs `x` (n, nx) and centered outputs `residuals` (n,)
    pub fn new(
        corr: Corr,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        residuals: &ArrayBase<impl Data<Elem = F>, Ix1>,
        nugget: F,
    ) -> Self {
        MarginalLikelihood {
            corr,
            x_distances: DiffMatrix::new(x),
            residuals: residuals.to_owned(),
            nugget,
        }
    }

    /// Size of the hyperparameters vector
    pub fn n_hyperparameters(&self) -> usize {
        self.x_distances.d.ncols() + 1
    }

    fn factorize(&self, hyper: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<GpInnerParams<F>> {
        let (variance, length_scales) = unpack_hyperparameters(hyper);
        if !(variance.is_finite() && variance > F::zero())
            || length_scales
                .iter()
                .any(|l| !(l.is_finite() && *l > F::zero()))
        {
            return Err(GpError::LikelihoodComputationError(format!(
                "hyperparameters out of range: {hyper}"
            )));
        }
        let rxx = self.corr.value(&self.x_distances.d, &length_scales);
        let k_mx = self
            .x_distances
            .to_symmetric(&rxx, F::one() + self.nugget)
            .mapv(|v| v * variance);
        let k_chol = k_mx.cholesky()?;
        let rhs = self.residuals.view().insert_axis(Axis(1));
        let tmp = k_chol.solve_triangular(&rhs, UPLO::Lower)?;
        let alpha = k_chol
            .t()
            .solve_triangular_into(tmp, UPLO::Upper)?
            .remove_axis(Axis(1));
        Ok(GpInnerParams { k_chol, alpha })
    }

    fn value_from(&self, inners: &GpInnerParams<F>) -> Result<F> {
        let n_obs = F::cast(self.x_distances.n_obs);
        // The determinant of K is equal to the squared product of
        // the diagonal elements of its Cholesky decomposition k_chol
        let half_logdet = inners.k_chol.diag().mapv(|v| v.ln()).sum();
        let fit = self.residuals.dot(&inners.alpha);
        let two_pi = F::cast(2. * std::f64::consts::PI);
        let lkh = F::cast(-0.5) * fit - half_logdet - F::cast(0.5) * n_obs * two_pi.ln();
        if lkh.is_finite() {
            Ok(lkh)
        } else {
            Err(GpError::LikelihoodComputationError(
                "non finite log-likelihood".to_string(),
            ))
        }
    }

    /// Log-marginal-likelihood at given log hyperparameters
    pub fn value(&self, hyper: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<F> {
        let inners = self.factorize(hyper)?;
        self.value_from(&inners)
    }

    /// Log-marginal-likelihood and its gradient wrt log hyperparameters
    ///
    /// `d log L / d p = 1/2 tr((alpha alpha^T - K^-1) dK/dp)` with `alpha = K^-1 r`
    pub fn value_and_gradient(
        &self,
        hyper: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<(F, Array1<F>)> {
        let inners = self.factorize(hyper)?;
        let lkh = self.value_from(&inners)?;

        let (variance, length_scales) = unpack_hyperparameters(hyper);
        let n_obs = self.x_distances.n_obs;
        let mut grad = Array1::zeros(self.n_hyperparameters());

        // dK/d(ln variance) = K
        grad[0] = F::cast(0.5) * (self.residuals.dot(&inners.alpha) - F::cast(n_obs));

        if n_obs > 1 {
            let linv = inners
                .k_chol
                .solve_triangular(&Array2::<F>::eye(n_obs), UPLO::Lower)?;
            let kinv = inners
                .k_chol
                .t()
                .solve_triangular_into(linv, UPLO::Upper)?;
            let alpha = inners.alpha.view().insert_axis(Axis(1));
            let w = alpha.dot(&alpha.t()) - kinv;
            let w_pairs = self
                .x_distances
                .d_indices
                .outer_iter()
                .map(|ij| w[[ij[0], ij[1]]])
                .collect::<Array1<F>>();
            // Off-diagonal terms only, counted twice by symmetry, diagonal does not depend on l
            let dr = self
                .corr
                .log_length_scale_gradient(&self.x_distances.d, &length_scales);
            let grad_ls = dr.t().dot(&w_pairs).mapv(|v| v * variance);
            grad.slice_mut(ndarray::s![1..]).assign(&grad_ls);
        }
        Ok((lkh, grad))
    }
}

/// A GP regression is an interpolation method where the
/// interpolated values are modeled by a Gaussian process with a mean and
/// governed by a prior covariance kernel, which depends on some
/// parameters to be determined.
///
/// The interpolated output is modeled as stochastic process as follows:
///
/// `Y(x) = mu + Z(x)`
///
/// where:
/// * `mu` is the constant level of the gaussian process given by the mean model
/// * `Z(x)` the realization of stochastic gaussian process ~ `Normal(0, sigma^2 corr(x, x'))`
///
/// where:
/// * `sigma^2` is the process variance
/// * `corr(x, x')` is a correlation function which depends on `distance(x, x')`
///   and a set of length scales, one per input dimension.
///
/// Process variance and length scales are the kernel hyperparameters. They are fitted
/// by maximizing the log-marginal-likelihood with the L-BFGS gradient-based optimizer
/// starting from the variance given in parameters (default 1.) and length scales given
/// in parameters (default to the per-dimension standard deviation of the training inputs).
///
/// # Implementation
///
/// * Based on [ndarray](https://github.com/rust-ndarray/ndarray)
///   and [linfa](https://github.com/rust-ml/linfa)
/// * Hyperparameters optimization relies on [argmin](https://github.com/argmin-rs/argmin) L-BFGS
///   with analytical log-likelihood gradient.
///
/// # Example
///
/// ```no_run
/// use boltzmann_gp::{correlation_models::*, mean_models::*, GaussianProcess};
/// use linfa::prelude::*;
/// use ndarray::{arr2, Array, Array1, Array2, Axis};
///
/// // one-dimensional test function to approximate
/// fn xsinx(x: &Array2<f64>) -> Array1<f64> {
///     ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
/// }
///
/// // training data
/// let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
/// let yt = xsinx(&xt);
///
/// // GP with constant mean model and squared exponential correlation model
/// let gp = GaussianProcess::<f64, ConstantMean, SquaredExponentialCorr>::params(
///                 ConstantMean::default(),
///                 SquaredExponentialCorr::default())
///                 .fit(&Dataset::new(xt, yt))
///                 .expect("GP trained");
///
/// // Use trained model for making predictions
/// let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
/// let ytest = xsinx(&xtest);
///
/// let ypred = gp.predict(&xtest).expect("GP prediction");
/// let yvariances = gp.predict_var(&xtest).expect("GP prediction");
///```
#[derive(Debug, Clone)]
pub struct GaussianProcess<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> {
    /// Process variance
    variance: F,
    /// Length scales of the correlation model, one per input dimension
    length_scales: Array1<F>,
    /// Constant level of the GP
    offset: F,
    /// Log-marginal-likelihood at fitted hyperparameters
    likelihood: F,
    /// Whether hyperparameters optimizer reported convergence
    converged: bool,
    /// Gaussian process internal fitted params
    inner_params: GpInnerParams<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F, Mean, Corr>,
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> fmt::Display
    for GaussianProcess<F, Mean, Corr>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(mean={}, corr={}, length_scales={}, variance={}, likelihood={})",
            self.params.mean, self.params.corr, self.length_scales, self.variance, self.likelihood,
        )
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> GaussianProcess<F, Mean, Corr> {
    /// Gp parameters contructor
    pub fn params<NewMean: MeanModel<F>, NewCorr: CorrelationModel<F>>(
        mean: NewMean,
        corr: NewCorr,
    ) -> GpParams<F, NewMean, NewCorr> {
        GpParams::new(mean, corr)
    }

    fn check_input_dim(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        if x.ncols() != self.training_data.0.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "Input dimension mismatch: expected {}, got {}",
                self.training_data.0.ncols(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Covariance between given x points (n, nx) and training points, (n, n_train)
    fn _compute_cross_covariance(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let xt = &self.training_data.0;
        let dx = pairwise_differences(x, xt);
        let r = self.params.corr.value(&dx, &self.length_scales);
        let k = r.into_shape((x.nrows(), xt.nrows()))?;
        Ok(k.mapv(|v| v * self.variance))
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input_dim(x)?;
        let k = self._compute_cross_covariance(x)?;
        Ok(k.dot(&self.inner_params.alpha).mapv(|v| v + self.offset))
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) column vector.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input_dim(x)?;
        let k = self._compute_cross_covariance(x)?;
        self._compute_var(&k)
    }

    /// Predict both output values and variance at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        self.check_input_dim(x)?;
        let k = self._compute_cross_covariance(x)?;
        let mean = k.dot(&self.inner_params.alpha).mapv(|v| v + self.offset);
        let var = self._compute_var(&k)?;
        Ok((mean, var))
    }

    fn _compute_var(&self, k: &Array2<F>) -> Result<Array1<F>> {
        let v = self
            .inner_params
            .k_chol
            .solve_triangular(&k.t(), UPLO::Lower)?;
        let mse = Array::from_elem(k.nrows(), self.variance) - v.mapv(|v| v * v).sum_axis(Axis(0));
        // Variance might be slightly negative depending on
        // machine precision: set to zero in that case
        Ok(mse.mapv(|v| if v < F::zero() { F::zero() } else { v }))
    }

    /// Retrieve fitted process variance
    pub fn variance(&self) -> F {
        self.variance
    }

    /// Retrieve fitted length scales
    pub fn length_scales(&self) -> &Array1<F> {
        &self.length_scales
    }

    /// Retrieve fitted log hyperparameters vector `[ln(variance), ln(l_1), ..., ln(l_nx)]`
    pub fn hyperparameters(&self) -> Array1<F> {
        pack_hyperparameters(self.variance, &self.length_scales)
    }

    /// Constant level of the GP
    pub fn offset(&self) -> F {
        self.offset
    }

    /// Retrieve log-marginal-likelihood value
    pub fn likelihood(&self) -> F {
        self.likelihood
    }

    /// Whether the hyperparameters optimizer converged (always true for fixed hyperparameters)
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.ncols(), 1)
    }

    /// Training inputs and outputs
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Parameters used to fit this model
    pub fn params_used(&self) -> &GpValidParams<F, Mean, Corr> {
        &self.params
    }
}

/// Kriging as GP special case when using constant mean and squared exponential correlation
pub type Kriging<F> = GpParams<F, ConstantMean, SquaredExponentialCorr>;

impl<F: Float> Kriging<F> {
    /// Kriging parameters constructor
    pub fn params() -> GpParams<F, ConstantMean, SquaredExponentialCorr> {
        GpParams::new(ConstantMean(), SquaredExponentialCorr())
    }
}

impl<F, D, Mean, Corr> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for GaussianProcess<F, Mean, Corr>
where
    F: Float,
    D: Data<Elem = F>,
    Mean: MeanModel<F>,
    Corr: CorrelationModel<F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

#[inline(always)]
fn into_f64<F: Float>(v: F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>, D: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError> for GpValidParams<F, Mean, Corr>
{
    type Object = GaussianProcess<F, Mean, Corr>;

    /// Fit GP hyperparameters using maximum likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();

        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(GpError::InvalidValueError(
                "Training inputs should not be empty".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(GpError::InvalidValueError(format!(
                "Training inputs ({}) and outputs ({}) numbers mismatch",
                x.nrows(),
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(GpError::InvalidValueError(
                "Training data should be finite".to_string(),
            ));
        }

        let nx = x.ncols();
        let length_scales0 = match self.length_scales() {
            None => input_scales(x),
            Some(ls) if ls.len() == 1 => Array1::from_elem(nx, ls[0]),
            Some(ls) if ls.len() == nx => ls.to_owned(),
            Some(ls) => {
                return Err(GpError::InvalidValueError(format!(
                    "Length scales should be either 1-dim or dim of xtrain ({nx}), got {}",
                    ls.len()
                )))
            }
        };

        let offset = self.mean().offset(y);
        let residuals = y.mapv(|v| v - offset);
        let likelihood = MarginalLikelihood::new(*self.corr(), x, &residuals, self.nugget());
        if likelihood
            .x_distances
            .d
            .rows()
            .into_iter()
            .any(|row| row.iter().all(|v| *v == F::zero()))
        {
            warn!("Multiple x input features have the same value (at least same row twice).");
        }
        let hyper0 = pack_hyperparameters(self.variance(), &length_scales0);

        let (hyper, converged) = match self.tuning() {
            HyperTuning::Fixed => (hyper0, true),
            HyperTuning::Optimized => {
                let objfn = |p: &Array1<f64>| -> f64 {
                    let hyper = p.mapv(F::cast);
                    match likelihood.value(&hyper) {
                        Ok(lkh) => -into_f64(lkh),
                        Err(_) => GP_NLL_PENALTY,
                    }
                };
                let gradfn = |p: &Array1<f64>| -> Array1<f64> {
                    let hyper = p.mapv(F::cast);
                    match likelihood.value_and_gradient(&hyper) {
                        Ok((_, grad)) if grad.iter().all(|g| g.is_finite()) => {
                            grad.mapv(|g| -into_f64(g))
                        }
                        _ => Array1::zeros(p.len()),
                    }
                };

                debug!("Optimize hyperparameters from {hyper0}");
                let now = Instant::now();
                let res = optimize_params(
                    objfn,
                    gradfn,
                    &hyper0.mapv(into_f64),
                    GP_NLL_PENALTY,
                    self.lbfgs_params(),
                )?;
                debug!(
                    "elapsed optim = {:?} ms, best negative log likelihood = {}",
                    now.elapsed().as_millis(),
                    res.cost
                );
                if !res.feasible {
                    return Err(GpError::LikelihoodComputationError(
                        "covariance matrix is singular for every candidate hyperparameters"
                            .to_string(),
                    ));
                }
                (res.params.mapv(F::cast), res.converged)
            }
        };

        let inner_params = likelihood.factorize(&hyper)?;
        let lkh = likelihood.value_from(&inner_params)?;
        let (variance, length_scales) = unpack_hyperparameters(&hyper);
        debug!("GP fitted: variance = {variance}, length scales = {length_scales}, likelihood = {lkh}");
        Ok(GaussianProcess {
            variance,
            length_scales,
            offset,
            likelihood: lkh,
            converged,
            inner_params,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}

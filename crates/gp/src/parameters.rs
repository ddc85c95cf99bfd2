use crate::correlation_models::CorrelationModel;
use crate::errors::{GpError, Result};
use crate::mean_models::MeanModel;
use crate::optimization::LbfgsParams;
use crate::{GP_DEFAULT_MAX_ITERS, GP_LBFGS_MEMORY};
use linfa::{Float, ParamGuard};

use ndarray::Array1;

/// An enum to represent how kernel hyperparameters are set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HyperTuning {
    /// Hyperparameters are given, not estimated
    Fixed,
    /// Hyperparameters are fitted by maximizing the log-marginal-likelihood
    /// starting from the initial values
    #[default]
    Optimized,
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GpValidParams<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> {
    /// Mean model representing the level the GP reverts to
    pub(crate) mean: Mean,
    /// Correlation model representing the spatial correlation between errors at e(x) and e(x')
    pub(crate) corr: Corr,
    /// Hyperparameters estimation mode
    pub(crate) tuning: HyperTuning,
    /// Initial (or fixed) process variance
    pub(crate) variance: F,
    /// Initial (or fixed) length scales, either one value broadcasted over
    /// input dimensions or one value per dimension.
    /// When `None` the per-dimension standard deviation of training inputs is used.
    pub(crate) length_scales: Option<Array1<F>>,
    /// Parameter to improve numerical stability
    pub(crate) nugget: F,
    /// Number of correction pairs kept by L-BFGS
    pub(crate) lbfgs_memory: usize,
    /// Max number of L-BFGS iterations
    pub(crate) max_iters: u64,
    /// Gradient norm tolerance used as convergence criterion
    pub(crate) tol_grad: f64,
    /// Cost change tolerance used as convergence criterion
    pub(crate) tol_cost: f64,
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> Default
    for GpValidParams<F, Mean, Corr>
{
    fn default() -> GpValidParams<F, Mean, Corr> {
        let lbfgs = LbfgsParams::default();
        GpValidParams {
            mean: Mean::default(),
            corr: Corr::default(),
            tuning: HyperTuning::default(),
            variance: F::one(),
            length_scales: None,
            nugget: F::cast(100.0) * F::epsilon(),
            lbfgs_memory: GP_LBFGS_MEMORY,
            max_iters: GP_DEFAULT_MAX_ITERS,
            tol_grad: lbfgs.tol_grad,
            tol_cost: lbfgs.tol_cost,
        }
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> GpValidParams<F, Mean, Corr> {
    /// Get mean model
    pub fn mean(&self) -> &Mean {
        &self.mean
    }

    /// Get correlation corr k(x, x')
    pub fn corr(&self) -> &Corr {
        &self.corr
    }

    /// Get hyperparameters estimation mode
    pub fn tuning(&self) -> HyperTuning {
        self.tuning
    }

    /// Get initial process variance
    pub fn variance(&self) -> F {
        self.variance
    }

    /// Get initial length scales if given
    pub fn length_scales(&self) -> Option<&Array1<F>> {
        self.length_scales.as_ref()
    }

    /// Get nugget
    pub fn nugget(&self) -> F {
        self.nugget
    }

    /// Get the max number of optimizer iterations
    pub fn max_iters(&self) -> u64 {
        self.max_iters
    }

    pub(crate) fn lbfgs_params(&self) -> LbfgsParams {
        LbfgsParams {
            memory: self.lbfgs_memory,
            max_iters: self.max_iters,
            tol_grad: self.tol_grad,
            tol_cost: self.tol_cost,
        }
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.GaussianProcess.html).
pub struct GpParams<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>>(
    GpValidParams<F, Mean, Corr>,
);

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> GpParams<F, Mean, Corr> {
    /// A constructor for GP parameters given mean and correlation models
    pub fn new(mean: Mean, corr: Corr) -> GpParams<F, Mean, Corr> {
        Self(GpValidParams {
            mean,
            corr,
            ..Default::default()
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F, Mean, Corr>) -> Self {
        Self(params.clone())
    }

    /// Set mean model.
    pub fn mean(mut self, mean: Mean) -> Self {
        self.0.mean = mean;
        self
    }

    /// Set correlation model.
    pub fn corr(mut self, corr: Corr) -> Self {
        self.0.corr = corr;
        self
    }

    /// Set hyperparameters estimation mode.
    pub fn tuning(mut self, tuning: HyperTuning) -> Self {
        self.0.tuning = tuning;
        self
    }

    /// Set process variance.
    ///
    /// When hyperparameters are optimized, the optimization is started from that value.
    pub fn variance(mut self, variance: F) -> Self {
        self.0.variance = variance;
        self
    }

    /// Set length scales, either a single value used for every input dimension
    /// or one value per input dimension.
    ///
    /// When hyperparameters are optimized, the optimization is started from these values.
    pub fn length_scales(mut self, length_scales: Array1<F>) -> Self {
        self.0.length_scales = Some(length_scales);
        self
    }

    /// Set nugget.
    ///
    /// Nugget is added to the correlation matrix diagonal to improve numerical stability
    pub fn nugget(mut self, nugget: F) -> Self {
        self.0.nugget = nugget;
        self
    }

    /// Set the number of correction pairs used by the L-BFGS optimizer
    pub fn lbfgs_memory(mut self, memory: usize) -> Self {
        self.0.lbfgs_memory = memory;
        self
    }

    /// Set the max number of optimizer iterations
    pub fn max_iters(mut self, max_iters: u64) -> Self {
        self.0.max_iters = max_iters;
        self
    }

    /// Set optimizer tolerances on gradient norm and cost change
    pub fn tolerances(mut self, tol_grad: f64, tol_cost: f64) -> Self {
        self.0.tol_grad = tol_grad;
        self.0.tol_cost = tol_cost;
        self
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>>
    From<GpValidParams<F, Mean, Corr>> for GpParams<F, Mean, Corr>
{
    fn from(valid: GpValidParams<F, Mean, Corr>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> ParamGuard
    for GpParams<F, Mean, Corr>
{
    type Checked = GpValidParams<F, Mean, Corr>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if !(self.0.variance > F::zero()) {
            return Err(GpError::InvalidValueError(format!(
                "`variance` should be strictly positive, got {}",
                self.0.variance
            )));
        }
        if let Some(ls) = self.0.length_scales.as_ref() {
            if ls.is_empty() {
                return Err(GpError::InvalidValueError(
                    "`length_scales` cannot be empty!".to_string(),
                ));
            }
            if ls.iter().any(|v| !(*v > F::zero()) || !v.is_finite()) {
                return Err(GpError::InvalidValueError(format!(
                    "`length_scales` should be strictly positive, got {ls}"
                )));
            }
        }
        if self.0.nugget < F::zero() {
            return Err(GpError::InvalidValueError(
                "`nugget` cannot be negative!".to_string(),
            ));
        }
        if self.0.lbfgs_memory == 0 {
            return Err(GpError::InvalidValueError(
                "`lbfgs_memory` canot be 0!".to_string(),
            ));
        }
        if self.0.max_iters == 0 {
            return Err(GpError::InvalidValueError(
                "`max_iters` canot be 0!".to_string(),
            ));
        }
        if !(self.0.tol_grad >= 0.) || !(self.0.tol_cost >= 0.) {
            return Err(GpError::InvalidValueError(
                "optimizer tolerances should be positive".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

use crate::errors::{EmulatorError, Result};

use boltzmann_gp::correlation_models::{CorrelationModel, SquaredExponentialCorr};
use boltzmann_gp::mean_models::{ConstantMean, MeanModel};
use boltzmann_gp::{GpParams, HyperTuning};
use linfa::{Float, ParamGuard};
use ndarray::Array1;

/// Emulator checked parameters
#[derive(Clone, Debug)]
pub struct EmulatorValidParams<
    F: Float,
    Mean: MeanModel<F> = ConstantMean,
    Corr: CorrelationModel<F> = SquaredExponentialCorr,
> {
    /// Number of retained principal components
    n_components: usize,
    /// Parameters of the GP of every component
    gp_params: GpParams<F, Mean, Corr>,
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> Default
    for EmulatorValidParams<F, Mean, Corr>
{
    fn default() -> EmulatorValidParams<F, Mean, Corr> {
        EmulatorValidParams {
            n_components: 1,
            gp_params: GpParams::new(Mean::default(), Corr::default()),
        }
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> EmulatorValidParams<F, Mean, Corr> {
    /// The number of principal components
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// The GP parameters copied for every component
    pub fn gp_params(&self) -> &GpParams<F, Mean, Corr> {
        &self.gp_params
    }

    /// Initial length scales of the GP kernels if given
    pub fn length_scales(&self) -> Option<&Array1<F>> {
        self.gp_params
            .check_ref()
            .ok()
            .and_then(|params| params.length_scales())
    }
}

/// Emulator parameters builder
#[derive(Clone, Debug)]
pub struct EmulatorParams<
    F: Float,
    Mean: MeanModel<F> = ConstantMean,
    Corr: CorrelationModel<F> = SquaredExponentialCorr,
>(EmulatorValidParams<F, Mean, Corr>);

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> Default
    for EmulatorParams<F, Mean, Corr>
{
    fn default() -> EmulatorParams<F, Mean, Corr> {
        EmulatorParams(EmulatorValidParams::default())
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> EmulatorParams<F, Mean, Corr> {
    /// Constructor of emulator parameters given GP mean and kernel
    pub fn new(mean: Mean, corr: Corr) -> EmulatorParams<F, Mean, Corr> {
        EmulatorParams(EmulatorValidParams {
            n_components: 1,
            gp_params: GpParams::new(mean, corr),
        })
    }

    /// Constructor from checked parameters
    pub fn new_from_valid(params: &EmulatorValidParams<F, Mean, Corr>) -> Self {
        EmulatorParams(params.clone())
    }

    /// Set the number of principal components
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.0.n_components = n_components;
        self
    }

    /// Set the GP kernel, each component gets its own copy
    pub fn kernel(mut self, corr: Corr) -> Self {
        self.0.gp_params = self.0.gp_params.corr(corr);
        self
    }

    /// Set the GP mean model
    pub fn mean(mut self, mean: Mean) -> Self {
        self.0.gp_params = self.0.gp_params.mean(mean);
        self
    }

    /// Set the kernel hyperparameters estimation mode
    pub fn tuning(mut self, tuning: HyperTuning) -> Self {
        self.0.gp_params = self.0.gp_params.tuning(tuning);
        self
    }

    /// Set the initial kernel length scales (one value or one per input parameter)
    pub fn length_scales(mut self, length_scales: Array1<F>) -> Self {
        self.0.gp_params = self.0.gp_params.length_scales(length_scales);
        self
    }

    /// Set the whole GP parameters
    pub fn gp_params(mut self, gp_params: GpParams<F, Mean, Corr>) -> Self {
        self.0.gp_params = gp_params;
        self
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> ParamGuard
    for EmulatorParams<F, Mean, Corr>
{
    type Checked = EmulatorValidParams<F, Mean, Corr>;
    type Error = EmulatorError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_components == 0 {
            return Err(EmulatorError::InvalidConfiguration(
                "`n_components` cannot be 0!".to_string(),
            ));
        }
        self.0
            .gp_params
            .check_ref()
            .map_err(|err| EmulatorError::InvalidConfiguration(err.to_string()))?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>>
    From<EmulatorValidParams<F, Mean, Corr>> for EmulatorParams<F, Mean, Corr>
{
    fn from(valid: EmulatorValidParams<F, Mean, Corr>) -> Self {
        EmulatorParams(valid)
    }
}

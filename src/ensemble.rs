//! One GP regressor per principal component.
use crate::errors::{EmulatorError, Result};

use boltzmann_gp::correlation_models::CorrelationModel;
use boltzmann_gp::mean_models::MeanModel;
use boltzmann_gp::{GaussianProcess, GpParams};
use linfa::prelude::{Dataset, Fit, Float};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use rayon::prelude::*;

use log::{debug, info};
use std::time::Instant;

/// Independently trained GPs mapping input parameters to principal component weights
#[derive(Debug, Clone)]
pub struct GpEnsemble<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> {
    gps: Vec<GaussianProcess<F, Mean, Corr>>,
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> GpEnsemble<F, Mean, Corr> {
    /// Fit one GP per row of `weights` (n_components, n_samples) conditioned on
    /// `parameters` (n_samples, n_params).
    ///
    /// Components are trained in parallel, each from its own copy of `gp_params`.
    /// The failure of any component fails the whole ensemble.
    pub fn fit(
        gp_params: &GpParams<F, Mean, Corr>,
        parameters: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
        weights: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    ) -> Result<Self> {
        if weights.ncols() != parameters.nrows() {
            return Err(EmulatorError::InvalidShape(format!(
                "weights given for {} samples while {} parameter points given",
                weights.ncols(),
                parameters.nrows()
            )));
        }
        let xt = parameters.to_owned();
        let now = Instant::now();
        let gps = (0..weights.nrows())
            .into_par_iter()
            .map(|component| {
                let params = gp_params.clone();
                let dataset = Dataset::new(xt.clone(), weights.row(component).to_owned());
                let now = Instant::now();
                let gp = params
                    .fit(&dataset)
                    .map_err(|source| EmulatorError::ComponentFit { component, source })?;
                debug!(
                    "Component {component} fitted in {} ms: {gp}",
                    now.elapsed().as_millis()
                );
                Ok(gp)
            })
            .collect::<Result<Vec<_>>>()?;
        info!(
            "{} component GPs trained in {} ms",
            gps.len(),
            now.elapsed().as_millis()
        );
        Ok(GpEnsemble { gps })
    }

    /// Number of components
    pub fn n_components(&self) -> usize {
        self.gps.len()
    }

    /// Trained GPs, one per component
    pub fn gps(&self) -> &[GaussianProcess<F, Mean, Corr>] {
        &self.gps
    }

    /// Posterior mean of the weights at `x` (n, n_params), returns (n, n_components)
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let mut weights = Array2::zeros((x.nrows(), self.n_components()));
        for (mut col, gp) in weights.columns_mut().into_iter().zip(&self.gps) {
            col.assign(&gp.predict(x)?);
        }
        Ok(weights)
    }

    /// Posterior variance of the weights at `x` (n, n_params), returns (n, n_components)
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let mut vars = Array2::zeros((x.nrows(), self.n_components()));
        for (mut col, gp) in vars.columns_mut().into_iter().zip(&self.gps) {
            col.assign(&gp.predict_var(x)?);
        }
        Ok(vars)
    }

    /// Posterior mean and variance of the weights at `x` (n, n_params)
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array2<F>, Array2<F>)> {
        let mut weights = Array2::zeros((x.nrows(), self.n_components()));
        let mut vars = Array2::zeros((x.nrows(), self.n_components()));
        for ((mut wcol, mut vcol), gp) in weights
            .columns_mut()
            .into_iter()
            .zip(vars.columns_mut())
            .zip(&self.gps)
        {
            let (w, v) = gp.predict_valvar(x)?;
            wcol.assign(&w);
            vcol.assign(&v);
        }
        Ok((weights, vars))
    }
}

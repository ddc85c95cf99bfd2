use crate::ensemble::GpEnsemble;
use crate::errors::{EmulatorError, Result};
use crate::parameters::{EmulatorParams, EmulatorValidParams};
use crate::pca::PrincipalComponents;
use crate::preprocessing::SpectrumNormalizer;

use boltzmann_gp::correlation_models::{CorrelationModel, SquaredExponentialCorr};
use boltzmann_gp::mean_models::{ConstantMean, MeanModel};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_stats::DeviationExt;

use log::{debug, info};
use std::fmt;
use std::time::Instant;

/// State computed by training, read-only afterwards
#[derive(Debug, Clone)]
struct TrainedState<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> {
    normalizer: SpectrumNormalizer<F>,
    pca: PrincipalComponents<F>,
    ensemble: GpEnsemble<F, Mean, Corr>,
}

/// An emulator of a Boltzmann code predicting the matter power spectrum `P(k, z)`
/// at any point of the cosmological parameters space.
///
/// Training spectra are weighted by `k^2`, log transformed and normalized, then reduced
/// with a principal component analysis. The weights of the retained components are
/// regressed over the cosmological parameters with one gaussian process per component.
///
/// Prediction goes the other way round: GP weights, linear combination of the components,
/// inverse normalization and division by `k^2`.
///
/// # Example
///
/// ```no_run
/// use boltzmann_emulator::{Emulator, EmulatorParams};
/// use linfa::ParamGuard;
/// use ndarray::{array, Array1, Array2};
///
/// let parameters = array![[0.25], [0.30], [0.35]];
/// let redshifts = array![0., 1.];
/// let k = Array1::logspace(10., -2., 0., 10);
/// let power_spectra = Array2::from_shape_fn((3, 20), |(i, j)| {
///     let kj = k[j % 10];
///     (1. + parameters[[i, 0]]) / (kj * (1. + kj * kj))
/// });
///
/// let params = EmulatorParams::<f64>::default().n_components(2).check().unwrap();
/// let mut emulator = Emulator::new(&parameters, &redshifts, &k, &power_spectra, params)
///     .expect("valid training set");
/// emulator.train().expect("emulator trained");
/// let spectrum = emulator.predict_one(&array![0.28]).expect("prediction");
/// assert_eq!(spectrum.len(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct Emulator<
    F: Float,
    Mean: MeanModel<F> = ConstantMean,
    Corr: CorrelationModel<F> = SquaredExponentialCorr,
> {
    /// Training cosmological parameters, (n_samples, n_params)
    parameters: Array2<F>,
    /// Redshifts, (nz,)
    redshifts: Array1<F>,
    /// Wavenumbers, (nk,)
    k: Array1<F>,
    /// Training power spectra, (n_samples, nz * nk)
    power_spectra: Array2<F>,
    params: EmulatorValidParams<F, Mean, Corr>,
    trained: Option<TrainedState<F, Mean, Corr>>,
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> Emulator<F, Mean, Corr> {
    /// Emulator parameters constructor
    pub fn params(mean: Mean, corr: Corr) -> EmulatorParams<F, Mean, Corr> {
        EmulatorParams::new(mean, corr)
    }

    /// Build an emulator from a training set, no computation happens before [Emulator::train].
    ///
    /// `power_spectra` rows are the flattened spectra of the training samples, ordered by
    /// redshift block then wavenumber within block.
    ///
    /// # Errors
    ///
    /// * [EmulatorError::InvalidShape] when the training set is empty, parameters have no
    ///   dimension, parameters and spectra numbers differ, spectra length is not `nz * nk`
    ///   or initial length scales do not match the parameters dimension
    /// * [EmulatorError::InvalidConfiguration] when more components than
    ///   `min(n_samples, nz * nk)` are requested
    pub fn new(
        parameters: &ArrayBase<impl Data<Elem = F>, Ix2>,
        redshifts: &ArrayBase<impl Data<Elem = F>, Ix1>,
        k: &ArrayBase<impl Data<Elem = F>, Ix1>,
        power_spectra: &ArrayBase<impl Data<Elem = F>, Ix2>,
        params: EmulatorValidParams<F, Mean, Corr>,
    ) -> Result<Self> {
        let (n_samples, n_params) = parameters.dim();
        if n_samples == 0 {
            return Err(EmulatorError::InvalidShape(
                "training set should not be empty".to_string(),
            ));
        }
        if n_params == 0 {
            return Err(EmulatorError::InvalidShape(
                "parameters should have at least one dimension".to_string(),
            ));
        }
        if power_spectra.nrows() != n_samples {
            return Err(EmulatorError::InvalidShape(format!(
                "{} parameter points given for {} power spectra",
                n_samples,
                power_spectra.nrows()
            )));
        }
        let n_features = redshifts.len() * k.len();
        if n_features == 0 || power_spectra.ncols() != n_features {
            return Err(EmulatorError::InvalidShape(format!(
                "power spectra length should be {} redshifts x {} wavenumbers = {}, got {}",
                redshifts.len(),
                k.len(),
                n_features,
                power_spectra.ncols()
            )));
        }
        if let Some(ls) = params.length_scales() {
            if ls.len() != 1 && ls.len() != n_params {
                return Err(EmulatorError::InvalidShape(format!(
                    "initial length scales should be of length 1 or {}, got {}",
                    n_params,
                    ls.len()
                )));
            }
        }
        let max_components = n_samples.min(n_features);
        if params.n_components() > max_components {
            return Err(EmulatorError::InvalidConfiguration(format!(
                "{} components requested while at most {} are supported by {} samples of length {}",
                params.n_components(),
                max_components,
                n_samples,
                n_features
            )));
        }

        Ok(Emulator {
            parameters: parameters.to_owned(),
            redshifts: redshifts.to_owned(),
            k: k.to_owned(),
            power_spectra: power_spectra.to_owned(),
            params,
            trained: None,
        })
    }

    /// Train the emulator: normalization, principal components and one GP per component.
    ///
    /// Training again recomputes everything from scratch. On failure the emulator is
    /// left in its previous state.
    pub fn train(&mut self) -> Result<()> {
        info!(
            "Emulator training: {} samples, {} parameters, {} redshifts x {} wavenumbers, {} components",
            self.parameters.nrows(),
            self.parameters.ncols(),
            self.redshifts.len(),
            self.k.len(),
            self.params.n_components()
        );
        let now = Instant::now();

        let (normalizer, normalized) =
            SpectrumNormalizer::fit_transform(&self.power_spectra, &self.k, self.redshifts.len())?;
        let pca = PrincipalComponents::fit(&normalized, self.params.n_components())?;
        info!(
            "Explained variance ratio of retained components: {}",
            pca.explained_variance_ratio()
        );
        if let Ok(err) = pca
            .reconstruct(&pca.weights().t())?
            .root_mean_sq_err(&normalized)
        {
            debug!("RMS reconstruction error of normalized training spectra: {err}");
        }
        let ensemble = GpEnsemble::fit(self.params.gp_params(), &self.parameters, pca.weights())?;

        self.trained = Some(TrainedState {
            normalizer,
            pca,
            ensemble,
        });
        info!("Emulator trained in {} ms", now.elapsed().as_millis());
        Ok(())
    }

    fn state(&self) -> Result<&TrainedState<F, Mean, Corr>> {
        self.trained.as_ref().ok_or(EmulatorError::NotTrained)
    }

    fn check_points(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        if x.ncols() != self.parameters.ncols() {
            return Err(EmulatorError::InvalidShape(format!(
                "parameter points should be of dimension {}, got {}",
                self.parameters.ncols(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Predict power spectra at n parameter points given as a (n, n_params) matrix.
    /// Returns a (n, nz * nk) matrix with the training spectra layout.
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let state = self.state()?;
        self.check_points(x)?;
        let weights = state.ensemble.predict(x)?;
        let normalized = state.pca.reconstruct(&weights)?;
        state.normalizer.inverse_transform(&normalized)
    }

    /// Predict the power spectrum at a single parameter point (n_params,)
    pub fn predict_one(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        let spectra = self.predict(&x.view().insert_axis(Axis(0)))?;
        Ok(spectra.row(0).to_owned())
    }

    /// Predict principal components weights at parameter points (n, n_params),
    /// returns (n, n_components)
    pub fn predict_weights(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let state = self.state()?;
        self.check_points(x)?;
        state.ensemble.predict(x)
    }

    /// Predict posterior variances of principal components weights at parameter
    /// points (n, n_params), returns (n, n_components)
    pub fn predict_weights_var(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        let state = self.state()?;
        self.check_points(x)?;
        state.ensemble.predict_var(x)
    }

    /// Predict power spectra at parameter points (n, n_params) with a `n_sigma` band.
    ///
    /// Components weights being independent, the variance of a normalized spectrum
    /// is `sum_j var_j phi_j^2`, then mapped back to a log-normal band around the
    /// predicted spectra. Returns (spectra, lower, upper) as (n, nz * nk) matrices.
    pub fn predict_band(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_sigma: F,
    ) -> Result<(Array2<F>, Array2<F>, Array2<F>)> {
        let state = self.state()?;
        self.check_points(x)?;
        let (weights, weights_var) = state.ensemble.predict_valvar(x)?;
        let normalized = state.pca.reconstruct(&weights)?;
        let normalized_std = weights_var
            .dot(&state.pca.basis().mapv(|v| v * v))
            .mapv(|v| v.sqrt());
        state
            .normalizer
            .log_std_to_bounds(&normalized, &normalized_std, n_sigma)
    }

    /// Whether the emulator is trained
    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// Number of principal components
    pub fn n_components(&self) -> usize {
        self.params.n_components()
    }

    /// Dimension of the parameters space
    pub fn n_params(&self) -> usize {
        self.parameters.ncols()
    }

    /// Length of predicted spectra, `nz * nk`
    pub fn n_features(&self) -> usize {
        self.power_spectra.ncols()
    }

    /// Redshifts of the spectra
    pub fn redshifts(&self) -> &Array1<F> {
        &self.redshifts
    }

    /// Wavenumbers of the spectra
    pub fn wavenumbers(&self) -> &Array1<F> {
        &self.k
    }

    /// Emulator parameters
    pub fn params_used(&self) -> &EmulatorValidParams<F, Mean, Corr> {
        &self.params
    }

    /// Normalization constants, available once trained
    pub fn normalizer(&self) -> Result<&SpectrumNormalizer<F>> {
        Ok(&self.state()?.normalizer)
    }

    /// Principal components, available once trained
    pub fn principal_components(&self) -> Result<&PrincipalComponents<F>> {
        Ok(&self.state()?.pca)
    }

    /// Component GPs, available once trained
    pub fn ensemble(&self) -> Result<&GpEnsemble<F, Mean, Corr>> {
        Ok(&self.state()?.ensemble)
    }
}

impl<F: Float, Mean: MeanModel<F>, Corr: CorrelationModel<F>> fmt::Display
    for Emulator<F, Mean, Corr>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Emulator(n_samples={}, n_params={}, nz={}, nk={}, n_components={}",
            self.parameters.nrows(),
            self.n_params(),
            self.redshifts.len(),
            self.k.len(),
            self.n_components(),
        )?;
        match &self.trained {
            Some(state) => {
                write!(f, ", trained")?;
                for gp in state.ensemble.gps() {
                    write!(f, ", {gp}")?;
                }
                write!(f, ")")
            }
            None => write!(f, ", untrained)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use boltzmann_gp::correlation_models::Matern52Corr;
    use boltzmann_gp::GpParams;
    use linfa::ParamGuard;
    use ndarray::{array, Array, Zip};

    /// Toy power spectrum: amplitude, tilt and growth-like redshift dependency
    fn toy_spectrum(theta: &[f64], k: &Array1<f64>, z: &Array1<f64>) -> Array1<f64> {
        let (amplitude, tilt) = (theta[0], theta[1]);
        let mut ps = Array1::zeros(z.len() * k.len());
        for (iz, zz) in z.iter().enumerate() {
            for (ik, kk) in k.iter().enumerate() {
                ps[iz * k.len() + ik] =
                    amplitude * kk.powf(tilt) / (1. + (kk / 0.2).powi(3)) / (1. + zz).powi(2);
            }
        }
        ps
    }

    fn toy_training_set(
        parameters: &Array2<f64>,
        k: &Array1<f64>,
        z: &Array1<f64>,
    ) -> Array2<f64> {
        let mut ps = Array2::zeros((parameters.nrows(), z.len() * k.len()));
        Zip::from(ps.rows_mut())
            .and(parameters.rows())
            .for_each(|mut row, theta| row.assign(&toy_spectrum(&theta.to_vec(), k, z)));
        ps
    }

    fn relative_error(pred: &ArrayBase<impl Data<Elem = f64>, Ix1>, truth: &Array1<f64>) -> f64 {
        (pred - truth)
            .iter()
            .zip(truth.iter())
            .map(|(d, t)| (d / t).abs())
            .fold(0., f64::max)
    }

    /// Both spectra are proportional, so the globally centered log spectra have rank one
    /// and a single component reproduces them up to the GP interpolation error.
    /// Non proportional spectra would also carry the rank-one truncation error.
    #[test]
    fn test_two_samples_one_component() {
        let parameters = array![[0.3], [0.7]];
        let z = array![0., 1.];
        let k = Array1::logspace(10., -3., 0., 15);
        let power_spectra = array![1., 1.08]
            .insert_axis(Axis(1))
            .dot(&toy_spectrum(&[1., 0.96], &k, &z).insert_axis(Axis(0)));

        let mut emulator = Emulator::new(
            &parameters,
            &z,
            &k,
            &power_spectra,
            EmulatorParams::<f64>::default().check().unwrap(),
        )
        .unwrap();
        emulator.train().expect("emulator training");
        assert!(emulator.is_trained());

        for i in 0..2 {
            let pred = emulator.predict_one(&parameters.row(i)).unwrap();
            let err = relative_error(&pred, &power_spectra.row(i).to_owned());
            assert!(err < 0.05, "relative error {err} for sample {i}");
        }
    }

    #[test]
    fn test_interpolates_training_spectra() {
        // 4 x 4 grid of (amplitude, tilt)
        let parameters = Array2::from_shape_fn((16, 2), |(i, j)| {
            if j == 0 {
                1. + (i / 4) as f64 / 3.
            } else {
                0.9 + 0.1 * (i % 4) as f64 / 3.
            }
        });
        let z = array![0., 0.5, 1.];
        let k = Array1::logspace(10., -3., 0.5, 20);
        let power_spectra = toy_training_set(&parameters, &k, &z);

        // log spectra are affine in (ln A, tilt), hence 3 components reproduce them
        let params = Emulator::params(ConstantMean(), Matern52Corr())
            .n_components(3)
            .check()
            .unwrap();
        let mut emulator = Emulator::new(&parameters, &z, &k, &power_spectra, params).unwrap();
        emulator.train().unwrap();

        let pred = emulator.predict(&parameters).unwrap();
        assert_eq!(pred.dim(), power_spectra.dim());
        Zip::from(pred.rows())
            .and(power_spectra.rows())
            .for_each(|p, t| assert!(relative_error(&p, &t.to_owned()) < 1e-3));

        let theta = array![1.5, 0.95];
        let truth = toy_spectrum(&theta.to_vec(), &k, &z);
        let pred = emulator.predict_one(&theta).unwrap();
        assert!(relative_error(&pred, &truth) < 0.05);
    }

    #[test]
    fn test_unconverged_hyperparameters_are_committed() {
        let parameters = Array2::from_shape_fn((8, 2), |(i, j)| {
            if j == 0 {
                0.8 + 0.05 * i as f64
            } else {
                0.9 + 0.03 * ((3 * i) % 8) as f64
            }
        });
        let z = array![0., 1.];
        let k = Array1::logspace(10., -2., 0., 10);
        let power_spectra = toy_training_set(&parameters, &k, &z);

        let gp_params = GpParams::new(ConstantMean(), SquaredExponentialCorr()).max_iters(1);
        let params = EmulatorParams::<f64>::default()
            .n_components(2)
            .gp_params(gp_params)
            .check()
            .unwrap();
        let mut emulator = Emulator::new(&parameters, &z, &k, &power_spectra, params).unwrap();
        emulator.train().expect("training with an exhausted iteration budget");

        let ensemble = emulator.ensemble().unwrap();
        assert_eq!(ensemble.n_components(), 2);
        for gp in ensemble.gps() {
            assert!(gp.variance().is_finite() && gp.variance() > 0.);
            assert!(gp.length_scales().iter().all(|l| l.is_finite() && *l > 0.));
        }
        assert!(ensemble.gps().iter().any(|gp| !gp.converged()));

        let pred = emulator.predict(&parameters).unwrap();
        Zip::from(pred.rows())
            .and(power_spectra.rows())
            .for_each(|p, t| assert!(relative_error(&p, &t.to_owned()) < 1e-3));
    }

    #[test]
    fn test_predict_band() {
        let parameters = Array::linspace(0.5, 1.5, 6).insert_axis(Axis(1));
        let z = array![0.];
        let k = Array1::logspace(10., -2., 0., 8);
        let thetas = Array2::from_shape_fn((6, 2), |(i, j)| {
            if j == 0 {
                parameters[[i, 0]]
            } else {
                1.
            }
        });
        let power_spectra = toy_training_set(&thetas, &k, &z);
        let params = EmulatorParams::<f64>::default()
            .n_components(2)
            .check()
            .unwrap();
        let mut emulator = Emulator::new(&parameters, &z, &k, &power_spectra, params).unwrap();
        emulator.train().unwrap();

        let x = array![[0.5], [0.77]];
        let (center, lower, upper) = emulator.predict_band(&x, 2.).unwrap();
        assert_abs_diff_eq!(center, emulator.predict(&x).unwrap(), epsilon = 1e-12);
        Zip::from(&center)
            .and(&lower)
            .and(&upper)
            .for_each(|c, l, u| assert!(l <= c && c <= u));
        // band collapses at training points
        Zip::from(center.row(0))
            .and(upper.row(0))
            .for_each(|c, u| assert_abs_diff_eq!(u / c, 1., epsilon = 1e-3));

        let wvar = emulator.predict_weights_var(&x).unwrap();
        assert_eq!(wvar.dim(), (2, 2));
        assert!(wvar.iter().all(|v| *v >= 0.));
        let w = emulator.predict_weights(&x).unwrap();
        assert_eq!(w.dim(), (2, 2));
    }

    #[test]
    fn test_mismatched_rows() {
        let parameters = array![[0.1], [0.2], [0.3]];
        let power_spectra = Array2::from_elem((2, 4), 1.);
        let res = Emulator::new(
            &parameters,
            &array![0., 1.],
            &array![0.1, 1.],
            &power_spectra,
            EmulatorParams::<f64>::default().check().unwrap(),
        );
        match res {
            Err(err @ EmulatorError::InvalidShape(_)) => assert!(err.is_usage_error()),
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_shapes() {
        let params = EmulatorParams::<f64>::default().check().unwrap();
        let parameters = array![[0.1], [0.2]];
        let power_spectra = Array2::from_elem((2, 4), 1.);
        // nz * nk != spectra length
        assert!(matches!(
            Emulator::new(
                &parameters,
                &array![0.],
                &array![0.1, 1.],
                &power_spectra,
                params.clone()
            ),
            Err(EmulatorError::InvalidShape(_))
        ));
        // no parameter dimension
        assert!(matches!(
            Emulator::new(
                &Array2::<f64>::zeros((2, 0)),
                &array![0., 1.],
                &array![0.1, 1.],
                &power_spectra,
                params.clone()
            ),
            Err(EmulatorError::InvalidShape(_))
        ));
        // empty training set
        assert!(matches!(
            Emulator::new(
                &Array2::<f64>::zeros((0, 1)),
                &array![0., 1.],
                &array![0.1, 1.],
                &Array2::<f64>::zeros((0, 4)),
                params
            ),
            Err(EmulatorError::InvalidShape(_))
        ));
        // length scales do not match parameters dimension
        let params = EmulatorParams::<f64>::default()
            .length_scales(array![1., 1., 1.])
            .check()
            .unwrap();
        assert!(matches!(
            Emulator::new(
                &array![[0.1, 1.], [0.2, 2.]],
                &array![0., 1.],
                &array![0.1, 1.],
                &power_spectra,
                params
            ),
            Err(EmulatorError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_too_many_components() {
        let params = EmulatorParams::<f64>::default()
            .n_components(3)
            .check()
            .unwrap();
        let res = Emulator::new(
            &array![[0.1], [0.2]],
            &array![0., 1.],
            &array![0.1, 1.],
            &Array2::from_elem((2, 4), 1.),
            params,
        );
        assert!(matches!(res, Err(EmulatorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_not_trained() {
        let emulator = Emulator::new(
            &array![[0.1], [0.2]],
            &array![0.],
            &array![0.1, 1.],
            &array![[1., 2.], [2., 3.]],
            EmulatorParams::<f64>::default().check().unwrap(),
        )
        .unwrap();
        assert!(!emulator.is_trained());
        assert!(matches!(
            emulator.predict(&array![[0.15]]),
            Err(EmulatorError::NotTrained)
        ));
        assert!(matches!(
            emulator.predict_one(&array![0.15]),
            Err(EmulatorError::NotTrained)
        ));
        assert!(matches!(
            emulator.principal_components(),
            Err(EmulatorError::NotTrained)
        ));
        assert!(emulator.to_string().contains("untrained"));
    }

    #[test]
    fn test_prediction_dimension_mismatch() {
        let mut emulator = Emulator::new(
            &array![[0.1], [0.2], [0.4]],
            &array![0.],
            &array![0.1, 1.],
            &array![[1., 2.], [2., 3.], [2.5, 4.]],
            EmulatorParams::<f64>::default().check().unwrap(),
        )
        .unwrap();
        emulator.train().unwrap();
        assert!(matches!(
            emulator.predict(&array![[0.15, 1.]]),
            Err(EmulatorError::InvalidShape(_))
        ));
        assert!(matches!(
            emulator.predict_one(&array![0.15, 1.]),
            Err(EmulatorError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_failed_training_keeps_previous_state() {
        let parameters = array![[0.1], [0.2], [0.4]];
        let z = array![0.];
        let k = array![0.1, 1.];
        let mut emulator = Emulator::new(
            &parameters,
            &z,
            &k,
            &array![[1., 2.], [2., 3.], [2.5, 4.]],
            EmulatorParams::<f64>::default().check().unwrap(),
        )
        .unwrap();
        emulator.train().unwrap();
        let before = emulator.predict(&array![[0.3]]).unwrap();

        // Non positive spectra cannot be log transformed
        emulator.power_spectra[[1, 1]] = -1.;
        let err = emulator.train().unwrap_err();
        assert!(matches!(err, EmulatorError::NumericalError(_)));
        assert!(err.is_data_error());
        assert!(emulator.is_trained());
        assert_abs_diff_eq!(emulator.predict(&array![[0.3]]).unwrap(), before);
    }

    #[test]
    fn test_component_fit_failure() {
        // duplicated parameter points without nugget: singular covariance
        let gp_params = GpParams::new(ConstantMean(), SquaredExponentialCorr())
            .nugget(0.)
            .tuning(boltzmann_gp::HyperTuning::Fixed);
        let params = EmulatorParams::default()
            .gp_params(gp_params)
            .check()
            .unwrap();
        let mut emulator = Emulator::new(
            &array![[0.1], [0.1], [0.4]],
            &array![0.],
            &array![0.1, 1.],
            &array![[1., 2.], [2., 3.], [2.5, 4.]],
            params,
        )
        .unwrap();
        assert!(matches!(
            emulator.train(),
            Err(EmulatorError::ComponentFit { component: 0, .. })
        ));
        assert!(!emulator.is_trained());
    }
}

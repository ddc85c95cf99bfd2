//! This library implements an emulator of Boltzmann codes: given a training set of matter
//! power spectra `P(k, z)` computed at a few points of the cosmological parameters space,
//! it predicts the power spectrum at any other point without running the Boltzmann code.
//!
//! The emulation pipeline is:
//! * [SpectrumNormalizer]: spectra are weighted by `k^2`, log transformed and normalized,
//! * [PrincipalComponents]: normalized spectra are reduced to the weights of a few
//!   principal components,
//! * [GpEnsemble]: one gaussian process per component regresses its weights over the
//!   cosmological parameters, kernel hyperparameters being fitted by maximum likelihood
//!   (see [boltzmann_gp]),
//! * [Emulator]: ties the above together and predicts spectra by combining GP weights
//!   and inverting the normalization.
//!
//! # Example
//!
//! ```no_run
//! use boltzmann_emulator::{Emulator, EmulatorParams};
//! use boltzmann_gp::correlation_models::Matern52Corr;
//! use boltzmann_gp::mean_models::ConstantMean;
//! use linfa::ParamGuard;
//! use ndarray::{array, Array1, Array2};
//!
//! // amplitudes of the training cosmologies
//! let parameters: Array2<f64> = array![[0.8], [0.9], [1.0], [1.1]];
//! let redshifts: Array1<f64> = array![0., 0.5];
//! let k: Array1<f64> = Array1::logspace(10., -3., 0., 50);
//! let power_spectra = Array2::from_shape_fn((4, 100), |(i, j)| {
//!     let (kj, zj) = (k[j % 50], redshifts[j / 50]);
//!     parameters[[i, 0]] * kj / (1. + (kj / 0.02).powi(3)) / (1. + zj).powi(2)
//! });
//!
//! let params = Emulator::params(ConstantMean(), Matern52Corr())
//!     .n_components(2)
//!     .check()
//!     .expect("valid parameters");
//! let mut emulator = Emulator::new(&parameters, &redshifts, &k, &power_spectra, params)
//!     .expect("valid training set");
//! emulator.train().expect("emulator trained");
//!
//! let (spectra, lower, upper) = emulator
//!     .predict_band(&array![[0.95]], 1.)
//!     .expect("prediction");
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod emulator;
mod ensemble;
mod errors;
mod parameters;
mod pca;
mod preprocessing;

pub use emulator::*;
pub use ensemble::*;
pub use errors::*;
pub use parameters::*;
pub use pca::*;
pub use preprocessing::*;

//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with stationary kernels whose hyperparameters (process variance and one length scale
//! per input dimension) are fitted by maximizing the log-marginal-likelihood.
//!
//! GP methods are implemented by [GaussianProcess] parameterized by [GpParams].
//!
//! The log-marginal-likelihood and its analytical gradient with respect to the
//! log hyperparameters are exposed by [MarginalLikelihood], the optimization itself
//! relies on the L-BFGS solver of [argmin](https://github.com/argmin-rs/argmin).
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod correlation_models;
mod errors;
pub mod mean_models;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use errors::*;
pub use parameters::*;
pub use utils::{input_scales, DiffMatrix};

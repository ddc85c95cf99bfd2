use boltzmann_gp::GpError;
use thiserror::Error;

/// A result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// An error when building, training or using an [`Emulator`](crate::Emulator)
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// When training or prediction arrays are malformed
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    /// When data cannot be processed numerically (e.g. non positive spectra)
    #[error("Numerical error: {0}")]
    NumericalError(String),
    /// When requested settings are not supported by the data
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// When prediction is requested before training
    #[error("Emulator is not trained, call `train()` first")]
    NotTrained,
    /// When the GP of a principal component cannot be fitted
    #[error("GP fit of component {component} failed: {source}")]
    ComponentFit {
        /// Index of the failing component
        component: usize,
        /// GP failure
        source: GpError,
    },
    /// When Gaussian Process fails
    #[error("GP error")]
    GpError(#[from] GpError),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
}

impl EmulatorError {
    /// Whether the error comes from a misuse of the API (bad shapes, bad settings, wrong lifecycle)
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidShape(_) | Self::InvalidConfiguration(_) | Self::NotTrained
        )
    }

    /// Whether the error comes from data that cannot be handled numerically
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::NumericalError(_)
                | Self::ComponentFit { .. }
                | Self::GpError(_)
                | Self::LinalgError(_)
        )
    }
}

//! A module for mean models of the GP.
//!
//! The GP used for emulation reverts to a constant level far from the training points,
//! this level being estimated once from the training outputs and kept fixed while
//! kernel hyperparameters are fitted.
//!
//! The following models are implemented:
//! * constant (sample mean of the training outputs),
//! * zero.

use linfa::Float;
use ndarray::{ArrayBase, Data, Ix1};
use paste::paste;
use std::fmt;

/// A trait for mean models used in GP regression
pub trait MeanModel<F: Float>: Clone + Copy + Default + fmt::Display + Send + Sync {
    /// Compute the constant level of the GP given the training outputs `y` (n,)
    fn offset(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F;
}

/// The sample mean of training outputs as mean of the GP
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ConstantMean();

impl<F: Float> MeanModel<F> for ConstantMean {
    fn offset(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F {
        y.mean().unwrap_or_else(F::zero)
    }
}

/// A null mean of the GP
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ZeroMean();

impl<F: Float> MeanModel<F> for ZeroMean {
    fn offset(&self, _y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F {
        F::zero()
    }
}

macro_rules! declare_mean_util_impls {
    ($regr:ident) => {
        paste! {
            impl fmt::Display for [<$regr Mean>] {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    write!(f, "{}Mean", stringify!($regr))
                }
            }
        }
    };
}

declare_mean_util_impls!(Constant);
declare_mean_util_impls!(Zero);

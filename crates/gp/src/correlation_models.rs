//! A module for stationary correlation models used as GP kernels.
//!
//! Each model is a product over input dimensions of a one-dimensional correlation
//! of the scaled distance `a_j = |x_j - x'_j| / l_j` where `l_j` is the length scale
//! of the j-th dimension. The process variance multiplying the correlation is handled
//! by the GP itself.
//!
//! The following correlation models are implemented:
//! * squared exponential,
//! * absolute exponential,
//! * matern 3/2,
//! * matern 5/2,
//! * rational quadratic with a fixed shape parameter.
//!
//! Besides the correlation value, every model provides its derivatives with respect to
//! the log length scales which are needed by the log-marginal-likelihood gradient.

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use std::fmt;

/// A trait for using a correlation model in GP regression
pub trait CorrelationModel<F: Float>: Clone + Copy + Default + fmt::Display + Send + Sync {
    /// Compute correlation values `r(x, x')` given differences `d` (n, nx) between
    /// n pairs of points and the length scales (nx,). Returns a (n,) vector.
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F>;

    /// Compute the derivatives `dr/d(ln l_j)` of the correlation values given differences `d` (n, nx)
    /// and length scales (nx,). Returns a (n, nx) matrix.
    fn log_length_scale_gradient(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F>;

    /// Compute both correlation values and their log length scale derivatives
    fn valgrad(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> (Array1<F>, Array2<F>) {
        (
            self.value(d, length_scales),
            self.log_length_scale_gradient(d, length_scales),
        )
    }
}

/// Absolute distances scaled by length scales, (n, nx)
fn scaled_distances<F: Float>(
    d: &ArrayBase<impl Data<Elem = F>, Ix2>,
    length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array2<F> {
    (d / length_scales).mapv(|v| num_traits::Float::abs(v))
}

/// Squared exponential correlation models
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SquaredExponentialCorr();

impl<F: Float> CorrelationModel<F> for SquaredExponentialCorr {
    ///  nx
    /// prod exp( - a_j^2 / 2 )
    ///  j=1
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let a = scaled_distances(d, length_scales);
        a.mapv(|v| v * v)
            .sum_axis(Axis(1))
            .mapv(|v| F::exp(F::cast(-0.5) * v))
    }

    /// dr/d(ln l_j) = a_j^2 r
    fn log_length_scale_gradient(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F> {
        let a2 = scaled_distances(d, length_scales).mapv(|v| v * v);
        let r = a2.sum_axis(Axis(1)).mapv(|v| F::exp(F::cast(-0.5) * v));
        a2 * &r.insert_axis(Axis(1))
    }
}

impl fmt::Display for SquaredExponentialCorr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SquaredExponential")
    }
}

/// Absolute exponential correlation models
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbsoluteExponentialCorr();

impl<F: Float> CorrelationModel<F> for AbsoluteExponentialCorr {
    ///  nx
    /// prod exp( - a_j )
    ///  j=1
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        scaled_distances(d, length_scales)
            .sum_axis(Axis(1))
            .mapv(|v| F::exp(-v))
    }

    /// dr/d(ln l_j) = a_j r
    fn log_length_scale_gradient(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F> {
        let a = scaled_distances(d, length_scales);
        let r = a.sum_axis(Axis(1)).mapv(|v| F::exp(-v));
        a * &r.insert_axis(Axis(1))
    }
}

impl fmt::Display for AbsoluteExponentialCorr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AbsoluteExponential")
    }
}

/// Matern 3/2 correlation model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Matern32Corr();

impl<F: Float> CorrelationModel<F> for Matern32Corr {
    ///  nx
    /// prod (1 + sqrt(3) a_j) exp( - sqrt(3) a_j )
    ///  j=1
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let a = scaled_distances(d, length_scales);
        self.compute_r(&a)
    }

    /// dr/d(ln l_j) = 3 a_j^2 / (1 + sqrt(3) a_j) r
    fn log_length_scale_gradient(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F> {
        let sqrt3 = F::cast(3.).sqrt();
        let a = scaled_distances(d, length_scales);
        let r = self.compute_r(&a);
        a.mapv(|v| F::cast(3.) * v * v / (F::one() + sqrt3 * v)) * &r.insert_axis(Axis(1))
    }
}

impl Matern32Corr {
    fn compute_r<F: Float>(&self, a: &Array2<F>) -> Array1<F> {
        let sqrt3 = F::cast(3.).sqrt();
        let poly = a
            .mapv(|v| F::one() + sqrt3 * v)
            .map_axis(Axis(1), |row| row.product());
        let expo = a.sum_axis(Axis(1)).mapv(|v| F::exp(-sqrt3 * v));
        poly * expo
    }
}

impl fmt::Display for Matern32Corr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matern32")
    }
}

/// Matern 5/2 correlation model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Matern52Corr();

impl<F: Float> CorrelationModel<F> for Matern52Corr {
    ///  nx
    /// prod (1 + sqrt(5) a_j + 5/3 a_j^2) exp( - sqrt(5) a_j )
    ///  j=1
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let a = scaled_distances(d, length_scales);
        self.compute_r(&a)
    }

    /// dr/d(ln l_j) = 5/3 a_j^2 (1 + sqrt(5) a_j) / (1 + sqrt(5) a_j + 5/3 a_j^2) r
    fn log_length_scale_gradient(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F> {
        let sqrt5 = F::cast(5.).sqrt();
        let div5_3 = F::cast(5. / 3.);
        let a = scaled_distances(d, length_scales);
        let r = self.compute_r(&a);
        a.mapv(|v| {
            div5_3 * v * v * (F::one() + sqrt5 * v) / (F::one() + sqrt5 * v + div5_3 * v * v)
        }) * &r.insert_axis(Axis(1))
    }
}

impl Matern52Corr {
    fn compute_r<F: Float>(&self, a: &Array2<F>) -> Array1<F> {
        let sqrt5 = F::cast(5.).sqrt();
        let div5_3 = F::cast(5. / 3.);
        let poly = a
            .mapv(|v| F::one() + sqrt5 * v + div5_3 * v * v)
            .map_axis(Axis(1), |row| row.product());
        let expo = a.sum_axis(Axis(1)).mapv(|v| F::exp(-sqrt5 * v));
        poly * expo
    }
}

impl fmt::Display for Matern52Corr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matern52")
    }
}

/// Default shape parameter of the rational quadratic correlation
pub const RATIONAL_QUADRATIC_DEFAULT_ALPHA: f64 = 1.;

/// Rational quadratic correlation model
///
/// A scale mixture of squared exponentials whose shape `alpha` is held fixed
/// during hyperparameters optimization. It tends to the squared exponential
/// when `alpha` goes to infinity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RationalQuadraticCorr {
    alpha: f64,
}

impl Default for RationalQuadraticCorr {
    fn default() -> Self {
        RationalQuadraticCorr {
            alpha: RATIONAL_QUADRATIC_DEFAULT_ALPHA,
        }
    }
}

impl RationalQuadraticCorr {
    /// Rational quadratic correlation with the given strictly positive shape `alpha`
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha.is_finite() && alpha > 0.) {
            return Err(GpError::InvalidValueError(format!(
                "Rational quadratic shape should be strictly positive, got {alpha}"
            )));
        }
        Ok(RationalQuadraticCorr { alpha })
    }

    /// Shape parameter
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// `1 + sum_j a_j^2 / (2 alpha)` for each pair given squared scaled distances
    fn base<F: Float>(&self, a2: &Array2<F>) -> Array1<F> {
        let two_alpha = F::cast(2. * self.alpha);
        a2.sum_axis(Axis(1)).mapv(|v| F::one() + v / two_alpha)
    }
}

impl<F: Float> CorrelationModel<F> for RationalQuadraticCorr {
    /// ```text
    ///                 nx
    /// ( 1 + 1/(2 alpha) sum a_j^2 )^-alpha
    ///                 j=1
    /// ```
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let a2 = scaled_distances(d, length_scales).mapv(|v| v * v);
        let alpha = F::cast(self.alpha);
        self.base(&a2).mapv(|b| b.powf(-alpha))
    }

    /// dr/d(ln l_j) = a_j^2 r / ( 1 + 1/(2 alpha) sum a_k^2 )
    fn log_length_scale_gradient(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F> {
        let a2 = scaled_distances(d, length_scales).mapv(|v| v * v);
        let alpha = F::cast(self.alpha);
        let factor = self
            .base(&a2)
            .mapv(|b| b.powf(-alpha - F::one()));
        a2 * &factor.insert_axis(Axis(1))
    }
}

impl fmt::Display for RationalQuadraticCorr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RationalQuadratic(alpha={})", self.alpha)
    }
}

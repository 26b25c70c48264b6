//! Stationary kernels depending on the scaled distance between points.
use super::{fmt_param, scalar_param, Bounds, Hyperparameter, KernelFunction};
use crate::errors::{GprError, Result};
use crate::utils::{broadcast_scale, differences, scaled_sq_distances};
use linfa::Float;
use ndarray::{array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

fn check_length_scale_dim<F: Float>(kernel: &str, length_scale: &Array1<F>, nx: usize) -> Result<()> {
    if length_scale.len() == 1 || length_scale.len() == nx {
        Ok(())
    } else {
        Err(GprError::InvalidValueError(format!(
            "Anisotropic {} kernel length_scale should be of size {}, got {}",
            kernel,
            nx,
            length_scale.len()
        )))
    }
}

/// Differences `x - xtrain_i` divided by squared length scales as a (m, nx) matrix
fn scaled_gradient_base<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    length_scale: &Array1<F>,
) -> Array2<F> {
    let l2 = broadcast_scale(length_scale, x.len()).mapv(|v| v * v);
    differences(x, xtrain) / &l2
}

/// Squared exponential (aka radial basis function) kernel:
///
/// k(x, x') = exp(-1/2 sum_j ((x_j - x'_j) / l_j)^2)
///
/// The kernel is isotropic when given one length scale `l`,
/// anisotropic when given one length scale per input component.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Rbf<F: Float> {
    length_scale: Array1<F>,
    length_scale_bounds: Bounds<F>,
}

impl<F: Float> Default for Rbf<F> {
    fn default() -> Self {
        Rbf::new(F::one())
    }
}

impl<F: Float> Rbf<F> {
    /// Isotropic kernel constructor
    pub fn new(length_scale: F) -> Self {
        Rbf::anisotropic(array![length_scale])
    }

    /// Anisotropic kernel constructor, one length scale per input component
    pub fn anisotropic(length_scale: Array1<F>) -> Self {
        Rbf {
            length_scale,
            length_scale_bounds: Bounds::default(),
        }
    }

    /// Set the search space of the length scale(s)
    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.length_scale_bounds = bounds;
        self
    }

    /// Keep length scale(s) fixed
    pub fn fixed(self) -> Self {
        self.with_bounds(Bounds::Fixed)
    }

    /// Length scale(s)
    pub fn length_scale(&self) -> &Array1<F> {
        &self.length_scale
    }
}

impl<F: Float> KernelFunction<F> for Rbf<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        scaled_sq_distances(x, y, &self.length_scale).mapv(|d2| F::exp(F::cast(-0.5) * d2))
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::ones(x.nrows())
    }

    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let k = self
            .cross(&x.view().insert_axis(Axis(0)), xtrain)
            .reversed_axes();
        -(scaled_gradient_base(x, xtrain, &self.length_scale) * &k)
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        vec![Hyperparameter::new(
            "length_scale",
            self.length_scale.to_owned(),
            self.length_scale_bounds,
        )]
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        match name {
            "length_scale" => self.length_scale = value.to_owned(),
            _ => {
                return Err(GprError::KernelPathError(format!(
                    "Unknown parameter {name} for RBF"
                )))
            }
        }
        Ok(())
    }

    fn check_input_dim(&self, nx: usize) -> Result<()> {
        check_length_scale_dim("RBF", &self.length_scale, nx)
    }
}

impl<F: Float> fmt::Display for Rbf<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RBF(length_scale={})", fmt_param(&self.length_scale))
    }
}

/// Smoothness parameter of the [`Matern`] kernel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Nu {
    /// nu = 1/2, absolute exponential kernel
    Half,
    /// nu = 3/2, once differentiable functions
    #[default]
    ThreeHalves,
    /// nu = 5/2, twice differentiable functions
    FiveHalves,
    /// nu = inf, equivalent to RBF kernel
    Infinite,
}

impl fmt::Display for Nu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Nu::Half => write!(f, "0.5"),
            Nu::ThreeHalves => write!(f, "1.5"),
            Nu::FiveHalves => write!(f, "2.5"),
            Nu::Infinite => write!(f, "inf"),
        }
    }
}

/// Matern kernel, with r the scaled distance between x and x':
/// * nu = 1/2: k(r) = exp(-r)
/// * nu = 3/2: k(r) = (1 + sqrt(3).r) exp(-sqrt(3).r)
/// * nu = 5/2: k(r) = (1 + sqrt(5).r + 5/3.r^2) exp(-sqrt(5).r)
/// * nu = inf: k(r) = exp(-r^2 / 2)
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Matern<F: Float> {
    length_scale: Array1<F>,
    length_scale_bounds: Bounds<F>,
    nu: Nu,
}

impl<F: Float> Default for Matern<F> {
    fn default() -> Self {
        Matern::new(F::one())
    }
}

impl<F: Float> Matern<F> {
    /// Isotropic kernel constructor (nu = 3/2)
    pub fn new(length_scale: F) -> Self {
        Matern::anisotropic(array![length_scale])
    }

    /// Anisotropic kernel constructor (nu = 3/2), one length scale per input component
    pub fn anisotropic(length_scale: Array1<F>) -> Self {
        Matern {
            length_scale,
            length_scale_bounds: Bounds::default(),
            nu: Nu::default(),
        }
    }

    /// Set the smoothness parameter
    pub fn with_nu(mut self, nu: Nu) -> Self {
        self.nu = nu;
        self
    }

    /// Set the search space of the length scale(s)
    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.length_scale_bounds = bounds;
        self
    }

    /// Keep length scale(s) fixed
    pub fn fixed(self) -> Self {
        self.with_bounds(Bounds::Fixed)
    }

    /// Length scale(s)
    pub fn length_scale(&self) -> &Array1<F> {
        &self.length_scale
    }

    /// Smoothness parameter
    pub fn nu(&self) -> Nu {
        self.nu
    }

    fn k(&self, r: F) -> F {
        match self.nu {
            Nu::Half => F::exp(-r),
            Nu::ThreeHalves => {
                let sr = F::cast(3.).sqrt() * r;
                (F::one() + sr) * F::exp(-sr)
            }
            Nu::FiveHalves => {
                let sr = F::cast(5.).sqrt() * r;
                (F::one() + sr + sr * sr / F::cast(3.)) * F::exp(-sr)
            }
            Nu::Infinite => F::exp(F::cast(-0.5) * r * r),
        }
    }

    /// dk/dr divided by r
    fn dk_over_r(&self, r: F) -> F {
        match self.nu {
            Nu::Half => {
                if r == F::zero() {
                    F::zero()
                } else {
                    -F::exp(-r) / r
                }
            }
            Nu::ThreeHalves => F::cast(-3.) * F::exp(-F::cast(3.).sqrt() * r),
            Nu::FiveHalves => {
                let sr = F::cast(5.).sqrt() * r;
                F::cast(-5. / 3.) * (F::one() + sr) * F::exp(-sr)
            }
            Nu::Infinite => -F::exp(F::cast(-0.5) * r * r),
        }
    }
}

impl<F: Float> KernelFunction<F> for Matern<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        scaled_sq_distances(x, y, &self.length_scale).mapv(|d2| self.k(d2.sqrt()))
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::ones(x.nrows())
    }

    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let r = scaled_sq_distances(&x.view().insert_axis(Axis(0)), xtrain, &self.length_scale)
            .mapv(|d2| self.dk_over_r(d2.sqrt()))
            .reversed_axes();
        scaled_gradient_base(x, xtrain, &self.length_scale) * &r
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        vec![Hyperparameter::new(
            "length_scale",
            self.length_scale.to_owned(),
            self.length_scale_bounds,
        )]
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        match name {
            "length_scale" => self.length_scale = value.to_owned(),
            _ => {
                return Err(GprError::KernelPathError(format!(
                    "Unknown parameter {name} for Matern"
                )))
            }
        }
        Ok(())
    }

    fn check_input_dim(&self, nx: usize) -> Result<()> {
        check_length_scale_dim("Matern", &self.length_scale, nx)
    }
}

impl<F: Float> fmt::Display for Matern<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Matern(length_scale={}, nu={})",
            fmt_param(&self.length_scale),
            self.nu
        )
    }
}

/// Rational quadratic kernel, a scale mixture of RBF kernels:
///
/// k(x, x') = (1 + d(x, x')^2 / (2 alpha l^2))^-alpha
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RationalQuadratic<F: Float> {
    length_scale: F,
    alpha: F,
    length_scale_bounds: Bounds<F>,
    alpha_bounds: Bounds<F>,
}

impl<F: Float> Default for RationalQuadratic<F> {
    fn default() -> Self {
        RationalQuadratic::new(F::one(), F::one())
    }
}

impl<F: Float> RationalQuadratic<F> {
    /// Constructor given length scale and scale mixture parameter alpha
    pub fn new(length_scale: F, alpha: F) -> Self {
        RationalQuadratic {
            length_scale,
            alpha,
            length_scale_bounds: Bounds::default(),
            alpha_bounds: Bounds::default(),
        }
    }

    /// Set the search space of the length scale
    pub fn with_length_scale_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.length_scale_bounds = bounds;
        self
    }

    /// Set the search space of alpha
    pub fn with_alpha_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.alpha_bounds = bounds;
        self
    }

    /// Keep both parameters fixed
    pub fn fixed(self) -> Self {
        self.with_length_scale_bounds(Bounds::Fixed)
            .with_alpha_bounds(Bounds::Fixed)
    }

    /// Length scale
    pub fn length_scale(&self) -> F {
        self.length_scale
    }

    /// Scale mixture parameter
    pub fn alpha(&self) -> F {
        self.alpha
    }

    fn base(&self, d2: F) -> F {
        F::one() + d2 / (F::cast(2.) * self.alpha)
    }
}

impl<F: Float> KernelFunction<F> for RationalQuadratic<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        scaled_sq_distances(x, y, &array![self.length_scale])
            .mapv(|d2| self.base(d2).powf(-self.alpha))
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::ones(x.nrows())
    }

    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let length_scale = array![self.length_scale];
        let factor = scaled_sq_distances(&x.view().insert_axis(Axis(0)), xtrain, &length_scale)
            .mapv(|d2| -self.base(d2).powf(-self.alpha - F::one()))
            .reversed_axes();
        scaled_gradient_base(x, xtrain, &length_scale) * &factor
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        vec![
            Hyperparameter::new(
                "length_scale",
                array![self.length_scale],
                self.length_scale_bounds,
            ),
            Hyperparameter::new("alpha", array![self.alpha], self.alpha_bounds),
        ]
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        match name {
            "length_scale" => self.length_scale = scalar_param(name, value)?,
            "alpha" => self.alpha = scalar_param(name, value)?,
            _ => {
                return Err(GprError::KernelPathError(format!(
                    "Unknown parameter {name} for RationalQuadratic"
                )))
            }
        }
        Ok(())
    }
}

impl<F: Float> fmt::Display for RationalQuadratic<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "RationalQuadratic(alpha={}, length_scale={})",
            fmt_param(&array![self.alpha]),
            fmt_param(&array![self.length_scale])
        )
    }
}

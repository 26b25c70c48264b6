use super::{fmt_param, scalar_param, Bounds, Hyperparameter, KernelFunction};
use crate::errors::{GprError, Result};
use linfa::Float;
use ndarray::{array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dot product kernel: k(x, x') = sigma_0^2 + x . x'
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct DotProduct<F: Float> {
    sigma_0: F,
    sigma_0_bounds: Bounds<F>,
}

impl<F: Float> Default for DotProduct<F> {
    fn default() -> Self {
        DotProduct::new(F::one())
    }
}

impl<F: Float> DotProduct<F> {
    /// Constructor given the inhomogeneity parameter sigma_0
    pub fn new(sigma_0: F) -> Self {
        DotProduct {
            sigma_0,
            sigma_0_bounds: Bounds::default(),
        }
    }

    /// Set the search space of sigma_0
    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.sigma_0_bounds = bounds;
        self
    }

    /// Keep sigma_0 fixed
    pub fn fixed(self) -> Self {
        self.with_bounds(Bounds::Fixed)
    }

    /// Inhomogeneity parameter
    pub fn sigma_0(&self) -> F {
        self.sigma_0
    }
}

impl<F: Float> KernelFunction<F> for DotProduct<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let s2 = self.sigma_0 * self.sigma_0;
        x.dot(&y.t()).mapv(|v| v + s2)
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        let s2 = self.sigma_0 * self.sigma_0;
        x.mapv(|v| v * v).sum_axis(Axis(1)).mapv(|v| v + s2)
    }

    fn gradient_x(
        &self,
        _x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        xtrain.to_owned()
    }

    fn diag_gradient_x(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        x.mapv(|v| F::cast(2.) * v)
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        vec![Hyperparameter::new(
            "sigma_0",
            array![self.sigma_0],
            self.sigma_0_bounds,
        )]
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        match name {
            "sigma_0" => self.sigma_0 = scalar_param(name, value)?,
            _ => {
                return Err(GprError::KernelPathError(format!(
                    "Unknown parameter {name} for DotProduct"
                )))
            }
        }
        Ok(())
    }
}

impl<F: Float> fmt::Display for DotProduct<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DotProduct(sigma_0={})", fmt_param(&array![self.sigma_0]))
    }
}

use super::{fmt_param, scalar_param, Bounds, Hyperparameter, KernelFunction};
use crate::errors::{GprError, Result};
use linfa::Float;
use ndarray::{array, Array1, Array2, ArrayBase, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Constant kernel: k(x, x') = constant_value
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ConstantKernel<F: Float> {
    constant_value: F,
    constant_value_bounds: Bounds<F>,
}

impl<F: Float> Default for ConstantKernel<F> {
    fn default() -> Self {
        ConstantKernel::new(F::one())
    }
}

impl<F: Float> ConstantKernel<F> {
    /// Constructor given a constant value
    pub fn new(constant_value: F) -> Self {
        ConstantKernel {
            constant_value,
            constant_value_bounds: Bounds::default(),
        }
    }

    /// Set the search space of the constant value
    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.constant_value_bounds = bounds;
        self
    }

    /// Keep the constant value fixed
    pub fn fixed(self) -> Self {
        self.with_bounds(Bounds::Fixed)
    }

    /// Constant value
    pub fn constant_value(&self) -> F {
        self.constant_value
    }
}

impl<F: Float> KernelFunction<F> for ConstantKernel<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        Array2::from_elem((x.nrows(), y.nrows()), self.constant_value)
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.constant_value)
    }

    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        Array2::zeros((xtrain.nrows(), x.len()))
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        vec![Hyperparameter::new(
            "constant_value",
            array![self.constant_value],
            self.constant_value_bounds,
        )]
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        match name {
            "constant_value" => self.constant_value = scalar_param(name, value)?,
            _ => {
                return Err(GprError::KernelPathError(format!(
                    "Unknown parameter {name} for ConstantKernel"
                )))
            }
        }
        Ok(())
    }
}

impl<F: Float> fmt::Display for ConstantKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}**2", fmt_param(&array![self.constant_value.sqrt()]))
    }
}

/// White noise kernel modeling independently and identically normally-distributed
/// observation noise: k(x, x') = noise_level if x == x' else 0.
///
/// The noise only shows up on the diagonal of the self covariance k(X):
/// the cross covariance k(X, Y) is always zero, even when called with Y = X.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct WhiteKernel<F: Float> {
    noise_level: F,
    noise_level_bounds: Bounds<F>,
}

impl<F: Float> Default for WhiteKernel<F> {
    fn default() -> Self {
        WhiteKernel::new(F::one())
    }
}

impl<F: Float> WhiteKernel<F> {
    /// Constructor given a noise level
    pub fn new(noise_level: F) -> Self {
        WhiteKernel {
            noise_level,
            noise_level_bounds: Bounds::default(),
        }
    }

    /// Set the search space of the noise level
    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.noise_level_bounds = bounds;
        self
    }

    /// Keep the noise level fixed
    pub fn fixed(self) -> Self {
        self.with_bounds(Bounds::Fixed)
    }

    /// Noise level
    pub fn noise_level(&self) -> F {
        self.noise_level
    }
}

impl<F: Float> KernelFunction<F> for WhiteKernel<F> {
    fn value(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        Array2::<F>::eye(x.nrows()) * self.noise_level
    }

    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        Array2::zeros((x.nrows(), y.nrows()))
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.noise_level)
    }

    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        Array2::zeros((xtrain.nrows(), x.len()))
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        vec![Hyperparameter::new(
            "noise_level",
            array![self.noise_level],
            self.noise_level_bounds,
        )]
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        match name {
            "noise_level" => self.noise_level = scalar_param(name, value)?,
            _ => {
                return Err(GprError::KernelPathError(format!(
                    "Unknown parameter {name} for WhiteKernel"
                )))
            }
        }
        Ok(())
    }
}

impl<F: Float> fmt::Display for WhiteKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "WhiteKernel(noise_level={})",
            fmt_param(&array![self.noise_level])
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant_kernel() {
        let x = array![[0., 1.], [2., 3.], [4., 5.]];
        let y = array![[1., 1.]];
        let kernel = ConstantKernel::new(2.5);
        assert_abs_diff_eq!(kernel.value(&x), Array2::from_elem((3, 3), 2.5));
        assert_abs_diff_eq!(kernel.cross(&x, &y), Array2::from_elem((3, 1), 2.5));
        assert_abs_diff_eq!(kernel.diag(&x), Array1::from_elem(3, 2.5));
        assert_eq!(kernel.to_string(), "1.581**2");
    }

    #[test]
    fn test_white_kernel() {
        let x = array![[0., 1.], [2., 3.], [4., 5.]];
        let kernel = WhiteKernel::new(0.5);
        assert_abs_diff_eq!(kernel.value(&x), Array2::eye(3) * 0.5);
        assert_abs_diff_eq!(kernel.cross(&x, &x), Array2::zeros((3, 3)));
        assert_abs_diff_eq!(kernel.diag(&x), Array1::from_elem(3, 0.5));
        assert_eq!(kernel.to_string(), "WhiteKernel(noise_level=0.5)");
    }

    #[test]
    fn test_set_hyperparameter() {
        let mut kernel = WhiteKernel::new(0.5);
        kernel.set_hyperparameter("noise_level", &array![0.]).unwrap();
        assert_eq!(kernel.noise_level(), 0.);
        assert!(kernel.set_hyperparameter("noise_level", &array![0., 1.]).is_err());
        assert!(kernel.set_hyperparameter("length_scale", &array![1.]).is_err());

        let mut kernel = ConstantKernel::<f64>::default().fixed();
        assert!(kernel.hyperparameters()[0].is_fixed());
        kernel.set_hyperparameter("constant_value", &array![3.]).unwrap();
        assert_eq!(kernel.constant_value(), 3.);
    }
}

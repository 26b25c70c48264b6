//! A module for covariance kernels used as GP prior.
//!
//! Leaf kernels are:
//! * constant ([`ConstantKernel`]),
//! * white noise ([`WhiteKernel`]),
//! * dot product ([`DotProduct`]),
//! * squared exponential ([`Rbf`]),
//! * matern with nu in {1/2, 3/2, 5/2, inf} ([`Matern`]),
//! * rational quadratic ([`RationalQuadratic`]).
//!
//! Leaves are combined in a [`Kernel`] expression tree with `+` and `*` operators:
//!
//! ```
//! use bogp::kernels::*;
//!
//! let kernel: Kernel<f64> = ConstantKernel::new(2.) * Rbf::new(0.5) + WhiteKernel::new(1e-3);
//! assert_eq!(kernel.to_string(), "1.414**2 * RBF(length_scale=0.5) + WhiteKernel(noise_level=0.001)");
//! assert_eq!(kernel.hyperparameters()[2].name, "k2__noise_level");
//! ```
mod constant;
mod dot_product;
mod hyperparameter;
mod path;
mod stationary;

pub use constant::*;
pub use dot_product::*;
pub use hyperparameter::*;
pub use path::*;
pub use stationary::*;

use crate::errors::{GprError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// A trait for covariance functions k(x, x') used as GP prior
pub trait KernelFunction<F: Float>: Clone + fmt::Display + Sync {
    /// Compute the self covariance matrix k(X) of given (n, nx) points
    /// as a (n, n) matrix. It differs from `cross(x, x)` only for kernels
    /// modeling observation noise.
    fn value(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        self.cross(x, x)
    }

    /// Compute the cross covariance matrix k(X, Y) between (n, nx) points `x`
    /// and (m, nx) points `y` as a (n, m) matrix.
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F>;

    /// Compute the diagonal of the self covariance matrix k(X) as a (n,) vector
    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F>;

    /// Compute the jacobian of `k(x, xtrain)` wrt the query point `x` (nx,)
    /// given (m, nx) `xtrain` points, as a (m, nx) matrix.
    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F>;

    /// Compute the gradient of `k(x, x)` wrt x (nx,)
    fn diag_gradient_x(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        Array1::zeros(x.len())
    }

    /// Hyperparameters in declaration order
    fn hyperparameters(&self) -> Vec<Hyperparameter<F>>;

    /// Set the value of the hyperparameter named `name`
    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()>;

    /// Check the kernel is compatible with input points of dimension `nx`
    fn check_input_dim(&self, _nx: usize) -> Result<()> {
        Ok(())
    }
}

/// Covariance kernel expression
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Kernel<F: Float> {
    /// Constant kernel
    Constant(ConstantKernel<F>),
    /// White noise kernel
    White(WhiteKernel<F>),
    /// Dot product kernel
    DotProduct(DotProduct<F>),
    /// Squared exponential kernel
    Rbf(Rbf<F>),
    /// Matern kernel
    Matern(Matern<F>),
    /// Rational quadratic kernel
    RationalQuadratic(RationalQuadratic<F>),
    /// k1 + k2
    Sum(Box<Kernel<F>>, Box<Kernel<F>>),
    /// k1 * k2
    Product(Box<Kernel<F>>, Box<Kernel<F>>),
}

macro_rules! dispatch {
    ($kernel:expr, $k:ident => $leaf:expr, ($k1:ident, $k2:ident) => sum: $sum:expr, product: $prod:expr) => {
        match $kernel {
            Kernel::Constant($k) => $leaf,
            Kernel::White($k) => $leaf,
            Kernel::DotProduct($k) => $leaf,
            Kernel::Rbf($k) => $leaf,
            Kernel::Matern($k) => $leaf,
            Kernel::RationalQuadratic($k) => $leaf,
            Kernel::Sum($k1, $k2) => $sum,
            Kernel::Product($k1, $k2) => $prod,
        }
    };
}

impl<F: Float> KernelFunction<F> for Kernel<F> {
    fn value(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        dispatch!(self, k => k.value(x),
            (k1, k2) => sum: k1.value(x) + k2.value(x),
            product: k1.value(x) * k2.value(x))
    }

    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        dispatch!(self, k => k.cross(x, y),
            (k1, k2) => sum: k1.cross(x, y) + k2.cross(x, y),
            product: k1.cross(x, y) * k2.cross(x, y))
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        dispatch!(self, k => k.diag(x),
            (k1, k2) => sum: k1.diag(x) + k2.diag(x),
            product: k1.diag(x) * k2.diag(x))
    }

    fn gradient_x(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        dispatch!(self, k => k.gradient_x(x, xtrain),
            (k1, k2) => sum: k1.gradient_x(x, xtrain) + k2.gradient_x(x, xtrain),
            product: {
                // d(k1.k2) = k1.dk2 + k2.dk1, k values as (m, 1) columns
                let xrow = x.view().insert_axis(Axis(0));
                let v1 = k1.cross(&xrow, xtrain).reversed_axes();
                let v2 = k2.cross(&xrow, xtrain).reversed_axes();
                k2.gradient_x(x, xtrain) * &v1 + k1.gradient_x(x, xtrain) * &v2
            })
    }

    fn diag_gradient_x(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        dispatch!(self, k => k.diag_gradient_x(x),
            (k1, k2) => sum: k1.diag_gradient_x(x) + k2.diag_gradient_x(x),
            product: {
                let xrow = x.view().insert_axis(Axis(0));
                let d1 = k1.diag(&xrow)[0];
                let d2 = k2.diag(&xrow)[0];
                k2.diag_gradient_x(x).mapv(|v| v * d1) + k1.diag_gradient_x(x).mapv(|v| v * d2)
            })
    }

    fn hyperparameters(&self) -> Vec<Hyperparameter<F>> {
        let children = |k1: &Kernel<F>, k2: &Kernel<F>| {
            k1.hyperparameters()
                .into_iter()
                .map(|hp| hp.prefixed(Operand::K1.name()))
                .chain(
                    k2.hyperparameters()
                        .into_iter()
                        .map(|hp| hp.prefixed(Operand::K2.name())),
                )
                .collect()
        };
        dispatch!(self, k => k.hyperparameters(),
            (k1, k2) => sum: children(k1, k2),
            product: children(k1, k2))
    }

    fn set_hyperparameter(&mut self, name: &str, value: &Array1<F>) -> Result<()> {
        let forward = |k1: &mut Kernel<F>, k2: &mut Kernel<F>| {
            let (head, tail) = name.split_once(PATH_SEPARATOR).ok_or_else(|| {
                GprError::KernelPathError(format!(
                    "Parameter {name} should be prefixed by a k1 or k2 operand"
                ))
            })?;
            match head.parse::<Operand>()? {
                Operand::K1 => k1.set_hyperparameter(tail, value),
                Operand::K2 => k2.set_hyperparameter(tail, value),
            }
        };
        dispatch!(self, k => k.set_hyperparameter(name, value),
            (k1, k2) => sum: forward(k1, k2),
            product: forward(k1, k2))
    }

    fn check_input_dim(&self, nx: usize) -> Result<()> {
        dispatch!(self, k => k.check_input_dim(nx),
            (k1, k2) => sum: k1.check_input_dim(nx).and_then(|_| k2.check_input_dim(nx)),
            product: k1.check_input_dim(nx).and_then(|_| k2.check_input_dim(nx)))
    }
}

impl<F: Float> Default for Kernel<F> {
    /// `ConstantKernel(1, fixed) * RBF(1, fixed)`
    fn default() -> Self {
        ConstantKernel::new(F::one()).fixed() * Rbf::new(F::one()).fixed()
    }
}

impl<F: Float> Kernel<F> {
    /// Get the sub-kernel addressed by `path`
    pub fn get(&self, path: &KernelPath) -> Result<&Kernel<F>> {
        path.operands().iter().try_fold(self, |node, op| match node {
            Kernel::Sum(k1, k2) | Kernel::Product(k1, k2) => match op {
                Operand::K1 => Ok(k1.as_ref()),
                Operand::K2 => Ok(k2.as_ref()),
            },
            leaf => Err(GprError::KernelPathError(format!(
                "Path {path} goes through leaf kernel {leaf}"
            ))),
        })
    }

    /// Get the sub-kernel addressed by `path` as mutable
    pub fn get_mut(&mut self, path: &KernelPath) -> Result<&mut Kernel<F>> {
        let mut node = self;
        for op in path.operands() {
            node = match node {
                Kernel::Sum(k1, k2) | Kernel::Product(k1, k2) => match op {
                    Operand::K1 => k1.as_mut(),
                    Operand::K2 => k2.as_mut(),
                },
                leaf => {
                    return Err(GprError::KernelPathError(format!(
                        "Path {path} goes through leaf kernel {leaf}"
                    )))
                }
            };
        }
        Ok(node)
    }

    /// Replace the sub-kernel addressed by `path` with `kernel`.
    /// Returns the replaced sub-kernel.
    pub fn replace(&mut self, path: &KernelPath, kernel: impl Into<Kernel<F>>) -> Result<Kernel<F>> {
        let node = self.get_mut(path)?;
        Ok(std::mem::replace(node, kernel.into()))
    }

    /// Get the value of the hyperparameter given its full name (ex: `k2__noise_level`)
    pub fn param(&self, name: &str) -> Result<Array1<F>> {
        self.hyperparameters()
            .into_iter()
            .find(|hp| hp.name == name)
            .map(|hp| hp.value)
            .ok_or_else(|| GprError::KernelPathError(format!("Unknown parameter {name}")))
    }

    /// Set all components of the hyperparameter given its full name (ex: `k2__noise_level`)
    /// to the given `value`
    pub fn set_param(&mut self, name: &str, value: F) -> Result<()> {
        let current = self.param(name)?;
        self.set_hyperparameter(name, &Array1::from_elem(current.len(), value))
    }

    /// Number of optimized hyperparameter components
    pub fn n_dims(&self) -> usize {
        self.hyperparameters()
            .iter()
            .filter(|hp| !hp.is_fixed())
            .map(|hp| hp.n_elements())
            .sum()
    }

    /// Log-transformed values of non fixed hyperparameters in tree order
    pub fn theta(&self) -> Array1<F> {
        self.hyperparameters()
            .iter()
            .filter(|hp| !hp.is_fixed())
            .flat_map(|hp| hp.value.iter().map(|v| v.ln()).collect::<Vec<_>>())
            .collect()
    }

    /// Set non fixed hyperparameters from their log-transformed values
    pub fn set_theta(&mut self, theta: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<()> {
        if theta.len() != self.n_dims() {
            return Err(GprError::InvalidValueError(format!(
                "Expected theta of size {}, got {}",
                self.n_dims(),
                theta.len()
            )));
        }
        let mut offset = 0;
        for hp in self.hyperparameters().iter().filter(|hp| !hp.is_fixed()) {
            let n = hp.n_elements();
            let value = theta
                .slice(ndarray::s![offset..offset + n])
                .mapv(|v| v.exp());
            self.set_hyperparameter(&hp.name, &value)?;
            offset += n;
        }
        Ok(())
    }

    /// A copy of this kernel with given log-transformed hyperparameters
    pub fn with_theta(&self, theta: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Kernel<F>> {
        let mut kernel = self.clone();
        kernel.set_theta(theta)?;
        Ok(kernel)
    }

    /// Log-transformed bounds of non fixed hyperparameters, one per theta component
    pub fn bounds(&self) -> Vec<(F, F)> {
        self.hyperparameters()
            .iter()
            .filter_map(|hp| {
                hp.bounds
                    .log_bounds()
                    .map(|b| std::iter::repeat(b).take(hp.n_elements()))
            })
            .flatten()
            .collect()
    }

    /// Check hyperparameter values and bounds consistency
    pub fn validate(&self) -> Result<()> {
        for hp in self.hyperparameters() {
            if let Bounds::Range(lo, up) = hp.bounds {
                if !(lo > F::zero() && lo <= up) {
                    return Err(GprError::InvalidValueError(format!(
                        "Bounds of {} should verify 0 < lower <= upper, got ({}, {})",
                        hp.name, lo, up
                    )));
                }
            }
            if hp.value.iter().any(|v| !v.is_finite() || *v < F::zero()) {
                return Err(GprError::InvalidValueError(format!(
                    "Parameter {} should be positive, got {}",
                    hp.name, hp.value
                )));
            }
            let strictly_positive = hp.name.ends_with("length_scale") || hp.name.ends_with("alpha");
            if strictly_positive && hp.value.iter().any(|v| *v == F::zero()) {
                return Err(GprError::InvalidValueError(format!(
                    "Parameter {} should be strictly positive, got {}",
                    hp.name, hp.value
                )));
            }
        }
        Ok(())
    }
}

impl<F: Float> fmt::Display for Kernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let operand = |k: &Kernel<F>| match k {
            Kernel::Sum(_, _) => format!("({k})"),
            _ => k.to_string(),
        };
        dispatch!(self, k => write!(f, "{k}"),
            (k1, k2) => sum: write!(f, "{k1} + {k2}"),
            product: write!(f, "{} * {}", operand(k1), operand(k2)))
    }
}

impl<F: Float, K: Into<Kernel<F>>> Add<K> for Kernel<F> {
    type Output = Kernel<F>;

    fn add(self, rhs: K) -> Kernel<F> {
        Kernel::Sum(Box::new(self), Box::new(rhs.into()))
    }
}

impl<F: Float, K: Into<Kernel<F>>> Mul<K> for Kernel<F> {
    type Output = Kernel<F>;

    fn mul(self, rhs: K) -> Kernel<F> {
        Kernel::Product(Box::new(self), Box::new(rhs.into()))
    }
}

/// Implements conversion into [`Kernel`] and kernel algebra for leaf kernels
macro_rules! impl_leaf_kernel {
    ($leaf:ident, $variant:ident) => {
        impl<F: Float> From<$leaf<F>> for Kernel<F> {
            fn from(k: $leaf<F>) -> Kernel<F> {
                Kernel::$variant(k)
            }
        }

        impl<F: Float, K: Into<Kernel<F>>> Add<K> for $leaf<F> {
            type Output = Kernel<F>;

            fn add(self, rhs: K) -> Kernel<F> {
                Kernel::from(self) + rhs
            }
        }

        impl<F: Float, K: Into<Kernel<F>>> Mul<K> for $leaf<F> {
            type Output = Kernel<F>;

            fn mul(self, rhs: K) -> Kernel<F> {
                Kernel::from(self) * rhs
            }
        }
    };
}

impl_leaf_kernel!(ConstantKernel, Constant);
impl_leaf_kernel!(WhiteKernel, White);
impl_leaf_kernel!(DotProduct, DotProduct);
impl_leaf_kernel!(Rbf, Rbf);
impl_leaf_kernel!(Matern, Matern);
impl_leaf_kernel!(RationalQuadratic, RationalQuadratic);

/// Format a hyperparameter value with at most 3 decimals
pub(crate) fn fmt_param<F: Float>(value: &Array1<F>) -> String {
    let fmt_float = |v: &F| {
        let s = format!("{v:.3}");
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            s
        }
    };
    if value.len() == 1 {
        fmt_float(&value[0])
    } else {
        let values = value.iter().map(fmt_float).collect::<Vec<_>>();
        format!("[{}]", values.join(", "))
    }
}

/// Get the scalar value of a single-component hyperparameter
pub(crate) fn scalar_param<F: Float>(name: &str, value: &Array1<F>) -> Result<F> {
    if value.len() == 1 {
        Ok(value[0])
    } else {
        Err(GprError::InvalidValueError(format!(
            "Parameter {name} is a scalar, got {} values",
            value.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::StandardNormal;
    use ndarray_rand::RandomExt;
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;

    fn xdata() -> Array2<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        Array::random_using((6, 3), StandardNormal, &mut rng)
    }

    #[test]
    fn test_default_kernel() {
        let kernel = Kernel::<f64>::default();
        assert_eq!(kernel.to_string(), "1**2 * RBF(length_scale=1)");
        assert_eq!(kernel.n_dims(), 0);
        assert_eq!(kernel.theta().len(), 0);
        assert!(kernel.bounds().is_empty());
    }

    #[test]
    fn test_kernel_algebra() {
        let kernel = Rbf::new(1.) + Matern::new(2.) * WhiteKernel::new(0.5);
        match &kernel {
            Kernel::Sum(k1, k2) => {
                assert!(matches!(k1.as_ref(), Kernel::Rbf(_)));
                assert!(matches!(k2.as_ref(), Kernel::Product(_, _)));
            }
            _ => panic!("Expected a sum kernel"),
        }
        let kernel = (Rbf::new(1.) + WhiteKernel::new(0.5)) * ConstantKernel::new(4.);
        assert_eq!(
            kernel.to_string(),
            "(RBF(length_scale=1) + WhiteKernel(noise_level=0.5)) * 2**2"
        );
    }

    #[test]
    fn test_sum_product_values() {
        let x = xdata();
        let rbf = Rbf::new(1.5);
        let mat = Matern::new(0.7);
        let sum = Kernel::from(rbf.clone()) + mat.clone();
        let prod = Kernel::from(rbf.clone()) * mat.clone();
        assert_abs_diff_eq!(sum.value(&x), rbf.value(&x) + mat.value(&x), epsilon = 1e-12);
        assert_abs_diff_eq!(prod.value(&x), rbf.value(&x) * mat.value(&x), epsilon = 1e-12);
        let sum_value = sum.value(&x);
        assert_abs_diff_eq!(sum.diag(&x), sum_value.diag(), epsilon = 1e-12);
        let prod_value = prod.value(&x);
        assert_abs_diff_eq!(prod.diag(&x), prod_value.diag(), epsilon = 1e-12);
    }

    #[test]
    fn test_white_self_and_cross_covariance() {
        let x = xdata();
        let kernel = Rbf::new(1.) + WhiteKernel::new(0.1);
        let value = kernel.value(&x);
        let cross = kernel.cross(&x, &x);
        assert_abs_diff_eq!(
            value - cross,
            Array2::eye(x.nrows()) * 0.1,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(kernel.diag(&x), Array1::from_elem(x.nrows(), 1.1), epsilon = 1e-12);
    }

    #[test]
    fn test_hyperparameters_and_theta() {
        let mut kernel = ConstantKernel::new(2.)
            * Rbf::anisotropic(array![1., 2.]).with_bounds(Bounds::Range(1e-2, 1e2))
            + WhiteKernel::new(1.).fixed();
        let names = kernel
            .hyperparameters()
            .into_iter()
            .map(|hp| hp.name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["k1__k1__constant_value", "k1__k2__length_scale", "k2__noise_level"]
        );
        assert_eq!(kernel.n_dims(), 3);
        assert_abs_diff_eq!(
            kernel.theta(),
            array![2f64.ln(), 0., 2f64.ln()],
            epsilon = 1e-12
        );
        let bounds = kernel.bounds();
        assert_eq!(bounds.len(), 3);
        assert_abs_diff_eq!(bounds[1].0, 1e-2f64.ln(), epsilon = 1e-12);

        kernel.set_theta(&array![0., 1., -1.]).unwrap();
        assert_abs_diff_eq!(kernel.param("k1__k1__constant_value").unwrap(), array![1.]);
        assert_abs_diff_eq!(
            kernel.param("k1__k2__length_scale").unwrap(),
            array![1f64.exp(), (-1f64).exp()],
            epsilon = 1e-12
        );
        assert!(kernel.set_theta(&array![0.]).is_err());
    }

    #[test]
    fn test_get_replace_and_set_param() {
        let mut kernel = Matern::new(1.) + Rbf::new(1.) * WhiteKernel::new(1.);
        let path: KernelPath = "k2__k2".parse().unwrap();
        assert!(matches!(kernel.get(&path).unwrap(), Kernel::White(_)));
        assert!(kernel.get(&"k1__k1".parse().unwrap()).is_err());

        let old = kernel.replace(&path, ConstantKernel::new(3.)).unwrap();
        assert!(matches!(old, Kernel::White(_)));
        assert!(matches!(kernel.get(&path).unwrap(), Kernel::Constant(_)));

        kernel.set_param("k2__k2__constant_value", 5.).unwrap();
        assert_abs_diff_eq!(kernel.param("k2__k2__constant_value").unwrap(), array![5.]);
        assert!(kernel.set_param("k2__k2__noise_level", 0.).is_err());
        assert!(kernel.set_param("k3__length_scale", 0.).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Kernel::from(Rbf::new(1.)).validate().is_ok());
        assert!(Kernel::from(Rbf::new(0.)).validate().is_err());
        assert!(Kernel::from(WhiteKernel::new(0.)).validate().is_ok());
        assert!(Kernel::from(WhiteKernel::new(-1.)).validate().is_err());
        let kernel = Kernel::from(Rbf::new(1.).with_bounds(Bounds::Range(2., 1.)));
        assert!(kernel.validate().is_err());
    }

    #[test]
    fn test_check_input_dim() {
        let kernel = Rbf::anisotropic(array![1., 2.]) + WhiteKernel::new(1.);
        assert!(kernel.check_input_dim(2).is_ok());
        assert!(kernel.check_input_dim(3).is_err());
        assert!(Kernel::from(Rbf::new(1.)).check_input_dim(3).is_ok());
    }

    macro_rules! test_kernel_gradient {
        ($name:ident, $kernel:expr) => {
            paste! {
                #[test]
                fn [<test_ $name _gradient_x>]() {
                    let kernel: Kernel<f64> = $kernel.into();
                    let xtrain = xdata();
                    let x = array![0.3, -0.5, 1.2];
                    let grad = kernel.gradient_x(&x, &xtrain);
                    assert_eq!(grad.dim(), (xtrain.nrows(), 3));

                    for i in 0..xtrain.nrows() {
                        let xi = xtrain.row(i).to_owned().insert_axis(Axis(0));
                        let f = |x: &Vec<f64>| -> f64 {
                            let x = Array::from_shape_vec((1, x.len()), x.to_vec()).unwrap();
                            kernel.cross(&x, &xi)[[0, 0]]
                        };
                        let fdiff = x.to_vec().central_diff(&f);
                        assert_abs_diff_eq!(grad.row(i), Array1::from(fdiff), epsilon = 1e-6);
                    }

                    let f = |x: &Vec<f64>| -> f64 {
                        let x = Array::from_shape_vec((1, x.len()), x.to_vec()).unwrap();
                        kernel.diag(&x)[0]
                    };
                    let fdiff = x.to_vec().central_diff(&f);
                    assert_abs_diff_eq!(kernel.diag_gradient_x(&x), Array1::from(fdiff), epsilon = 1e-6);
                }
            }
        };
    }

    test_kernel_gradient!(constant, ConstantKernel::new(2.));
    test_kernel_gradient!(white, WhiteKernel::new(2.));
    test_kernel_gradient!(dot_product, DotProduct::new(0.5));
    test_kernel_gradient!(rbf, Rbf::new(1.3));
    test_kernel_gradient!(rbf_anisotropic, Rbf::anisotropic(array![0.5, 1., 2.]));
    test_kernel_gradient!(matern12, Matern::new(1.5).with_nu(Nu::Half));
    test_kernel_gradient!(matern32, Matern::new(1.5));
    test_kernel_gradient!(matern52, Matern::anisotropic(array![0.5, 1., 2.]).with_nu(Nu::FiveHalves));
    test_kernel_gradient!(matern_inf, Matern::new(1.5).with_nu(Nu::Infinite));
    test_kernel_gradient!(rational_quadratic, RationalQuadratic::new(1.5, 0.7));
    test_kernel_gradient!(sum, Rbf::new(1.) + Matern::new(2.));
    test_kernel_gradient!(product, ConstantKernel::new(3.) * Rbf::new(1.) * DotProduct::new(1.));
    test_kernel_gradient!(noisy_sum, Matern::new(1.).with_nu(Nu::FiveHalves) + WhiteKernel::new(0.1));
}

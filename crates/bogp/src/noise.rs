//! Observation noise handling.
//!
//! A [`WhiteKernel`] term added to the prior kernel models i.i.d. gaussian
//! observation noise. Its level is fitted along with the other hyperparameters
//! then set to zero in the fitted kernel, so that the predictive standard
//! deviation reports the uncertainty of the latent function instead of the
//! one of noisy observations.
use crate::kernels::{Bounds, Kernel, KernelPath, Operand, WhiteKernel};
use linfa::Float;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Noise model added to the kernel when fitting a GP regressor
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum NoiseModel<F: Float> {
    /// Gaussian noise which level is estimated by likelihood maximization
    Gaussian,
    /// Gaussian noise of given constant level
    Fixed(F),
}

impl<F: Float> NoiseModel<F> {
    /// White kernel term corresponding to the noise model
    pub fn white_kernel(&self) -> WhiteKernel<F> {
        match self {
            NoiseModel::Gaussian => WhiteKernel::default(),
            NoiseModel::Fixed(level) => WhiteKernel::new(*level).fixed(),
        }
    }
}

/// Look for a [`WhiteKernel`] among the additive terms of `kernel`.
///
/// Only sum nodes are walked through: for a sum, the left operand is checked
/// before the right one, a white kernel operand is returned right away,
/// otherwise the search goes on within that operand. Products are never
/// entered, so `Matern + RBF * White` holds no additive white kernel.
pub fn white_kernel_in_sum<F: Float>(kernel: &Kernel<F>) -> Option<KernelPath> {
    match kernel {
        Kernel::Sum(k1, k2) => [(Operand::K1, k1), (Operand::K2, k2)]
            .into_iter()
            .find_map(|(op, child)| match child.as_ref() {
                Kernel::White(_) => Some(KernelPath::root().child(op)),
                _ => white_kernel_in_sum(child).map(|path| path.under(op)),
            }),
        _ => None,
    }
}

/// Same as [`white_kernel_in_sum`] but returns whether a white kernel is present
/// and its path as a string (ex: `k1__k2`), `"_"` when absent.
pub fn param_for_white_kernel_in_sum<F: Float>(kernel: &Kernel<F>) -> (bool, String) {
    match white_kernel_in_sum(kernel) {
        Some(path) => (true, path.to_string()),
        None => (false, "_".to_string()),
    }
}

/// Extract the noise level of the white kernel term of `kernel`, if any,
/// and replace this term with a zero-level white kernel.
///
/// The kernel may be a bare white kernel or hold one in its additive terms.
/// A bare white kernel models observations as pure noise: its level is still
/// reported and the resulting kernel is identically zero.
pub fn extract_noise<F: Float>(kernel: &mut Kernel<F>) -> Option<F> {
    let path = match &*kernel {
        Kernel::White(_) => KernelPath::root(),
        _ => white_kernel_in_sum(kernel)?,
    };
    let zero = WhiteKernel::new(F::zero()).with_bounds(Bounds::Fixed);
    match kernel.replace(&path, zero) {
        Ok(Kernel::White(white)) => Some(white.noise_level()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{KernelFunction, Matern, Rbf};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_white_kernel_in_sum() {
        let kernel = Rbf::new(1.) + WhiteKernel::new(1.);
        assert_eq!(white_kernel_in_sum(&kernel), Some("k2".parse().unwrap()));

        let kernel = WhiteKernel::new(1.) + Rbf::new(1.);
        assert_eq!(white_kernel_in_sum(&kernel), Some("k1".parse().unwrap()));

        let kernel = Matern::new(1.) + Rbf::new(1.) + WhiteKernel::new(1.);
        assert_eq!(param_for_white_kernel_in_sum(&kernel), (true, "k2".to_string()));

        let kernel = Rbf::new(1.) + (Matern::new(1.) + WhiteKernel::new(1.));
        assert_eq!(
            param_for_white_kernel_in_sum(&kernel),
            (true, "k2__k2".to_string())
        );

        let kernel = (Matern::new(1.) + WhiteKernel::new(1.)) + WhiteKernel::new(2.);
        assert_eq!(
            param_for_white_kernel_in_sum(&kernel),
            (true, "k1__k2".to_string())
        );
    }

    #[test]
    fn test_no_white_kernel_in_sum() {
        let kernel = Matern::new(1.) + Rbf::new(1.) * WhiteKernel::new(1.);
        assert_eq!(
            param_for_white_kernel_in_sum(&kernel),
            (false, "_".to_string())
        );
        let kernel = Kernel::from(WhiteKernel::new(1.));
        assert!(white_kernel_in_sum(&kernel).is_none());
        let kernel = (Rbf::new(1.) + WhiteKernel::new(1.)) * Matern::new(1.);
        assert!(white_kernel_in_sum(&kernel).is_none());
    }

    #[test]
    fn test_extract_noise() {
        let x = array![[0., 1.], [2., 3.], [4., 5.]];
        let mut kernel = Rbf::new(1.) + WhiteKernel::new(0.3);
        assert_eq!(extract_noise(&mut kernel), Some(0.3));
        assert_abs_diff_eq!(kernel.value(&x), Rbf::new(1.).value(&x));
        assert_eq!(kernel.n_dims(), 1);
        // zeroed white kernel is still found
        assert_eq!(extract_noise(&mut kernel), Some(0.));

        let mut kernel = Kernel::from(WhiteKernel::new(0.2));
        assert_eq!(extract_noise(&mut kernel), Some(0.2));
        assert_abs_diff_eq!(kernel.value(&x), Array2::zeros((3, 3)));

        let mut kernel = Kernel::from(Rbf::new(1.)) * WhiteKernel::new(0.2);
        assert_eq!(extract_noise(&mut kernel), None);
    }

    #[test]
    fn test_noise_model_white_kernel() {
        let white = NoiseModel::<f64>::Gaussian.white_kernel();
        assert_eq!(white, WhiteKernel::new(1.));
        let white = NoiseModel::Fixed(0.5).white_kernel();
        assert_eq!(white.noise_level(), 0.5);
        assert!(Kernel::from(white).theta().is_empty());
    }
}

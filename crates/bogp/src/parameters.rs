use crate::errors::{GprError, Result};
use crate::kernels::{Bounds, Kernel, KernelFunction};
use crate::noise::{white_kernel_in_sum, NoiseModel};
use crate::{GPR_COBYLA_MAX_EVAL, GPR_COBYLA_MIN_EVAL, GPR_DEFAULT_ALPHA, GPR_OPTIM_N_START};
use linfa::{Float, ParamGuard};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A set of validated GP regression parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "F: Serialize", deserialize = "F: Deserialize<'de>"))
)]
pub struct GprValidParams<F: Float> {
    /// Prior covariance kernel, `ConstantKernel(1, fixed) * RBF(1, fixed)` when not specified
    pub(crate) kernel: Option<Kernel<F>>,
    /// Value added to the diagonal of the kernel matrix during fitting
    pub(crate) alpha: F,
    /// Noise model handled as a white kernel term zeroed at prediction time
    pub(crate) noise: Option<NoiseModel<F>>,
    /// Whether targets are standardized before fitting
    pub(crate) normalize_y: bool,
    /// Whether kernel hyperparameters are optimized by likelihood maximization
    pub(crate) optimize: bool,
    /// Number of additional likelihood optimization restarts
    pub(crate) n_start: usize,
    /// Max number of likelihood evaluations during one optimization
    pub(crate) max_eval: usize,
    /// Seed of the random generator used for restarts and sampling
    pub(crate) seed: Option<u64>,
}

impl<F: Float> Default for GprValidParams<F> {
    fn default() -> GprValidParams<F> {
        GprValidParams {
            kernel: None,
            alpha: F::cast(GPR_DEFAULT_ALPHA),
            noise: None,
            normalize_y: false,
            optimize: true,
            n_start: GPR_OPTIM_N_START,
            max_eval: GPR_COBYLA_MAX_EVAL,
            seed: None,
        }
    }
}

impl<F: Float> GprValidParams<F> {
    /// Get the user given prior kernel
    pub fn kernel(&self) -> Option<&Kernel<F>> {
        self.kernel.as_ref()
    }

    /// Get the value added to the kernel matrix diagonal
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Get the noise model
    pub fn noise(&self) -> Option<&NoiseModel<F>> {
        self.noise.as_ref()
    }

    /// Whether targets are normalized
    pub fn normalize_y(&self) -> bool {
        self.normalize_y
    }

    /// Whether kernel hyperparameters are optimized
    pub fn optimize(&self) -> bool {
        self.optimize
    }

    /// Get the number of internal optimization restarts
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// Get the max number of internal likelihood evaluations during one optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Get the random generator seed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Kernel actually used by the regressor: the given kernel (or the default one)
    /// with a white kernel term appended when a noise model is specified.
    ///
    /// When the kernel is already a white kernel or holds one in its additive terms,
    /// no other white term is appended and the existing one is used as noise term.
    pub fn resolved_kernel(&self) -> Kernel<F> {
        let kernel = self.kernel.clone().unwrap_or_default();
        match &self.noise {
            Some(noise) if !has_additive_white_kernel(&kernel) => kernel + noise.white_kernel(),
            _ => kernel,
        }
    }
}

fn has_additive_white_kernel<F: Float>(kernel: &Kernel<F>) -> bool {
    matches!(kernel, Kernel::White(_)) || white_kernel_in_sum(kernel).is_some()
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP regression algorithm](crate::GaussianProcessRegressor).
pub struct GprParams<F: Float>(GprValidParams<F>);

impl<F: Float> Default for GprParams<F> {
    fn default() -> GprParams<F> {
        GprParams(GprValidParams::default())
    }
}

impl<F: Float> GprParams<F> {
    /// A constructor for GP regression parameters given a prior kernel
    pub fn new(kernel: impl Into<Kernel<F>>) -> GprParams<F> {
        Self(GprValidParams {
            kernel: Some(kernel.into()),
            ..Default::default()
        })
    }

    /// Set prior kernel.
    pub fn kernel(mut self, kernel: impl Into<Kernel<F>>) -> Self {
        self.0.kernel = Some(kernel.into());
        self
    }

    /// Set the value added to the diagonal of the kernel matrix during fitting.
    ///
    /// It ensures a positive definite matrix and can be interpreted as the variance
    /// of an additional gaussian noise on the observations.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Set the noise model.
    ///
    /// When some, a white kernel is appended to the prior kernel and its level is
    /// zeroed after fitting so that predictive std does not take noise into account.
    pub fn noise(mut self, noise: Option<NoiseModel<F>>) -> Self {
        self.0.noise = noise;
        self
    }

    /// Set whether targets are standardized before fitting
    pub fn normalize_y(mut self, normalize_y: bool) -> Self {
        self.0.normalize_y = normalize_y;
        self
    }

    /// Set whether kernel hyperparameters are optimized, otherwise they are kept as is
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.0.optimize = optimize;
        self
    }

    /// Set the number of internal likelihood optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Set the max number of internal likelihood evaluations during one optimization
    /// Given max_eval has to be greater than [crate::GPR_COBYLA_MIN_EVAL] otherwise
    /// max_eval is set to [crate::GPR_COBYLA_MIN_EVAL].
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = GPR_COBYLA_MIN_EVAL.max(max_eval);
        self
    }

    /// Set the random generator seed for reproducibility
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> From<GprValidParams<F>> for GprParams<F> {
    fn from(valid: GprValidParams<F>) -> Self {
        GprParams(valid)
    }
}

impl<F: Float> ParamGuard for GprParams<F> {
    type Checked = GprValidParams<F>;
    type Error = GprError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        if !(params.alpha >= F::zero() && params.alpha.is_finite()) {
            return Err(GprError::InvalidValueError(format!(
                "`alpha` should be a positive finite value, got {}",
                params.alpha
            )));
        }
        if let Some(NoiseModel::Fixed(level)) = params.noise {
            if !(level >= F::zero() && level.is_finite()) {
                return Err(GprError::InvalidValueError(format!(
                    "Fixed noise level should be a positive finite value, got {level}"
                )));
            }
        }
        let kernel = params.resolved_kernel();
        kernel.validate()?;
        if params.optimize && params.n_start > 0 {
            let unbounded = kernel.hyperparameters().into_iter().find(|hp| match hp.bounds {
                Bounds::Fixed => false,
                Bounds::Range(lo, up) => !(lo.is_finite() && up.is_finite()),
            });
            if let Some(hp) = unbounded {
                return Err(GprError::InvalidValueError(format!(
                    "Restarts require finite bounds, hyperparameter {} is unbounded",
                    hp.name
                )));
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

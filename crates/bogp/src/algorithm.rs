use crate::errors::{GprError, Result};
use crate::kernels::{Kernel, KernelFunction};
use crate::noise::extract_noise;
use crate::optimization::{optimize_params, prepare_multistart, CobylaParams};
use crate::parameters::{GprParams, GprValidParams};
use crate::utils::{has_duplicated_rows, into_f64, NormalizedTarget};

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use linfa_linalg::{cholesky::*, eigh::*, triangular::*};
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};

use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

use log::{debug, info, warn};
use rayon::prelude::*;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Default number of additional restarts for hyperparameters optimization
pub const GPR_OPTIM_N_START: usize = 0;
/// Minimum of function evaluations for COBYLA optimizer
pub const GPR_COBYLA_MIN_EVAL: usize = 25;
/// Maximum of function evaluations for COBYLA optimizer
pub const GPR_COBYLA_MAX_EVAL: usize = 1000;
/// Default value added to the diagonal of the kernel matrix
pub const GPR_DEFAULT_ALPHA: f64 = 1e-10;

/// Predictive standard deviation under which std gradient is set to zero
const STD_GRADIENT_THRESHOLD: f64 = 1e-8;

/// Internal parameters computed during training
/// used later on in prediction computations
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct GprInnerParams<F: Float> {
    /// Lower cholesky factor L of K(X, X) + alpha.I
    l_chol: Array2<F>,
    /// Dual coefficients K^-1.y
    dual_coef: Array1<F>,
}

/// Outputs requested from [`GaussianProcessRegressor::predict_with`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictOptions {
    /// Predictive standard deviation
    pub std: bool,
    /// Predictive covariance, exclusive with `std` and `std_grad`
    pub cov: bool,
    /// Gradient of the predictive mean wrt the query point
    pub mean_grad: bool,
    /// Gradient of the predictive standard deviation wrt the query point, implies `std`
    pub std_grad: bool,
}

impl PredictOptions {
    /// Request predictive standard deviation
    pub fn with_std(mut self) -> Self {
        self.std = true;
        self
    }

    /// Request predictive covariance
    pub fn with_cov(mut self) -> Self {
        self.cov = true;
        self
    }

    /// Request gradient of the predictive mean
    pub fn with_mean_grad(mut self) -> Self {
        self.mean_grad = true;
        self
    }

    /// Request gradient of the predictive standard deviation
    pub fn with_std_grad(mut self) -> Self {
        self.std_grad = true;
        self
    }

    fn check(&self) -> Result<()> {
        if self.cov && (self.std || self.std_grad) {
            Err(GprError::InvalidValueError(
                "Standard deviation and covariance cannot be requested together".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Predictions at n query points of nx components
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction<F: Float> {
    /// Predictive mean (n,)
    pub mean: Array1<F>,
    /// Predictive standard deviation (n,)
    pub std: Option<Array1<F>>,
    /// Predictive covariance (n, n)
    pub cov: Option<Array2<F>>,
    /// Gradients of the predictive mean (n, nx)
    pub mean_grad: Option<Array2<F>>,
    /// Gradients of the predictive standard deviation (n, nx)
    pub std_grad: Option<Array2<F>>,
}

fn missing(output: &str) -> GprError {
    GprError::InvalidValueError(format!("Prediction output {output} was not computed"))
}

/// Gaussian Process Regression (GPR) where the observations y are modeled
/// as values of a zero-mean gaussian process f governed by a prior
/// covariance kernel k:
///
/// `y = f(x) + e` with `f ~ GP(0, k(x, x'))`
///
/// The kernel hyperparameters are estimated by maximizing the log-marginal
/// likelihood of the training observations.
///
/// # Implementation
///
/// * Based on [ndarray](https://github.com/rust-ndarray/ndarray)
///   and [linfa](https://github.com/rust-ml/linfa) and strive to follow [linfa guidelines](https://github.com/rust-ml/linfa/blob/master/CONTRIBUTE.md)
/// * Kernels are built from leaf kernels (constant, white, dot product, RBF, Matern, rational quadratic)
///   combined with `+` and `*` operators, see [`kernels`](crate::kernels).
/// * When a [`NoiseModel`](crate::NoiseModel) is given, a white kernel term is fitted
///   along with the other hyperparameters then zeroed, thus the predictive standard deviation
///   is the one of the latent function f and not the one of the noisy observations y.
/// * Gradients of the predictive mean and standard deviation wrt the query point are available
///   for all kernels, which makes the model suitable for acquisition function optimization
///   within Bayesian optimization loops.
/// * GPR models can be saved and loaded using [serde](https://serde.rs/).
///   See `serializable` feature section below.
///
/// # Features
///
/// ## serializable
///
/// The `serializable` feature enables the serialization of GPR models using the [`serde crate`](https://serde.rs/).
///
/// # Example
///
/// ```no_run
/// use bogp::{kernels::*, GaussianProcessRegressor, NoiseModel, PredictOptions};
/// use linfa::prelude::*;
/// use ndarray::{arr2, Array, Axis};
///
/// // one-dimensional test function to approximate
/// fn xsinx(x: &ndarray::Array2<f64>) -> ndarray::Array1<f64> {
///     ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
/// }
///
/// // training data
/// let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
/// let yt = xsinx(&xt);
///
/// // GPR with a Matern kernel and gaussian observation noise
/// let gpr = GaussianProcessRegressor::params(ConstantKernel::new(1.) * Matern::new(1.))
///     .noise(Some(NoiseModel::Gaussian))
///     .normalize_y(true)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GPR fitting");
///
/// // test data
/// let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
/// let pred = gpr
///     .predict_with(&xtest, PredictOptions::default().with_std().with_mean_grad())
///     .expect("GPR prediction");
/// println!("mean = {}, std = {:?}", pred.mean, pred.std);
/// ```
///
/// # Reference:
///
/// Rasmussen, C. E., & Williams, C. K. I. (2006).
/// [Gaussian Processes for Machine Learning](http://www.gaussianprocess.org/gpml/chapters/RW.pdf), Algorithm 2.1.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct GaussianProcessRegressor<F: Float> {
    /// Kernel used for predictions (white noise zeroed when a noise model is given)
    kernel: Kernel<F>,
    /// Kernel with optimized hyperparameters as used in likelihood computation
    fitted_kernel: Kernel<F>,
    /// Fitted noise level when a noise model is given
    noise: Option<F>,
    /// Log marginal likelihood of the fitted kernel
    likelihood: F,
    /// Cholesky factor and dual coefficients
    inner_params: GprInnerParams<F>,
    /// Normalized training outputs
    yt_norm: NormalizedTarget<F>,
    /// Training data (input, output)
    training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    params: GprValidParams<F>,
}

impl<F: Float> fmt::Display for GaussianProcessRegressor<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GPR(kernel={}", self.fitted_kernel)?;
        if let Some(noise) = self.noise {
            write!(f, ", noise={noise}")?;
        }
        write!(f, ", likelihood={})", self.likelihood)
    }
}

impl<F: Float> GaussianProcessRegressor<F> {
    /// GPR parameters constructor given a prior kernel
    pub fn params(kernel: impl Into<Kernel<F>>) -> GprParams<F> {
        GprParams::new(kernel)
    }

    fn check_input(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        let nx = self.training_data.0.ncols();
        if x.ncols() != nx {
            return Err(GprError::InvalidValueError(format!(
                "Expected query points of dimension {}, got {}",
                nx,
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Predict at n given `x` points of nx components specified as a (n, nx) matrix
    /// the outputs requested by `options`.
    ///
    /// The predictive mean is always computed. Requesting both standard deviation
    /// and covariance is an error. Requesting std gradient implies standard deviation.
    pub fn predict_with(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        options: PredictOptions,
    ) -> Result<Prediction<F>> {
        self.check_input(x)?;
        options.check()?;

        let xtrain = &self.training_data.0;
        let inners = &self.inner_params;
        let s = self.yt_norm.std;

        let k_trans = self.kernel.cross(x, xtrain);
        let mean = self.yt_norm.denormalize(&k_trans.dot(&inners.dual_coef));

        let with_std = options.std || options.std_grad;
        let v = if with_std || options.cov {
            Some(inners.l_chol.solve_triangular(&k_trans.t(), UPLO::Lower)?)
        } else {
            None
        };

        let mut cov = None;
        let mut std = None;
        if let Some(v) = &v {
            if options.cov {
                let c = self.kernel.value(x) - v.t().dot(v);
                cov = Some(c.mapv(|c| c * s * s));
            }
            if with_std {
                let var = self.kernel.diag(x) - v.mapv(|v| v * v).sum_axis(Axis(0));
                if var.iter().any(|v| *v < F::zero()) {
                    // Variance might be slightly negative depending on machine precision
                    warn!("Predicted variances smaller than 0. Setting those variances to 0.");
                }
                std = Some(var.mapv(|v| if v < F::zero() { F::zero() } else { v.sqrt() * s }));
            }
        }

        let mean_grad = if options.mean_grad {
            Some(self.mean_gradients(x))
        } else {
            None
        };

        let std_grad = match (&v, &std) {
            (Some(v), Some(std)) if options.std_grad => Some(self.std_gradients(x, v, std)?),
            _ => None,
        };

        Ok(Prediction {
            mean,
            std,
            cov,
            mean_grad,
            std_grad,
        })
    }

    /// Gradients of the predictive mean: `s * dK(x_i, X)/dx^T . K^-1.y` for each row x_i
    fn mean_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        let xtrain = &self.training_data.0;
        let s = self.yt_norm.std;
        let mut grads = Array2::zeros(x.raw_dim());
        Zip::from(grads.rows_mut())
            .and(x.rows())
            .for_each(|mut grad, xi| {
                let dk = self.kernel.gradient_x(&xi, xtrain);
                grad.assign(&dk.t().dot(&self.inner_params.dual_coef).mapv(|v| v * s));
            });
        grads
    }

    /// Gradients of the predictive standard deviation given `v = L^-1 K(X, x)`
    /// and the predictive standard deviation `std`:
    ///
    /// `s^2 * (1/2 dk(x_i, x_i)/dx - v_i^T L^-1 dK(X, x_i)/dx) / std_i`
    fn std_gradients(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        v: &Array2<F>,
        std: &Array1<F>,
    ) -> Result<Array2<F>> {
        let xtrain = &self.training_data.0;
        let s = self.yt_norm.std;
        let mut grads = Array2::zeros(x.raw_dim());
        for (i, xi) in x.rows().into_iter().enumerate() {
            if std[i] <= F::cast(STD_GRADIENT_THRESHOLD) {
                continue;
            }
            let dk = self.kernel.gradient_x(&xi, xtrain);
            let l_dk = self.inner_params.l_chol.solve_triangular(&dk, UPLO::Lower)?;
            let dvar_half = self.kernel.diag_gradient_x(&xi).mapv(|v| v * F::cast(0.5))
                - l_dk.t().dot(&v.column(i));
            grads
                .row_mut(i)
                .assign(&dvar_half.mapv(|v| v * s * s / std[i]));
        }
        Ok(grads)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        Ok(self.predict_with(x, PredictOptions::default())?.mean)
    }

    /// Predict standard deviation values at n given `x` points of nx components specified as a (n, nx) matrix.
    pub fn predict_std(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let pred = self.predict_with(x, PredictOptions::default().with_std())?;
        pred.std.ok_or_else(|| missing("std"))
    }

    /// Predict both output values and standard deviation at n given `x` points of nx components
    pub fn predict_valstd(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        let pred = self.predict_with(x, PredictOptions::default().with_std())?;
        Ok((pred.mean, pred.std.ok_or_else(|| missing("std"))?))
    }

    /// Predict both output values and (n, n) covariance matrix at n given `x` points of nx components
    pub fn predict_cov(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array2<F>)> {
        let pred = self.predict_with(x, PredictOptions::default().with_cov())?;
        Ok((pred.mean, pred.cov.ok_or_else(|| missing("cov"))?))
    }

    /// Predict gradients of the output values at n given `x` points of nx components
    /// as a (n, nx) matrix.
    pub fn predict_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_input(x)?;
        Ok(self.mean_gradients(x))
    }

    /// Predict gradients of the standard deviation at n given `x` points of nx components
    /// as a (n, nx) matrix.
    pub fn predict_std_gradients(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        let pred = self.predict_with(x, PredictOptions::default().with_std_grad())?;
        pred.std_grad.ok_or_else(|| missing("std_grad"))
    }

    /// Draw `n_samples` trajectories of the posterior gaussian process at n given `x` points.
    /// Returns a (n, n_samples) matrix.
    ///
    /// The posterior covariance is decomposed using its eigenvalues which is more robust
    /// than cholesky decomposition when the number of x locations increases.
    pub fn sample_y(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_samples: usize,
    ) -> Result<Array2<F>> {
        let (mean, cov) = self.predict_cov(x)?;
        let mut rng = self.params.rng();
        sample(mean, cov, n_samples, &mut rng)
    }

    /// Kernel used for predictions, its white noise term is zeroed when a noise model is used
    pub fn kernel(&self) -> &Kernel<F> {
        &self.kernel
    }

    /// Kernel with its optimized hyperparameters including the noise level
    pub fn fitted_kernel(&self) -> &Kernel<F> {
        &self.fitted_kernel
    }

    /// Fitted noise level, None when no noise model is used
    pub fn noise(&self) -> Option<F> {
        self.noise
    }

    /// Log-transformed optimized hyperparameters
    pub fn theta(&self) -> Array1<F> {
        self.fitted_kernel.theta()
    }

    /// Log marginal likelihood of the fitted kernel
    pub fn log_marginal_likelihood(&self) -> F {
        self.likelihood
    }

    /// Log marginal likelihood of the training data for given log-transformed hyperparameters
    pub fn log_marginal_likelihood_at(
        &self,
        theta: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<F> {
        let kernel = self.fitted_kernel.with_theta(theta)?;
        let (lml, _) = log_marginal_likelihood(
            &kernel,
            &self.training_data.0,
            &self.yt_norm.data,
            self.params.alpha(),
        )?;
        Ok(lml)
    }

    /// Dual coefficients of training points in kernel space `K^-1.y`
    pub fn alpha(&self) -> &Array1<F> {
        &self.inner_params.dual_coef
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.ncols(), 1)
    }

    /// Training data (input, output)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Parameters used to fit this model
    pub fn fit_params(&self) -> &GprValidParams<F> {
        &self.params
    }
}

impl<F: Float> GprValidParams<F> {
    /// Random generator seeded with the user given seed if any
    pub(crate) fn rng(&self) -> Xoshiro256Plus {
        match self.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        }
    }

    /// Predict at given `x` points from the prior distribution, ie without training.
    ///
    /// The prior mean is zero, standard deviation and covariance are computed from
    /// the given kernel or the default one. Noise model is not taken into account.
    pub fn predict_prior(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        options: PredictOptions,
    ) -> Result<Prediction<F>> {
        options.check()?;
        let kernel = self.kernel.clone().unwrap_or_default();
        kernel.check_input_dim(x.ncols())?;

        let with_std = options.std || options.std_grad;
        let std = if with_std {
            Some(
                kernel
                    .diag(x)
                    .mapv(|v| if v < F::zero() { F::zero() } else { v.sqrt() }),
            )
        } else {
            None
        };
        let cov = if options.cov {
            Some(kernel.value(x))
        } else {
            None
        };
        let mean_grad = if options.mean_grad {
            Some(Array2::zeros(x.raw_dim()))
        } else {
            None
        };
        let std_grad = match &std {
            Some(std) if options.std_grad => {
                let mut grads = Array2::zeros(x.raw_dim());
                Zip::from(grads.rows_mut())
                    .and(x.rows())
                    .and(std)
                    .for_each(|mut grad, xi, &sd| {
                        if sd > F::cast(STD_GRADIENT_THRESHOLD) {
                            let dk = kernel.diag_gradient_x(&xi);
                            grad.assign(&dk.mapv(|v| v * F::cast(0.5) / sd));
                        }
                    });
                Some(grads)
            }
            _ => None,
        };
        Ok(Prediction {
            mean: Array1::zeros(x.nrows()),
            std,
            cov,
            mean_grad,
            std_grad,
        })
    }
}

/// Gaussian Process adaptator to implement `linfa::Predict` trait for mean prediction.
impl<F, D> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GaussianProcessRegressor<F>
where
    F: Float,
    D: Data<Elem = F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        match self.predict(x) {
            Ok(values) => *y = values,
            Err(err) => {
                log::error!("GPR prediction failed: {err}");
                y.fill(F::nan());
            }
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

/// Gaussian Process adaptator to implement `linfa::Predict` trait for standard deviation prediction.
pub struct GprStdPredictor<'a, F: Float>(pub &'a GaussianProcessRegressor<F>);

impl<F, D> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GprStdPredictor<'_, F>
where
    F: Float,
    D: Data<Elem = F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        match self.0.predict_std(x) {
            Ok(values) => *y = values,
            Err(err) => {
                log::error!("GPR std prediction failed: {err}");
                y.fill(F::nan());
            }
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GprError>
    for GprValidParams<F>
{
    type Object = GaussianProcessRegressor<F>;

    /// Fit GPR kernel hyperparameters using maximum likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records().to_owned();
        let y = dataset.targets().to_owned();

        if x.nrows() == 0 {
            return Err(GprError::InvalidValueError(
                "At least one training point is required".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(GprError::InvalidValueError(format!(
                "Training inputs ({}) and outputs ({}) should have the same number of points",
                x.nrows(),
                y.len()
            )));
        }

        let mut kernel = self.resolved_kernel();
        kernel.check_input_dim(x.ncols())?;

        if has_duplicated_rows(&x) {
            warn!("Multiple x input features have the same value (at least same row twice).");
        }
        let ytrain = NormalizedTarget::new(&y, self.normalize_y());

        if self.optimize() && kernel.n_dims() > 0 {
            let theta0 = kernel.theta();
            let bounds = kernel.bounds();
            let objfn = |theta: &[f64], _gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
                // check theta as optimizer may return nan values
                if theta.iter().any(|v| v.is_nan()) {
                    return f64::INFINITY;
                }
                let theta = theta.iter().map(|v| F::cast(*v)).collect::<Array1<F>>();
                let lml = kernel.with_theta(&theta).and_then(|kernel| {
                    log_marginal_likelihood(&kernel, &x, &ytrain.data, self.alpha())
                });
                match lml {
                    Ok((lml, _)) => -into_f64(lml),
                    Err(_) => f64::INFINITY,
                }
            };

            let mut rng = self.rng();
            let theta_inits = prepare_multistart(self.n_start(), &theta0, &bounds, &mut rng);
            debug!("Optimize with multistart theta = {theta_inits:?} and bounds = {bounds:?}");
            let now = Instant::now();
            let opt_params = (0..theta_inits.nrows())
                .into_par_iter()
                .map(|i| {
                    optimize_params(
                        objfn,
                        &theta_inits.row(i).to_owned(),
                        &bounds,
                        CobylaParams {
                            maxeval: (50 * theta_inits.ncols())
                                .clamp(GPR_COBYLA_MIN_EVAL, self.max_eval()),
                            ..CobylaParams::default()
                        },
                    )
                })
                .reduce(
                    || (f64::INFINITY, theta0.mapv(into_f64)),
                    |a, b| if b.0 < a.0 { b } else { a },
                );
            debug!("elapsed optim = {:?}", now.elapsed().as_millis());

            if opt_params.0.is_finite() {
                kernel.set_theta(&opt_params.1.mapv(|v| F::cast(v)))?;
            } else {
                warn!("Likelihood optimization failed, initial kernel hyperparameters are kept");
            }
        }

        let (likelihood, inner_params) =
            log_marginal_likelihood(&kernel, &x, &ytrain.data, self.alpha()).map_err(|err| {
                GprError::LikelihoodComputationError(format!(
                    "The kernel, {kernel}, is not returning a positive definite matrix ({err}). \
                    Try gradually increasing the 'alpha' parameter of the GP regressor."
                ))
            })?;
        info!("Fitted kernel {kernel} with log marginal likelihood = {likelihood}");

        let fitted_kernel = kernel.clone();
        let noise = if self.noise().is_some() {
            extract_noise(&mut kernel)
        } else {
            None
        };
        if let Some(noise) = noise {
            debug!("Noise level {noise} removed from prediction kernel");
        }

        Ok(GaussianProcessRegressor {
            kernel,
            fitted_kernel,
            noise,
            likelihood,
            inner_params,
            yt_norm: ytrain,
            training_data: (x, y),
            params: self.clone(),
        })
    }
}

/// Compute log marginal likelihood
///
/// `log p(y|X) = -1/2 y^T K^-1 y - sum_i log L_ii - n/2 log(2 pi)`
///
/// kernel: covariance kernel,
/// x: training inputs,
/// y: (normalized) training outputs,
/// alpha: value added to kernel matrix diagonal
fn log_marginal_likelihood<F: Float>(
    kernel: &Kernel<F>,
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &Array1<F>,
    alpha: F,
) -> Result<(F, GprInnerParams<F>)> {
    let mut k = kernel.value(x);
    k.diag_mut().mapv_inplace(|v| v + alpha);

    let l_chol = k.cholesky()?;
    let yt = l_chol.solve_triangular(&y.view().insert_axis(Axis(1)), UPLO::Lower)?;
    let dual_coef = l_chol
        .t()
        .solve_triangular_into(yt, UPLO::Upper)?
        .index_axis_move(Axis(1), 0);

    let n_obs = F::cast(x.nrows());
    let log_det_half = l_chol.diag().mapv(|v| v.ln()).sum();
    let lml = F::cast(-0.5) * y.dot(&dual_coef)
        - log_det_half
        - n_obs * F::cast(0.5) * F::cast(2. * std::f64::consts::PI).ln();

    if !lml.is_finite() {
        return Err(GprError::LikelihoodComputationError(format!(
            "Non finite log marginal likelihood ({lml})"
        )));
    }
    Ok((lml, GprInnerParams { l_chol, dual_coef }))
}

/// Sample a gaussian process for `n_traj` trajectories given its mean (n,) and
/// covariance (n, n) at n locations using eigenvalues decomposition of the covariance matrix.
pub(crate) fn sample<F: Float>(
    mean: Array1<F>,
    cov: Array2<F>,
    n_traj: usize,
    rng: &mut Xoshiro256Plus,
) -> Result<Array2<F>> {
    let n_eval = mean.len();
    let (v, w) = cov.eigh_into()?;
    let v = v.mapv(|x| {
        // We lower bound the float value at 1e-9
        if x < F::cast(1e-9) {
            return F::zero();
        }
        x.sqrt()
    });
    let c = w.dot(&Array2::from_diag(&v));
    let ary = Array::random_using((n_eval, n_traj), StandardNormal, rng).mapv(|v: f64| F::cast(v));
    Ok(mean.insert_axis(Axis(1)) + c.dot(&ary))
}

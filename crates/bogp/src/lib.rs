//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression (GPR)
//! with composable covariance kernels, as used as surrogate model within Bayesian optimization loops.
//!
//! The regressor is implemented by [GaussianProcessRegressor] parameterized by [GprParams].
//! Kernels are built from the leaf kernels of the [kernels] module combined with `+` and `*`.
//!
//! Observation noise is modeled by a white kernel term added to the prior kernel
//! (see [NoiseModel]). Its level is estimated along with other kernel hyperparameters
//! then zeroed once fitted, hence predictive standard deviation and its gradient
//! describe the latent noise-free function which is what acquisition functions expect.
//!
//! Predictions optionally return standard deviation, covariance and gradients of
//! mean and standard deviation wrt query points (see [PredictOptions]).
#![warn(missing_docs)]
mod algorithm;
mod errors;
pub mod kernels;
pub mod noise;
mod optimization;
mod parameters;
mod utils;

pub use algorithm::*;
pub use errors::*;
pub use noise::NoiseModel;
pub use parameters::*;

/// Env variable to set the log level, used by examples and benchmarks
/// to configure `env_logger` (ex: `BOGP_LOG=debug`)
pub const BOGP_LOG: &str = "BOGP_LOG";

use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GprError>;

/// An error when using [`GaussianProcessRegressor`](crate::GaussianProcessRegressor)
/// or manipulating a [`Kernel`](crate::kernels::Kernel) expression
#[derive(Error, Debug)]
pub enum GprError {
    /// When likelihood computation fails (ie covariance matrix not positive definite)
    #[error("LikelihoodComputation computation error: {0}")]
    LikelihoodComputationError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When a kernel path or a hyperparameter name does not exist
    #[error("KernelPath error: {0}")]
    KernelPathError(String),
}

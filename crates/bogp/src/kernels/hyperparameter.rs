use linfa::Float;
use ndarray::Array1;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Default bounds of a tunable hyperparameter
pub const DEFAULT_BOUNDS: (f64, f64) = (1e-5, 1e5);

/// Search space of a kernel hyperparameter
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Bounds<F: Float> {
    /// Hyperparameter is kept constant during likelihood maximization
    Fixed,
    /// Hyperparameter is optimized within (lower, upper) bounds
    Range(F, F),
}

impl<F: Float> Default for Bounds<F> {
    fn default() -> Self {
        Bounds::Range(F::cast(DEFAULT_BOUNDS.0), F::cast(DEFAULT_BOUNDS.1))
    }
}

impl<F: Float> Bounds<F> {
    /// Whether the hyperparameter is constant
    pub fn is_fixed(&self) -> bool {
        matches!(self, Bounds::Fixed)
    }

    /// Bounds in log space, None when fixed
    pub fn log_bounds(&self) -> Option<(F, F)> {
        match self {
            Bounds::Fixed => None,
            Bounds::Range(lo, up) => Some((lo.ln(), up.ln())),
        }
    }
}

/// A kernel hyperparameter description together with its current value
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Hyperparameter<F: Float> {
    /// Full name of the hyperparameter, prefixed by its kernel path (ex: `k1__k2__length_scale`)
    pub name: String,
    /// Current value (several components for anisotropic length scales)
    pub value: Array1<F>,
    /// Search space
    pub bounds: Bounds<F>,
}

impl<F: Float> Hyperparameter<F> {
    pub(crate) fn new(name: &str, value: Array1<F>, bounds: Bounds<F>) -> Self {
        Hyperparameter {
            name: name.to_string(),
            value,
            bounds,
        }
    }

    /// Whether the hyperparameter is constant
    pub fn is_fixed(&self) -> bool {
        self.bounds.is_fixed()
    }

    /// Number of components
    pub fn n_elements(&self) -> usize {
        self.value.len()
    }

    /// Prefix the name with given operand name (`k1` or `k2`)
    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        self.name = format!("{}__{}", prefix, self.name);
        self
    }
}

use crate::errors::{GprError, Result};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator used in kernel paths and hyperparameter names
pub const PATH_SEPARATOR: &str = "__";

/// Operand of a binary kernel node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Operand {
    /// Left operand
    K1,
    /// Right operand
    K2,
}

impl Operand {
    /// Operand name as used in parameter names
    pub fn name(&self) -> &'static str {
        match self {
            Operand::K1 => "k1",
            Operand::K2 => "k2",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Operand {
    type Err = GprError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "k1" => Ok(Operand::K1),
            "k2" => Ok(Operand::K2),
            _ => Err(GprError::KernelPathError(format!(
                "Bad operand {s}, expected k1 or k2"
            ))),
        }
    }
}

/// Address of a sub-kernel within a kernel expression tree.
///
/// The empty path designates the root kernel. A path is written
/// as operand names joined by `__`, for instance `k1__k2` is the right
/// operand of the left operand of the root kernel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct KernelPath(Vec<Operand>);

impl KernelPath {
    /// Path of the root kernel
    pub fn root() -> Self {
        KernelPath(vec![])
    }

    /// Path of the `operand` child of the kernel addressed by this path
    pub fn child(&self, operand: Operand) -> Self {
        let mut operands = self.0.clone();
        operands.push(operand);
        KernelPath(operands)
    }

    /// Path with given operand prepended
    pub(crate) fn under(mut self, operand: Operand) -> Self {
        self.0.insert(0, operand);
        self
    }

    /// Whether the path designates the root kernel
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Operands from the root down to the addressed kernel
    pub fn operands(&self) -> &[Operand] {
        &self.0
    }

    /// Name of the given hyperparameter of the addressed kernel (ex: `k2__noise_level`)
    pub fn param_name(&self, param: &str) -> String {
        if self.is_root() {
            param.to_string()
        } else {
            format!("{self}{PATH_SEPARATOR}{param}")
        }
    }
}

impl From<Vec<Operand>> for KernelPath {
    fn from(operands: Vec<Operand>) -> Self {
        KernelPath(operands)
    }
}

impl fmt::Display for KernelPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = self.0.iter().map(|op| op.name()).collect::<Vec<_>>();
        write!(f, "{}", names.join(PATH_SEPARATOR))
    }
}

impl FromStr for KernelPath {
    type Err = GprError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(KernelPath::root());
        }
        s.split(PATH_SEPARATOR)
            .map(Operand::from_str)
            .collect::<Result<Vec<_>>>()
            .map(KernelPath)
    }
}

/// Split a hyperparameter full name into its kernel path and its leaf parameter name
/// (ex: `k1__k2__length_scale` gives (`k1__k2`, `length_scale`))
pub fn split_param_name(name: &str) -> Result<(KernelPath, &str)> {
    match name.rsplit_once(PATH_SEPARATOR) {
        Some((path, param)) => Ok((path.parse()?, param)),
        None => Ok((KernelPath::root(), name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = KernelPath::root().child(Operand::K1).child(Operand::K2);
        assert_eq!(path.to_string(), "k1__k2");
        assert_eq!(KernelPath::root().to_string(), "");
        assert_eq!(path.param_name("noise_level"), "k1__k2__noise_level");
        assert_eq!(KernelPath::root().param_name("noise_level"), "noise_level");
    }

    #[test]
    fn test_path_parse() {
        let path: KernelPath = "k2__k1".parse().unwrap();
        assert_eq!(path.operands(), &[Operand::K2, Operand::K1]);
        assert!("".parse::<KernelPath>().unwrap().is_root());
        assert!("k3".parse::<KernelPath>().is_err());
        assert!("k1__".parse::<KernelPath>().is_err());
    }

    #[test]
    fn test_split_param_name() {
        let (path, param) = split_param_name("k1__k2__length_scale").unwrap();
        assert_eq!(path, KernelPath::from(vec![Operand::K1, Operand::K2]));
        assert_eq!(param, "length_scale");

        let (path, param) = split_param_name("noise_level").unwrap();
        assert!(path.is_root());
        assert_eq!(param, "noise_level");

        assert!(split_param_name("k4__noise_level").is_err());
    }

    #[test]
    fn test_under() {
        let path = KernelPath::from(vec![Operand::K2]).under(Operand::K1);
        assert_eq!(path.to_string(), "k1__k2");
    }
}

use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_stats::QuantileExt;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A structure to store (n,) target data and its mean and standard deviation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub(crate) struct NormalizedTarget<F: Float> {
    /// normalized data
    pub data: Array1<F>,
    /// mean computed from data (0 when not normalized)
    pub mean: F,
    /// standard deviation computed from data (1 when not normalized)
    pub std: F,
}

impl<F: Float> NormalizedTarget<F> {
    /// Constructor: targets are standardized when `normalize` is true
    /// otherwise they are kept as is with (mean, std) = (0, 1)
    pub fn new(y: &ArrayBase<impl Data<Elem = F>, Ix1>, normalize: bool) -> NormalizedTarget<F> {
        if normalize {
            let (data, mean, std) = normalize_target(y);
            NormalizedTarget { data, mean, std }
        } else {
            NormalizedTarget {
                data: y.to_owned(),
                mean: F::zero(),
                std: F::one(),
            }
        }
    }

    /// Back to the original target scale
    pub fn denormalize(&self, v: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        v.mapv(|v| v * self.std + self.mean)
    }
}

/// Standardize y values, a null standard deviation is replaced by 1
pub fn normalize_target<F: Float>(y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> (Array1<F>, F, F) {
    let mean = y.mean().unwrap_or_else(F::zero);
    let mut std = y.std(F::zero());
    if std == F::zero() {
        std = F::one();
    }
    (y.mapv(|v| (v - mean) / std), mean, std)
}

/// Computes differences between x and each element of y
/// resulting in a 2d array of shape (nrows(y), ncols(x));
/// *Panics* if x and y have not the same number of components
pub fn differences<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    assert!(x.len() == y.ncols());
    x.to_owned() - y
}

/// Computes squared euclidean distances between rows of x and rows of y
/// after dividing each component by the given `scale` (broadcasted when of length 1).
/// Result is a (nrows(x), nrows(y)) matrix.
pub fn scaled_sq_distances<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    scale: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array2<F> {
    let scale = broadcast_scale(scale, x.ncols());
    let xs = x / &scale;
    let ys = y / &scale;
    let mut d2 = Array2::zeros((x.nrows(), y.nrows()));
    for (i, xi) in xs.rows().into_iter().enumerate() {
        for (j, yj) in ys.rows().into_iter().enumerate() {
            d2[[i, j]] = xi
                .iter()
                .zip(yj.iter())
                .fold(F::zero(), |acc, (a, b)| acc + (*a - *b) * (*a - *b));
        }
    }
    d2
}

/// Expand a length-1 scale array to `dim` components, other arrays are returned unchanged
pub fn broadcast_scale<F: Float>(
    scale: &ArrayBase<impl Data<Elem = F>, Ix1>,
    dim: usize,
) -> Array1<F> {
    if scale.len() == 1 {
        Array1::from_elem(dim, scale[0])
    } else {
        scale.to_owned()
    }
}

/// Check whether x contains at least twice the same row
pub fn has_duplicated_rows<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> bool {
    let n = x.nrows();
    if n < 2 {
        return false;
    }
    let sums = (0..n - 1)
        .map(|k| {
            let diff = differences(&x.row(k), &x.slice(ndarray::s![k + 1.., ..]));
            let sums = diff
                .mapv(|v| num_traits::float::Float::abs(v))
                .sum_axis(Axis(1));
            *sums.min().unwrap_or(&F::infinity())
        })
        .collect::<Array1<F>>();
    sums.min().map(|m| *m == F::zero()).unwrap_or(false)
}

#[inline(always)]
pub(crate) fn into_f64<F: Float>(v: F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_normalize_target() {
        let y = array![1., 2., 3.];
        let (ynorm, mean, std) = normalize_target(&y);
        assert_abs_diff_eq!(mean, 2.);
        assert_abs_diff_eq!(std, (2f64 / 3.).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(ynorm.sum(), 0., epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_constant_target() {
        let y = array![4., 4., 4.];
        let target = NormalizedTarget::new(&y, true);
        assert_abs_diff_eq!(target.std, 1.);
        assert_abs_diff_eq!(target.data, array![0., 0., 0.]);
        assert_abs_diff_eq!(target.denormalize(&target.data), y);
    }

    #[test]
    fn test_not_normalized_target() {
        let y = array![1., -3., 7.];
        let target = NormalizedTarget::new(&y, false);
        assert_abs_diff_eq!(target.data, y);
        assert_abs_diff_eq!(target.mean, 0.);
        assert_abs_diff_eq!(target.std, 1.);
    }

    #[test]
    fn test_differences() {
        let x = array![1., 2.];
        let y = array![[0., 0.], [1., 1.], [3., 5.]];
        let expected = array![[1., 2.], [0., 1.], [-2., -3.]];
        assert_abs_diff_eq!(differences(&x, &y), expected);
    }

    #[test]
    fn test_scaled_sq_distances() {
        let x = array![[0., 0.], [1., 2.]];
        let y = array![[1., 0.], [0., 0.], [1., 2.]];
        let d2 = scaled_sq_distances(&x, &y, &array![1., 2.]);
        let expected = array![[1., 0., 2.], [1., 2., 0.]];
        assert_abs_diff_eq!(d2, expected, epsilon = 1e-12);

        let d2 = scaled_sq_distances(&x, &y, &array![2.]);
        let expected = array![[0.25, 0., 1.25], [1., 1.25, 0.]];
        assert_abs_diff_eq!(d2, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_has_duplicated_rows() {
        let x = array![[0., 1.], [2., 3.], [0., 1.]];
        assert!(has_duplicated_rows(&x));
        let x = array![[0., 1.], [2., 3.], [0., 1.5]];
        assert!(!has_duplicated_rows(&x));
        let x = array![[0., 1.]];
        assert!(!has_duplicated_rows(&x));
    }
}

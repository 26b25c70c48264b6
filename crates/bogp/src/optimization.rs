use crate::utils::into_f64;
use ndarray::{arr1, s, Array, Array1, Array2, Zip};
use ndarray_rand::rand::Rng;

use linfa::prelude::Float;

pub(crate) struct CobylaParams {
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-4,
            maxeval: 200,
        }
    }
}

/// Build `n_start + 1` starting points for likelihood optimization:
/// the current kernel `theta0` first, then points drawn uniformly within `bounds`.
///
/// `theta0` and `bounds` are expected in log space.
pub(crate) fn prepare_multistart<F: Float, R: Rng>(
    n_start: usize,
    theta0: &Array1<F>,
    bounds: &[(F, F)],
    rng: &mut R,
) -> Array2<F> {
    let mut theta0s = Array2::zeros((n_start + 1, theta0.len()));
    theta0s.row_mut(0).assign(theta0);

    if n_start > 0 {
        let seeds = Array::from_shape_fn((n_start, bounds.len()), |(_, j)| {
            let (lo, up) = bounds[j];
            lo + (up - lo) * F::cast(rng.gen::<f64>())
        });
        Zip::from(theta0s.slice_mut(s![1.., ..]).rows_mut())
            .and(seeds.rows())
            .for_each(|mut theta, row| theta.assign(&row));
    }
    theta0s
}

/// Optimize gp hyper parameters given an initial guess and bounds with cobyla
pub(crate) fn optimize_params<ObjF, F>(
    objfn: ObjF,
    param0: &Array1<F>,
    bounds: &[(F, F)],
    cobyla: CobylaParams,
) -> (f64, Array1<f64>)
where
    ObjF: Fn(&[f64], Option<&mut [f64]>, &mut ()) -> f64,
    F: Float,
{
    use cobyla::{minimize, Func, StopTols};

    let cons: Vec<&dyn Func<()>> = vec![];
    let param0 = param0.mapv(into_f64).into_raw_vec();

    let bounds: Vec<_> = bounds
        .iter()
        .map(|(lo, up)| (into_f64(*lo), into_f64(*up)))
        .collect();

    match minimize(
        |x, u| objfn(x, None, u),
        &param0,
        &bounds,
        &cons,
        (),
        cobyla.maxeval,
        cobyla::RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, fval)) => {
            let params_opt = arr1(&x_opt);
            let fval = if f64::is_nan(fval) {
                f64::INFINITY
            } else {
                fval
            };
            (fval, params_opt)
        }
        Err((status, x_opt, _)) => {
            log::warn!("ERROR Cobyla optimizer in GPR status={status:?}");
            (f64::INFINITY, arr1(&x_opt))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn test_prepare_multistart() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let theta0 = array![0.5, -1.];
        let bounds = [(-2., 2.), (-3., 1.)];
        let starts = prepare_multistart(5, &theta0, &bounds, &mut rng);
        assert_eq!(starts.dim(), (6, 2));
        assert_abs_diff_eq!(starts.row(0), theta0);
        for row in starts.rows() {
            assert!(row[0] >= -2. && row[0] <= 2.);
            assert!(row[1] >= -3. && row[1] <= 1.);
        }
        let starts = prepare_multistart(0, &theta0, &bounds, &mut rng);
        assert_eq!(starts.dim(), (1, 2));
    }

    #[test]
    fn test_optimize_params() {
        let objfn = |x: &[f64], _gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
            (x[0] - 1.).powi(2) + (x[1] + 0.5).powi(2)
        };
        let (fmin, xopt) = optimize_params(
            objfn,
            &array![0., 0.],
            &[(-2., 2.), (-2., 2.)],
            CobylaParams {
                maxeval: 500,
                ftol_rel: 1e-8,
                ..CobylaParams::default()
            },
        );
        assert_abs_diff_eq!(fmin, 0., epsilon = 1e-4);
        assert_abs_diff_eq!(xopt, array![1., -0.5], epsilon = 1e-2);
    }
}

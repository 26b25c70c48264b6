use bogp::{kernels::*, GaussianProcessRegressor, NoiseModel, PredictOptions, BOGP_LOG};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use env_logger::{Builder, Env};
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array, Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn griewank(x: &Array2<f64>) -> Array1<f64> {
    let dim = x.ncols();
    let d = Array1::linspace(1., dim as f64, dim).mapv(|v| v.sqrt());
    x.map_axis(Axis(1), |row| {
        row.mapv(|v| v * v).sum() / 4000.
            - (&row / &d).mapv(|v| v.cos()).fold(1., |acc, x| acc * x)
            + 1.0
    })
}

fn criterion_gpr(c: &mut Criterion) {
    let env = Env::new().filter_or(BOGP_LOG, "error");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let dims = [2, 5];
    let nts = [50, 100];

    let mut group = c.benchmark_group("gpr");
    group.sample_size(10);
    for (&dim, &nt) in dims.iter().zip(nts.iter()) {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array::random_using((nt, dim), Uniform::new(-10., 10.), &mut rng);
        let yt = griewank(&xt);
        let dataset = Dataset::new(xt, yt);

        group.bench_function(format!("gpr fit {dim}"), |b| {
            b.iter(|| {
                black_box(
                    GaussianProcessRegressor::params(ConstantKernel::new(1.) * Matern::new(1.))
                        .noise(Some(NoiseModel::Gaussian))
                        .normalize_y(true)
                        .fit(&dataset)
                        .expect("GPR fitting"),
                )
            });
        });

        let gpr = GaussianProcessRegressor::params(ConstantKernel::new(1.) * Matern::new(1.))
            .noise(Some(NoiseModel::Gaussian))
            .normalize_y(true)
            .fit(&dataset)
            .expect("GPR fitting");
        let xtest = Array::random_using((100, dim), Uniform::new(-10., 10.), &mut rng);
        group.bench_function(format!("gpr predict gradients {dim}"), |b| {
            b.iter(|| {
                black_box(
                    gpr.predict_with(
                        &xtest,
                        PredictOptions::default().with_mean_grad().with_std_grad(),
                    )
                    .expect("GPR prediction"),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gpr);
criterion_main!(benches);

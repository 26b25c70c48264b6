use bogp::{kernels::*, GaussianProcessRegressor, NoiseModel, PredictOptions, BOGP_LOG};
use env_logger::{Builder, Env};
use linfa::prelude::*;
use ndarray::{arr2, concatenate, Array, Array2, Axis};

fn xsinx(x: &Array2<f64>) -> Array2<f64> {
    (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
}

fn main() {
    let env = Env::new().filter_or(BOGP_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
    let yt = xsinx(&xt).remove_axis(Axis(1));

    println!("Train GPR surrogate of 'xsinx' at {}", xt.column(0));
    let gpr = GaussianProcessRegressor::params(ConstantKernel::new(1.) * Matern::new(1.))
        .noise(Some(NoiseModel::Gaussian))
        .normalize_y(true)
        .n_start(5)
        .seed(Some(42))
        .fit(&Dataset::new(xt, yt))
        .expect("GPR fitting");
    println!("{gpr}");

    let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
    let ytest = xsinx(&xtest);
    let pred = gpr
        .predict_with(&xtest, PredictOptions::default().with_std_grad().with_mean_grad())
        .expect("GPR prediction");
    let ypred = pred.mean.insert_axis(Axis(1));
    let ysigma = pred.std.expect("GPR std").insert_axis(Axis(1));

    println!("Compute prediction errors (x, err(x), std(x))");
    println!("{}", concatenate![Axis(1), xtest, (ypred - ytest), ysigma]);
    println!("Gradients (dmean/dx, dstd/dx)");
    println!(
        "{}",
        concatenate![
            Axis(1),
            pred.mean_grad.expect("GPR mean gradient"),
            pred.std_grad.expect("GPR std gradient")
        ]
    );

    let samples = gpr.sample_y(&xtest, 3).expect("GPR sampling");
    println!("Posterior trajectories {}", samples);
}

use boltzmann_gp::Kriging;
use linfa::prelude::*;
use ndarray::{arr1, arr2, Array, Axis};

fn main() {
    env_logger::init();

    let xtrain = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0]]);
    let ytrain = arr1(&[0.0, 1.0, 1.5, 0.9, 1.0]);

    let kriging = Kriging::params()
        .fit(&Dataset::new(xtrain, ytrain))
        .expect("Kriging fitting");
    println!("{kriging}");

    let xtest = Array::linspace(0., 4., 9).insert_axis(Axis(1));
    let (ytest, yvar) = kriging.predict_valvar(&xtest).expect("Kriging prediction");
    for ((x, y), v) in xtest.iter().zip(ytest.iter()).zip(yvar.iter()) {
        println!("x = {x:.2}  y = {y:.4} +/- {:.4}", f64::sqrt(*v));
    }
}

use boltzmann_emulator::Emulator;
use boltzmann_gp::correlation_models::Matern52Corr;
use boltzmann_gp::mean_models::ConstantMean;
use linfa::ParamGuard;
use ndarray::{array, Array1, Array2, Axis};

/// Toy linear power spectrum: amplitude and tilt as cosmological parameters
fn power_spectrum(amplitude: f64, tilt: f64, k: f64, z: f64) -> f64 {
    amplitude * k.powf(tilt) / (1. + (k / 0.02).powi(3)) / (1. + z).powi(2)
}

fn main() {
    env_logger::init();

    let redshifts = array![0., 0.5, 1.];
    let k = Array1::logspace(10., -4., 1., 100);
    let (nz, nk) = (redshifts.len(), k.len());

    // 5 x 5 grid of training cosmologies
    let parameters = Array2::from_shape_fn((25, 2), |(i, j)| {
        if j == 0 {
            1.5 + 0.25 * (i / 5) as f64
        } else {
            0.92 + 0.02 * (i % 5) as f64
        }
    });
    let power_spectra = Array2::from_shape_fn((25, nz * nk), |(i, j)| {
        power_spectrum(
            parameters[[i, 0]],
            parameters[[i, 1]],
            k[j % nk],
            redshifts[j / nk],
        )
    });

    let params = Emulator::params(ConstantMean(), Matern52Corr())
        .n_components(4)
        .check()
        .expect("valid emulator parameters");
    let mut emulator = Emulator::new(&parameters, &redshifts, &k, &power_spectra, params)
        .expect("valid training set");
    emulator.train().expect("emulator training");
    println!("{emulator}");

    let cosmology = array![2.1, 0.965];
    let (spectrum, lower, upper) = emulator
        .predict_band(&cosmology.view().insert_axis(Axis(0)), 2.)
        .expect("emulator prediction");
    println!("   z        k      P_emu      P_true    2-sigma band");
    for (j, p) in spectrum.row(0).iter().enumerate().step_by(10) {
        let (kj, zj) = (k[j % nk], redshifts[j / nk]);
        let truth = power_spectrum(cosmology[0], cosmology[1], kj, zj);
        println!(
            "{zj:5.2} {kj:9.2e} {p:10.4e} {truth:10.4e}  [{:.4e}, {:.4e}]",
            lower[[0, j]],
            upper[[0, j]]
        );
    }
}

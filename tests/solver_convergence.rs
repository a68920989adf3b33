//! Convergence tests for the packet integrator
//!
//! With the current evaluated at the start of every step the packet scheme
//! overestimates the current by roughly `(k_f + k_b)·Δt / 2`. Refining the
//! sampling must bring it towards the reversible response.

use redox_rs::solver::{NernstianIntegrator, PacketIntegrator};

mod common;
use common::{cv_sequence, relative_max_error, run_unfiltered, single_population};

fn step_start_error(points_per_volt: f64) -> f64 {
    let applied = cv_sequence(0.4, -0.4, 0.1, points_per_volt);
    let pops = single_population(1e-10, 0.0, 1e3);
    let packet = run_unfiltered(&PacketIntegrator::new(), &pops, &applied, 0.0);
    let reference = run_unfiltered(&NernstianIntegrator::new(), &pops, &applied, 0.0);
    relative_max_error(&packet, &reference)
}

#[test]
fn test_step_start_converges_to_reversible_limit() {
    let coarse = step_start_error(5e4);
    let fine = step_start_error(2e5);
    println!("relative max error: {coarse:.4} -> {fine:.4}");

    assert!(fine < coarse, "refinement did not help: {coarse} -> {fine}");
    assert!(fine < 0.1, "error {fine} too large at 2e5 points per volt");
}

#[test]
fn test_convergence_is_roughly_first_order() {
    let errors: Vec<f64> = [5e4, 1e5, 2e5].iter().map(|&ppv| step_start_error(ppv)).collect();
    for pair in errors.windows(2) {
        let ratio = pair[0] / pair[1];
        println!("convergence ratio: {ratio:.3}");
        assert!(ratio > 1.5 && ratio < 2.6, "ratio {ratio} is not first order");
    }
}

use assert_approx_eq::assert_approx_eq;
use sir_quant::{
    integrate, linspace, quantize, ModelParameters, RunConfig, ScalarQuantizer, SirError,
    StateVector,
};

fn reference_trajectory() -> sir_quant::Trajectory {
    let params = ModelParameters::new(1000.0, 0.2, 0.1).unwrap();
    let initial = StateVector::seeded(1000.0, 1.0, 0.0);
    let grid = linspace(0.0, 160.0, 160).unwrap();
    integrate(&params, &initial, &grid).unwrap()
}

#[test]
fn reference_curve_rises_then_falls() {
    let trajectory = reference_trajectory();
    assert_eq!(trajectory.len(), 160);
    assert_eq!(trajectory.times()[0], 0.0);
    assert_eq!(trajectory.times()[159], 160.0);

    let infected = trajectory.infected();
    let (peak_time, peak) = trajectory.peak().unwrap();
    assert!(peak_time > 0.0 && peak_time < 160.0);
    assert!(infected[159] < peak / 10.0);

    let susceptible = trajectory.susceptible();
    let removed = trajectory.removed();
    assert!(susceptible.windows(2).all(|w| w[1] <= w[0]));
    assert!(removed.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn population_is_conserved() {
    let trajectory = reference_trajectory();
    for state in trajectory.states() {
        assert_approx_eq!(state.total(), 1000.0, 1e-6);
        assert!(state.susceptible >= 0.0 && state.infected >= 0.0 && state.removed >= 0.0);
    }
}

#[test]
fn quantizing_reference_curve_is_deterministic() {
    let signal = reference_trajectory().infected_fraction();
    let partitions = [0.02, 0.05, 0.1];
    let codebook = [0.0, 0.035, 0.075, 0.15];

    let first = quantize(&signal, &partitions, &codebook).unwrap();
    let second = quantize(&signal, &partitions, &codebook).unwrap();
    assert_eq!(first, second);

    let quantizer = ScalarQuantizer::new(partitions.to_vec(), codebook.to_vec()).unwrap();
    assert_eq!(quantizer.quantize(&signal), first);

    // Every sample lies in the region its index names
    for (&x, &k) in signal.iter().zip(&first.indices) {
        if k > 0 {
            assert!(x > partitions[k - 1]);
        }
        if k < partitions.len() {
            assert!(x <= partitions[k]);
        }
    }
}

#[test]
fn boundary_sample_takes_threshold_index() {
    let quantized = quantize(&[0.5], &[0.5], &[0.0, 1.0]).unwrap();
    assert_eq!(quantized.indices, vec![0]);
    assert_eq!(quantized.quanta, vec![0.0]);
}

#[test]
fn invalid_inputs_are_reported() {
    assert!(matches!(
        ModelParameters::new(1000.0, -0.2, 0.1),
        Err(SirError::InvalidParameters(_))
    ));
    assert!(matches!(
        quantize(&[0.1], &[0.3, 0.2], &[0.0, 1.0, 2.0]),
        Err(SirError::UnsortedPartitions { position: 1 })
    ));
    assert!(matches!(
        quantize(&[5.0], &[1.0], &[0.0]),
        Err(SirError::CodebookTooShort { index: 1, len: 1 })
    ));
}

#[test]
fn default_configuration_runs_end_to_end() {
    let (trajectory, signal, quantized) = sir_quant::runner::run(&RunConfig::default()).unwrap();
    assert_eq!(trajectory.len(), signal.len());
    assert_eq!(signal.len(), quantized.len());
    assert!(quantized.mean_squared_error(&signal) < 0.1);
}

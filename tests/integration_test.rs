//! End-to-end tests driving the engine the way the CLI does: YAML
//! configuration in, scan and critical-temperature estimate out.

use std::path::PathBuf;

use ising_mc::config::ScanConfig;
use ising_mc::scan::{find_critical_temperature, scan_temperature};
use ising_mc::session::SessionRegistry;

/// Helper function to get the path to example files
fn example_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("example")
        .join(filename)
}

#[test]
fn test_example_config_loads_and_validates() {
    let config_path = example_path("scan.yaml");
    let config = ScanConfig::from_file(&config_path).unwrap();

    assert_eq!(config.lattice.size, 20);
    assert_eq!(config.scan.t_steps, 25);
    assert_eq!(config.seed, Some(42));
    assert!(config.params().validate().is_ok());
}

#[test]
fn test_config_driven_scan_end_to_end() {
    let config = ScanConfig::from_file(example_path("scan.yaml")).unwrap();

    // Shrink the sampling so the test stays fast; the parameter flow is
    // what is under test here, not the statistics.
    let mut params = config.params();
    params.size = 10;
    params.t_steps = 5;
    params.equilibration_steps = 300;
    params.measurement_steps = 300;

    let result = scan_temperature(&params).unwrap();
    assert_eq!(result.points.len(), 5);
    assert_eq!(result.points[0].temperature, params.t_min);
    assert_eq!(result.points[4].temperature, params.t_max);
    assert!(result
        .points
        .windows(2)
        .all(|pair| pair[0].temperature < pair[1].temperature));
}

#[test]
fn test_critical_temperature_estimate_end_to_end() {
    let config = ScanConfig::from_file(example_path("scan.yaml")).unwrap();

    let mut params = config.params();
    params.size = 10;
    params.t_min = 1.5;
    params.t_max = 3.5;
    params.t_steps = 9;
    params.equilibration_steps = 500;
    params.measurement_steps = 500;

    let estimate = find_critical_temperature(&params).unwrap();
    assert_eq!(estimate.t_c_theoretical, 2.269);
    assert!(estimate.t_c_experimental >= params.t_min);
    assert!(estimate.t_c_experimental <= params.t_max);
    assert_eq!(estimate.scan.points.len(), 9);
    assert!(estimate.error_percent >= 0.0);
}

#[test]
fn test_interactive_session_flow() {
    // The request sequence of an interactive front-end: init with custom
    // parameters, run a batch of trials, toggle a spin, cool the lattice.
    let registry = SessionRegistry::new();
    let (id, state) = registry.create(16, 2.5, 1.0, 0.0, None).unwrap();
    assert_eq!(state.size, 16);

    let (accepted, state) = registry.step(&id, 1000).unwrap();
    assert!(accepted <= 1000);
    assert!(state.magnetization >= -1.0 && state.magnetization <= 1.0);

    let before = state.spins[3][7];
    let state = registry.flip_spin(&id, 3, 7).unwrap();
    assert_eq!(state.spins[3][7], -before);

    let state = registry.update_params(&id, Some(0.5), None, None).unwrap();
    assert_eq!(state.temperature, 0.5);
}

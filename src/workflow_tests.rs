use super::*;
use crate::error::UqError;
use crate::falsification::{ConsistencyRule, Envelope};

/// Realizations [theta, 2 theta] for theta in 0..40.
fn linear_ensemble() -> (Matrix<f64>, Matrix<f64>) {
    let thetas: Vec<f64> = (0..40).map(f64::from).collect();
    let data: Vec<f64> = thetas.iter().flat_map(|t| [*t, 2.0 * t]).collect();
    (
        Matrix::from_vec(40, 2, data).expect("40x2"),
        Matrix::from_vec(40, 1, thetas).expect("40x1"),
    )
}

fn first_column(x: &Matrix<f64>) -> crate::Result<Matrix<f64>> {
    Ok(Matrix::from_vec(x.n_rows(), 1, x.column(0))?)
}

#[test]
fn test_consistent_observation_yields_posterior() {
    let (prior, params) = linear_ensemble();
    let observed = Matrix::from_vec(2, 2, vec![10.0, 20.0, 30.0, 60.0]).expect("2x2");

    let outcome = UqWorkflow::new(2)
        .with_policy(NeighborPolicy::new(1))
        .with_random_state(17)
        .run(&prior, &observed, &prior, &params, &first_column, 25)
        .expect("run");

    assert!(!outcome.is_falsified());
    assert!(outcome.report().is_consistent());
    let posteriors = outcome.posteriors().expect("posterior");
    assert_eq!(posteriors.len(), 2);
    assert!(posteriors[0].samples().as_slice().iter().all(|&v| v == 10.0));
    assert!(posteriors[1].samples().as_slice().iter().all(|&v| v == 30.0));
}

#[test]
fn test_falsified_observation_skips_sampling() {
    let (prior, params) = linear_ensemble();
    let observed = Matrix::from_vec(1, 2, vec![500.0, 1000.0]).expect("1x2");

    let outcome = UqWorkflow::new(1)
        .run(&prior, &observed, &prior, &params, &first_column, 25)
        .expect("run");

    assert!(outcome.is_falsified());
    assert!(outcome.posteriors().is_none());
    assert_eq!(outcome.report().failing_components(), vec![0]);
}

#[test]
fn test_mapping_is_not_called_when_falsified() {
    let (prior, params) = linear_ensemble();
    let observed = Matrix::from_vec(1, 2, vec![-100.0, -200.0]).expect("1x2");
    let failing = |_: &Matrix<f64>| -> crate::Result<Matrix<f64>> { Err("mapping called".into()) };

    let outcome = UqWorkflow::new(1)
        .run(&prior, &observed, &prior, &params, &failing, 5)
        .expect("falsification returns before the mapping runs");
    assert!(outcome.is_falsified());
}

#[test]
fn test_leading_component_rule_ignores_minor_axes() {
    let (prior, params) = linear_ensemble();
    // On the line's extent but off the line itself.
    let observed = Matrix::from_vec(1, 2, vec![20.0, 35.0]).expect("1x2");

    let strict = UqWorkflow::new(2)
        .run(&prior, &observed, &prior, &params, &first_column, 5)
        .expect("run");
    assert!(strict.is_falsified());

    let lenient = UqWorkflow::new(2)
        .with_falsification(
            FalsificationConfig::default()
                .with_envelope(Envelope::MinMax)
                .with_rule(ConsistencyRule::LeadingComponents(1)),
        )
        .with_policy(NeighborPolicy::new(2))
        .with_random_state(1)
        .run(&prior, &observed, &prior, &params, &first_column, 5)
        .expect("run");
    assert!(!lenient.is_falsified());
}

#[test]
fn test_workflow_propagates_errors() {
    let (prior, params) = linear_ensemble();
    let observed = Matrix::from_vec(1, 2, vec![5.0, 10.0]).expect("1x2");

    assert!(matches!(
        UqWorkflow::new(3).run(&prior, &observed, &prior, &params, &first_column, 5),
        Err(UqError::DegenerateBasis { .. })
    ));
    assert!(matches!(
        UqWorkflow::new(1)
            .with_policy(NeighborPolicy::new(41))
            .run(&prior, &observed, &prior, &params, &first_column, 5),
        Err(UqError::InsufficientCalibrationData { .. })
    ));
    let short_params = params.select_rows(&[0, 1, 2]);
    assert!(matches!(
        UqWorkflow::new(1).run(&prior, &observed, &prior, &short_params, &first_column, 5),
        Err(UqError::AlignmentError { .. })
    ));
}

#[test]
fn test_workflow_is_reproducible_with_seed() {
    let (prior, params) = linear_ensemble();
    let observed = Matrix::from_vec(1, 2, vec![15.0, 30.0]).expect("1x2");
    let workflow = UqWorkflow::new(1)
        .with_policy(NeighborPolicy::new(5))
        .with_random_state(99);

    let a = workflow
        .run(&prior, &observed, &prior, &params, &first_column, 50)
        .expect("run");
    let b = workflow
        .run(&prior, &observed, &prior, &params, &first_column, 50)
        .expect("run");
    assert_eq!(a, b);
}

#[test]
fn test_workflow_config_serde_round_trip() {
    let workflow = UqWorkflow::new(3)
        .with_policy(NeighborPolicy::new(4))
        .with_random_state(7);
    let json = serde_json::to_string(&workflow).expect("serialize");
    let back: UqWorkflow = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, workflow);
}

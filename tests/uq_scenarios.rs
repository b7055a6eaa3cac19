//! End-to-end uncertainty quantification scenarios.
//!
//! Gaussian prior ensembles are generated with fixed seeds. Falsification
//! verdicts on random draws are checked as rates over many trials rather
//! than single outcomes.

use mcuq::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StandardNormal};

fn gaussian(rng: &mut StdRng, rows: usize, cols: usize, mean: f64) -> Matrix<f64> {
    let data: Vec<f64> = (0..rows * cols)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            mean + z
        })
        .collect();
    Matrix::from_vec(rows, cols, data).expect("rows * cols values")
}

#[test]
fn standard_normal_observations_are_consistent_with_standard_normal_prior() {
    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 100;
    let mut consistent = 0;
    for _ in 0..trials {
        let prior = gaussian(&mut rng, 100, 5, 0.0);
        let observed = gaussian(&mut rng, 5, 5, 0.0);
        let (_, report) = PriorFalsification::new()
            .fit_evaluate(&prior, &observed, 2)
            .expect("fit and evaluate");
        if report.is_consistent() {
            consistent += 1;
        }
    }
    // Expected rate is about 80% for 5 draws checked on 2 axes.
    assert!(consistent >= 60, "only {consistent}/{trials} consistent");
}

#[test]
fn shifted_observations_falsify_standard_normal_prior() {
    let mut rng = StdRng::seed_from_u64(77);
    let trials = 100;
    let mut falsified = 0;
    for _ in 0..trials {
        let prior = gaussian(&mut rng, 100, 5, 0.0);
        let observed = gaussian(&mut rng, 5, 5, 10.0);
        let (_, report) = PriorFalsification::new()
            .fit_evaluate(&prior, &observed, 2)
            .expect("fit and evaluate");
        if !report.is_consistent() {
            assert!(!report.failing_components().is_empty());
            assert!(report.max_margin() > 0.0);
            falsified += 1;
        }
    }
    assert!(falsified >= 80, "only {falsified}/{trials} falsified");
}

/// 50 held-out realizations with N(0, I) truths and predictions perturbed by
/// N(0, 0.05^2) noise.
fn noisy_calibration(seed: u64) -> (Matrix<f64>, Matrix<f64>, CalibrationModel) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE_STD).expect("valid normal");
    let truth = gaussian(&mut rng, 50, 2, 0.0);
    let predicted_data: Vec<f64> = truth
        .as_slice()
        .iter()
        .map(|t| t + noise.sample(&mut rng))
        .collect();
    let predicted = Matrix::from_vec(50, 2, predicted_data).expect("50x2");
    let model = CalibrationModel::calibrate(&truth, &predicted).expect("aligned");
    (truth, predicted, model)
}

const NOISE_STD: f64 = 0.05;

fn mean_errors(truth: &Matrix<f64>, sets: &[PosteriorSampleSet]) -> Vec<f64> {
    sets.iter()
        .enumerate()
        .flat_map(|(row, set)| {
            set.mean()
                .into_iter()
                .enumerate()
                .map(move |(p, m)| (m - truth.get(row, p)).abs())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn average_std(sets: &[PosteriorSampleSet]) -> f64 {
    let stds: Vec<f64> = sets.iter().flat_map(PosteriorSampleSet::std).collect();
    stds.iter().sum::<f64>() / stds.len() as f64
}

#[test]
fn kernel_weighted_posterior_mean_tracks_truth_on_every_row() {
    let (truth, predicted, model) = noisy_calibration(5);
    let sampler = EmpiricalPosteriorSampler::new()
        .with_policy(NeighborPolicy::new(10).with_weighting(Weighting::Gaussian { bandwidth: 0.1 }))
        .with_random_state(11);

    let sets = sampler.sample(&model, &predicted, 2000).expect("sample");
    assert_eq!(sets.len(), 50);
    // The kernel spreads weight over several rows, so draws are not all the
    // query row's own truth.
    assert!(sets.iter().any(|s| s.std().iter().any(|&v| v > 0.0)));

    let mut errors = mean_errors(&truth, &sets);
    for (i, e) in errors.iter().enumerate() {
        assert!(*e < 5.0 * NOISE_STD, "row {} param {}: error {e}", i / 2, i % 2);
    }
    errors.sort_by(f64::total_cmp);
    let median = errors[errors.len() / 2];
    assert!(median < NOISE_STD, "median error {median}");
}

#[test]
fn uniform_neighborhood_is_broader_than_kernel_weighting() {
    let (_, predicted, model) = noisy_calibration(8);
    let uniform = EmpiricalPosteriorSampler::new()
        .with_random_state(2)
        .sample(&model, &predicted, 500)
        .expect("sample");
    let kernel = EmpiricalPosteriorSampler::new()
        .with_policy(NeighborPolicy::default().with_weighting(Weighting::Gaussian { bandwidth: 0.1 }))
        .with_random_state(2)
        .sample(&model, &predicted, 500)
        .expect("sample");

    let uniform_std = average_std(&uniform);
    let kernel_std = average_std(&kernel);
    assert!(
        uniform_std > 2.0 * kernel_std,
        "uniform {uniform_std} vs kernel {kernel_std}"
    );
}

#[test]
fn inverse_distance_collapses_onto_exact_match() {
    let (truth, predicted, model) = noisy_calibration(5);
    let sampler = EmpiricalPosteriorSampler::new()
        .with_policy(NeighborPolicy::new(3).with_weighting(Weighting::InverseDistance))
        .with_random_state(11);

    for row in [0, 13, 27, 49] {
        let sets = sampler
            .sample(&model, &predicted.select_rows(&[row]), 100)
            .expect("sample");
        let mean = sets[0].mean();
        for p in 0..2 {
            assert!((mean[p] - truth.get(row, p)).abs() < 1e-12);
            assert!(sets[0].std()[p] < 1e-12);
        }
        assert!(sets[0]
            .samples()
            .rows()
            .all(|r| r == truth.row(row)));
    }
}

#[test]
fn misaligned_calibration_is_rejected() {
    let truth = Matrix::zeros(50, 2);
    let predicted = Matrix::zeros(48, 2);
    assert!(matches!(
        CalibrationModel::calibrate(&truth, &predicted),
        Err(UqError::AlignmentError { .. })
    ));
}

#[test]
fn neighborhood_larger_than_calibration_set_is_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    let truth = gaussian(&mut rng, 8, 2, 0.0);
    let model = CalibrationModel::calibrate(&truth, &truth).expect("aligned");
    let err = EmpiricalPosteriorSampler::new()
        .with_policy(NeighborPolicy::new(9))
        .sample(&model, &truth.select_rows(&[0]), 10)
        .unwrap_err();
    assert_eq!(
        err,
        UqError::InsufficientCalibrationData {
            required: 9,
            available: 8
        }
    );
}

#[test]
fn reconstruction_error_shrinks_with_more_components() {
    let mut rng = StdRng::seed_from_u64(9);
    let prior = gaussian(&mut rng, 40, 6, 1.0);

    let mut previous = f64::INFINITY;
    for k in 1..=6 {
        let basis = PcaBasis::fit(&prior, k).expect("fit");
        let restored = basis
            .reconstruct(&basis.project(&prior).expect("project"))
            .expect("reconstruct");
        let error: f64 = prior
            .as_slice()
            .iter()
            .zip(restored.as_slice())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        assert!(error <= previous + 1e-9, "k={k}: {error} > {previous}");
        previous = error;
    }
    assert!(previous < 1e-9);
}

#[test]
fn workflow_with_mapping_closure() {
    // Data = [theta_0, theta_1, theta_0 + theta_1]; the mapping reads the
    // first two columns back with a small bias.
    let mut rng = StdRng::seed_from_u64(31);
    let params = gaussian(&mut rng, 120, 2, 0.0);
    let data: Vec<f64> = params
        .rows()
        .flat_map(|r| [r[0], r[1], r[0] + r[1]])
        .collect();
    let prior = Matrix::from_vec(120, 3, data).expect("120x3");
    let mapping = |x: &Matrix<f64>| -> mcuq::Result<Matrix<f64>> {
        let out: Vec<f64> = x.rows().flat_map(|r| [r[0] + 0.1, r[1] - 0.1]).collect();
        Ok(Matrix::from_vec(x.n_rows(), 2, out)?)
    };

    let (fit_rows, heldout_rows): (Vec<usize>, Vec<usize>) = (0..120).partition(|i| i % 3 != 0);
    let prior_fit = prior.select_rows(&fit_rows);
    let heldout = prior.select_rows(&heldout_rows);
    let heldout_params = params.select_rows(&heldout_rows);
    let observed = prior_fit.select_rows(&[0]);

    let outcome = UqWorkflow::new(2)
        .with_policy(NeighborPolicy::new(4).with_jitter(Jitter::ResidualShift))
        .with_random_state(3)
        .run(&prior_fit, &observed, &heldout, &heldout_params, &mapping, 200)
        .expect("run");

    let posteriors = outcome.posteriors().expect("observation comes from the prior");
    // The residual shift removes the mapping's constant bias exactly.
    let expected = params.row(fit_rows[0]);
    let mean = posteriors[0].mean();
    assert!((mean[0] - expected[0]).abs() < 1e-9);
    assert!((mean[1] - expected[1]).abs() < 1e-9);
}

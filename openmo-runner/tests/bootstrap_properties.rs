//! Bootstrap simulator properties over whole runs.

use openmo_runner::bootstrap::{path_max_drawdown_pct, run_bootstrap, BootstrapConfig};
use openmo_runner::BootstrapError;
use proptest::prelude::*;

fn config(trials: usize, seed: u64) -> BootstrapConfig {
    BootstrapConfig {
        num_trials: trials,
        seed,
        ..BootstrapConfig::default()
    }
}

fn twenty_days() -> Vec<f64> {
    vec![
        120.0, -80.0, 45.5, -200.0, 310.0, 15.0, -60.0, 0.0, 95.0, -150.0, 40.0, 220.0, -35.0,
        -90.0, 60.0, 130.0, -10.0, 75.0, -45.0, 5.0,
    ]
}

#[test]
fn every_trial_walks_the_full_sequence_length() {
    let pnl = twenty_days();
    let result = run_bootstrap(&pnl, &config(1000, 7)).unwrap();
    assert_eq!(result.runs.len(), 1000);
    assert_eq!(result.summary.days_per_trial, 20);

    for run in &result.runs {
        let path = run.equity_path.as_ref().unwrap();
        assert_eq!(path.len(), 21);
        assert_eq!(path[0], 5000.0);
        assert_eq!(*path.last().unwrap(), run.final_equity);
        for step in path.windows(2) {
            let drawn = step[1] - step[0];
            assert!(
                pnl.iter().any(|v| (v - drawn).abs() < 1e-9),
                "step {drawn} is not a value of the sequence"
            );
        }
        assert!((run.max_drawdown_pct - path_max_drawdown_pct(path)).abs() < 1e-9);
    }
}

#[test]
fn same_seed_same_result_regardless_of_parallelism() {
    let pnl = twenty_days();
    let parallel = run_bootstrap(&pnl, &config(200, 99)).unwrap();
    let sequential = run_bootstrap(
        &pnl,
        &BootstrapConfig {
            parallel: false,
            ..config(200, 99)
        },
    )
    .unwrap();
    assert_eq!(parallel.runs, sequential.runs);
    assert_eq!(parallel.summary, sequential.summary);
}

#[test]
fn different_seeds_diverge() {
    let pnl = twenty_days();
    let a = run_bootstrap(&pnl, &config(100, 1)).unwrap();
    let b = run_bootstrap(&pnl, &config(100, 2)).unwrap();
    assert_ne!(a.runs, b.runs);
}

#[test]
fn all_winning_days_never_draw_down() {
    let result = run_bootstrap(&[100.0, 100.0, 100.0], &config(50, 3)).unwrap();
    for run in &result.runs {
        assert_eq!(run.final_equity, 5300.0);
        assert_eq!(run.max_drawdown_pct, 0.0);
    }
    assert_eq!(result.summary.ruin_probability, 0.0);
    assert_eq!(result.summary.drawdown_p95_pct, 0.0);
    assert_eq!(result.summary.mean_net_profit, 300.0);
}

#[test]
fn ruin_is_strictly_below_threshold() {
    // 5000 - 2500 lands exactly on the threshold: not ruin.
    let on_threshold = run_bootstrap(&[-2500.0], &config(20, 4)).unwrap();
    assert_eq!(on_threshold.summary.ruin_probability, 0.0);

    let below = run_bootstrap(&[-2500.01], &config(20, 4)).unwrap();
    assert_eq!(below.summary.ruin_probability, 1.0);
}

#[test]
fn losing_three_thousand_a_day_is_certain_ruin() {
    let result = run_bootstrap(&[-3000.0, -3000.0], &config(100, 6)).unwrap();
    assert_eq!(result.summary.ruin_probability, 1.0);
    assert_eq!(result.summary.ruin_threshold, 2500.0);
}

#[test]
fn equity_may_go_negative() {
    let result = run_bootstrap(&[-6000.0], &config(5, 5)).unwrap();
    let run = &result.runs[0];
    assert_eq!(run.final_equity, -1000.0);
    assert!((run.max_drawdown_pct - 120.0).abs() < 1e-9);
}

#[test]
fn histograms_count_every_trial() {
    let result = run_bootstrap(&twenty_days(), &config(300, 11)).unwrap();
    let finals: usize = result.summary.final_equity_histogram.counts.iter().sum();
    let dds: usize = result.summary.drawdown_histogram.counts.iter().sum();
    assert_eq!(finals, 300);
    assert_eq!(dds, 300);
}

#[test]
fn input_validation() {
    assert_eq!(
        run_bootstrap(&[], &config(10, 0)).unwrap_err(),
        BootstrapError::EmptySequence
    );
    assert_eq!(
        run_bootstrap(&[1.0, f64::NAN], &config(10, 0)).unwrap_err(),
        BootstrapError::NonFiniteValue { index: 1 }
    );
    assert_eq!(
        run_bootstrap(&[1.0], &config(0, 0)).unwrap_err(),
        BootstrapError::ZeroTrials
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn summary_is_consistent_with_runs(
        pnl in prop::collection::vec(-500.0f64..500.0, 1..40),
        seed in any::<u64>(),
    ) {
        let cfg = BootstrapConfig { num_trials: 64, seed, ..BootstrapConfig::default() };
        let result = run_bootstrap(&pnl, &cfg).unwrap();
        let s = &result.summary;

        prop_assert!(s.min_final_equity <= s.mean_final_equity + 1e-9);
        prop_assert!(s.mean_final_equity <= s.max_final_equity + 1e-9);
        prop_assert!((s.mean_net_profit - (s.mean_final_equity - 5000.0)).abs() < 1e-6);
        prop_assert!((0.0..=1.0).contains(&s.ruin_probability));
        prop_assert!(s.drawdown_p95_pct >= 0.0);

        let worst = result.runs.iter().map(|r| r.max_drawdown_pct).fold(0.0, f64::max);
        prop_assert!(s.drawdown_p95_pct <= worst + 1e-9);

        let lo = pnl.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = pnl.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let days = pnl.len() as f64;
        for run in &result.runs {
            prop_assert!(run.max_drawdown_pct >= 0.0);
            prop_assert!(run.final_equity >= 5000.0 + lo * days - 1e-6);
            prop_assert!(run.final_equity <= 5000.0 + hi * days + 1e-6);
        }
    }
}

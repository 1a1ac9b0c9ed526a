mod common;

use common::{CLASSES, all_weights, convnet, empty_loader, test_loader};
use machine_learning::training::evaluate;
use pruning::{PruneErr, SweepConfig, default_policies, sweep};

fn config(steps: usize, parallel: bool) -> SweepConfig {
    SweepConfig {
        steps,
        parallel,
        ..SweepConfig::default()
    }
}

#[test]
fn table_has_a_curve_per_policy() {
    let model = convnet(0);
    let test = test_loader();

    let table = sweep(&model, &default_policies(), &test, &config(5, false)).unwrap();

    let policies: Vec<_> = table.policies().collect();
    assert_eq!(
        policies,
        ["l1_unstructured", "l1_structured", "global_unstructured"]
    );

    for policy in policies {
        let curve = table.curve(policy).unwrap();
        let intensities: Vec<_> = curve.iter().map(|t| t.intensity).collect();
        assert_eq!(intensities, [0., 0.25, 0.5, 0.75, 1.]);
        assert!(curve.iter().all(|t| (0. ..=100.).contains(&t.accuracy)));
    }
}

#[test]
fn unpruned_trial_matches_plain_evaluation() {
    let model = convnet(1);
    let test = test_loader();
    let baseline = evaluate(&model, &test).unwrap();

    let table = sweep(&model, &default_policies(), &test, &config(3, false)).unwrap();

    for policy in table.policies() {
        assert_eq!(table.accuracy(policy, 0.), Some(baseline));
    }
}

#[test]
fn fully_pruned_convnet_predicts_one_class() {
    let model = convnet(2);
    let test = test_loader();

    let table = sweep(&model, &default_policies(), &test, &config(2, false)).unwrap();
    let chance = 100. / CLASSES as f64;

    assert_eq!(table.accuracy("l1_unstructured", 1.), Some(chance));
    assert_eq!(table.accuracy("global_unstructured", 1.), Some(chance));
}

#[test]
fn sweep_leaves_the_snapshot_untouched() {
    let model = convnet(3);
    let before = all_weights(&model);

    sweep(&model, &default_policies(), &test_loader(), &config(4, true)).unwrap();

    assert_eq!(all_weights(&model), before);
}

#[test]
fn parallel_and_sequential_agree() {
    let model = convnet(4);
    let test = test_loader();
    let policies = default_policies();

    let sequential = sweep(&model, &policies, &test, &config(6, false)).unwrap();
    let parallel = sweep(&model, &policies, &test, &config(6, true)).unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn debug_logging_leaves_results_unchanged() {
    let model = convnet(6);
    let test = test_loader();
    let policies = default_policies();

    let quiet = sweep(&model, &policies, &test, &config(3, false)).unwrap();

    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
    log::set_max_level(log::LevelFilter::Debug);
    assert!(log::log_enabled!(log::Level::Debug));

    let verbose = sweep(&model, &policies, &test, &config(3, false)).unwrap();

    assert_eq!(quiet, verbose);
}

#[test]
fn failing_trial_names_policy_and_intensity() {
    let model = convnet(5);

    let err = sweep(&model, &default_policies(), &empty_loader(), &config(3, false)).unwrap_err();

    match err {
        PruneErr::TrialFailed {
            policy,
            intensity,
            source,
        } => {
            assert_eq!(policy, "l1_unstructured");
            assert_eq!(intensity, 0.);
            assert!(matches!(
                *source,
                PruneErr::Ml(machine_learning::MlErr::EmptyDataset)
            ));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn table_serializes_as_policy_map() {
    let model = convnet(6);
    let table = sweep(&model, &default_policies(), &test_loader(), &config(2, false)).unwrap();

    let json = serde_json::to_value(&table).unwrap();
    let curve = json["l1_structured"].as_array().unwrap();

    assert_eq!(curve.len(), 2);
    assert_eq!(curve[1]["intensity"], 1.);
}

use simcarlo::callbacks::{JsonLinesCallback, Tally};
use simcarlo::estimators::{BasicEstimators, Estimators, RunningEstimators};
use simcarlo::{Error, Model, RandomStream, ResultOrder, SimulationConfig, StreamFactory};

use assert_approx_eq::assert_approx_eq;
use rand::Rng;
use std::fs::{read_to_string, File};
use std::io::BufWriter;
use tempfile::NamedTempFile;

fn coin(stream: &mut RandomStream) -> bool {
    stream.gen::<f64>() > 0.5
}

fn coin_model(config: SimulationConfig) -> Model<bool> {
    Model::new(config).with_trial(coin)
}

fn sorted<T: Clone + Ord>(results: &[T]) -> Vec<T> {
    let mut results = results.to_vec();
    results.sort();
    results
}

#[test]
fn sequential_results_follow_index_order() {
    let config = SimulationConfig::default().with_ntrials(3).with_seed(42);
    let mut model = coin_model(config.clone());

    assert_eq!(model.simulate().unwrap(), &[true, true, true]);
    assert_eq!(model.seed_used(), Some(42));
    assert!(model.pool_summary().is_none());

    // the raw draws behind the coins, in index order
    let mut model = Model::new(config).with_trial(|stream| stream.gen::<f64>());
    assert_eq!(
        model.simulate().unwrap(),
        &[0.643_049_281_567_363_6, 0.865_163_639_937_946_6, 0.696_763_674_893_880_8]
    );
}

#[test]
fn parallel_results_are_a_permutation_of_sequential_results() {
    let config = SimulationConfig::default().with_ntrials(3).with_seed(42);
    let sequential = coin_model(config.clone()).simulate().unwrap().to_vec();

    let mut model = coin_model(config.parallel(2));
    let parallel = model.simulate().unwrap().to_vec();

    assert_eq!(sorted(&parallel), sorted(&sequential));

    let summary = model.pool_summary().unwrap();
    assert_eq!(summary.workers, 2);
    assert_eq!(summary.joined, 2);
    assert_eq!(summary.closed, 2);
    assert_eq!(summary.tasks_per_worker.iter().sum::<usize>(), 3);
}

#[test]
fn multiset_of_results_does_not_depend_on_pool_size() {
    let trial = |stream: &mut RandomStream| stream.gen::<u64>() % 1000;
    let config = SimulationConfig::default().with_ntrials(101).with_seed(7);

    let sequential = Model::new(config.clone())
        .with_trial(trial)
        .simulate()
        .map(sorted)
        .unwrap();

    for pool_size in 1..=8 {
        let parallel = Model::new(config.clone().parallel(pool_size))
            .with_trial(trial)
            .simulate()
            .map(sorted)
            .unwrap();
        assert_eq!(parallel, sequential, "pool size {}", pool_size);
    }
}

#[test]
fn index_order_makes_parallel_runs_match_sequential_runs() {
    let trial = |stream: &mut RandomStream| {
        let x = stream.gen::<f64>();
        // uneven run times shuffle the completion order
        std::thread::sleep(std::time::Duration::from_micros((x * 500.0) as u64));
        x
    };
    let config = SimulationConfig::default()
        .with_ntrials(40)
        .with_seed(1234)
        .with_order(ResultOrder::Index);

    let sequential = Model::new(config.clone())
        .with_trial(trial)
        .simulate()
        .unwrap()
        .to_vec();
    let mut model = Model::new(config.parallel(4))
        .with_trial(trial)
        .on_result(|_, _| {});
    let parallel = model.simulate().unwrap();

    assert_eq!(parallel, sequential.as_slice());
}

#[test]
fn zero_trials() {
    for config in &[
        SimulationConfig::default().with_ntrials(0),
        SimulationConfig::default().with_ntrials(0).parallel(3),
    ] {
        let mut model = coin_model(config.clone()).with_callback_state(Tally::default());
        assert!(model.simulate().unwrap().is_empty());
        assert_eq!(model.state().trials(), 0);
    }

    let mut model = coin_model(SimulationConfig::default().with_ntrials(0).parallel(3));
    model.simulate().unwrap();
    let summary = model.pool_summary().unwrap();
    assert_eq!(summary.tasks_per_worker, vec![0, 0, 0]);
    assert_eq!(summary.joined, 3);
}

#[test]
fn surplus_workers_never_receive_tasks() {
    let config = SimulationConfig::default()
        .with_ntrials(3)
        .with_seed(5)
        .parallel(8);
    let mut model = coin_model(config);

    assert_eq!(model.simulate().unwrap().len(), 3);

    let summary = model.pool_summary().unwrap();
    assert_eq!(summary.tasks_per_worker, vec![1, 1, 1, 0, 0, 0, 0, 0]);
    assert_eq!(summary.joined, 8);
    assert_eq!(summary.closed, 8);
}

#[test]
fn configuration_errors_fail_before_running() {
    let mut model = coin_model(SimulationConfig::default());
    assert!(matches!(model.simulate(), Err(Error::MissingTrials)));

    let mut model: Model<bool> = Model::new(SimulationConfig::default().with_ntrials(2));
    assert!(matches!(model.simulate(), Err(Error::MissingTrial)));

    let mut model = coin_model(SimulationConfig::default().with_ntrials(2).parallel(0));
    assert!(matches!(model.simulate(), Err(Error::InvalidPoolSize(0))));
    assert!(model.pool_summary().is_none());
}

#[test]
fn failing_trial_is_fatal_in_every_mode() {
    let trial = |stream: &mut RandomStream| {
        let x = stream.gen::<u32>();
        if x == StreamFactory::new(9).derive(4).gen::<u32>() {
            panic!("bad card {}", x);
        }
        x
    };

    for config in &[
        SimulationConfig::default().with_ntrials(12).with_seed(9),
        SimulationConfig::default()
            .with_ntrials(12)
            .with_seed(9)
            .parallel(3),
    ] {
        let mut model = Model::new(config.clone()).with_trial(trial);

        match model.simulate() {
            Err(Error::TrialFailed { index, message }) => {
                assert_eq!(index, 4);
                assert!(message.starts_with("bad card"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(model.pool_summary().is_none());
        assert!(!model.results().contains(&StreamFactory::new(9).derive(4).gen::<u32>()));
    }

    // the pool was torn down completely, so the next run starts from scratch
    let mut model = Model::new(
        SimulationConfig::default()
            .with_ntrials(4)
            .with_seed(9)
            .parallel(3),
    )
    .with_trial(trial);
    assert_eq!(model.simulate().unwrap().len(), 4);
    assert_eq!(model.pool_summary().unwrap().joined, 3);
}

#[test]
fn configuration_from_json() {
    let config = SimulationConfig::from_json(
        r#"{ "name": "coins", "ntrials": 20, "seed": 42, "mode": "parallel", "pool_size": 2 }"#,
    )
    .unwrap();

    let mut model = coin_model(config).with_callback_state(Tally::default());
    model.simulate().unwrap();
    assert_eq!(model.state().trials(), 20);

    assert!(matches!(
        SimulationConfig::from_json(r#"{ "ntrials": 20, "debug": true }"#),
        Err(Error::UnknownOptions(_))
    ));
}

#[test]
fn running_estimators_of_a_uniform_distribution() {
    // TOLERANCE to use in floating point comparisons.
    const TOLERANCE: f64 = 1e-2;

    let config = SimulationConfig::default()
        .with_ntrials(100_000)
        .with_seed(0xcafe_f00d)
        .parallel(4);
    let mut model = Model::new(config)
        .with_trial(|stream| stream.gen::<f64>())
        .with_callback_state(RunningEstimators::default());
    model.simulate().unwrap();

    let estimators = model.state();
    assert_eq!(estimators.calls(), 100_000);
    assert_eq!(estimators.non_finite_calls(), 0);
    assert_approx_eq!(estimators.mean(), 0.5, TOLERANCE);
    // variance of the mean is 1/12/N
    assert_approx_eq!(estimators.var() * 100_000.0 * 12.0, 1.0, TOLERANCE);
}

#[test]
fn estimators_agree_between_modes() {
    // TOLERANCE to use in floating point comparisons.
    const TOLERANCE: f64 = 1e-12;

    let config = SimulationConfig::default().with_ntrials(1000).with_seed(17);
    let run = |config: SimulationConfig| {
        let mut model = Model::new(config)
            .with_trial(|stream| stream.gen::<f64>().powi(2))
            .with_callback_state(RunningEstimators::default());
        model.simulate().unwrap();
        model.into_parts().1
    };

    let sequential = run(config.clone());
    let parallel = run(config.parallel(3));

    assert_eq!(sequential.calls(), parallel.calls());
    assert_approx_eq!(sequential.mean(), parallel.mean(), TOLERANCE);
    assert_approx_eq!(sequential.var(), parallel.var(), TOLERANCE);
}

#[test]
fn write_results_to_file() {
    // create a temporary file to write to
    let file = NamedTempFile::new().unwrap();
    let path = file.path();

    let config = SimulationConfig::default()
        .with_ntrials(25)
        .with_seed(3)
        .parallel(2);
    let writer = BufWriter::new(File::create(path).unwrap());
    let mut model = coin_model(config).with_callback_state(JsonLinesCallback::new(writer));

    let results = model.simulate().unwrap().to_vec();
    let (_, callback) = model.into_parts();
    assert_eq!(callback.written(), 25);
    callback.finish().unwrap();

    let written = read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<bool>(line).unwrap())
        .collect::<Vec<_>>();

    // the file follows the delivery order of the result log
    assert_eq!(written, results);
}

//! End-to-end training on synthetic linearly-consistent motion data
//!
//! The targets are generated as `loc + 0.5 · vel`, so the linear-dynamics
//! baseline (initial coefficient 1.0 for a one-step horizon) has a known
//! optimum at 0.5 and a strictly positive initial loss. Training must drive
//! the loss down and leave a complete results history on disk.

use andar::data::InMemoryDataset;
use andar::model::LinearDynamics;
use andar::optim::Adam;
use andar::train::{run_training, ResultsHistory, RunConfig};
use andar::SampleGraph;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_sample(rng: &mut StdRng, num_nodes: usize) -> SampleGraph {
    let loc = Array2::from_shape_fn((num_nodes, 3), |_| rng.gen_range(-1.0..1.0f32));
    let vel = Array2::from_shape_fn((num_nodes, 3), |_| rng.gen_range(-1.0..1.0f32));
    let loc_end = &loc + &(&vel * 0.5);
    let edges =
        Array2::from_shape_fn((2, num_nodes - 1), |(r, c)| if r == 0 { c } else { c + 1 });
    let edge_attr = Array2::ones((num_nodes - 1, 2));
    SampleGraph {
        charge: Array2::ones((num_nodes, 1)),
        edges: edges.clone(),
        edge_attr: edge_attr.clone(),
        local_edges: edges,
        local_edge_attr: edge_attr,
        loc_end,
        vel_end: vel.clone(),
        loc,
        vel,
    }
}

fn split(seed: u64, count: usize, batch_size: usize, train: bool, name: &str) -> InMemoryDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<SampleGraph> = (0..count).map(|_| synthetic_sample(&mut rng, 5)).collect();
    if train {
        InMemoryDataset::train(samples, batch_size, seed)
    } else {
        InMemoryDataset::eval(name, samples, batch_size)
    }
}

#[test]
fn test_training_converges_and_persists_history() {
    let dir = tempfile::tempdir().unwrap();
    let results_path = dir.path().join("loss_synthetic.json");

    let mut model = LinearDynamics::new(1);
    let mut optimizer = Adam::default_params(0.05);
    let mut train = split(0, 24, 8, true, "train");
    let mut val = split(1, 8, 8, false, "val");
    let mut test = split(2, 8, 8, false, "test");

    let config = RunConfig {
        epochs: 40,
        test_interval: 5,
        num_timesteps: 1,
        results_path: results_path.clone(),
    };
    let (best, results) = run_training(
        &mut model,
        &mut optimizer,
        &mut train,
        &mut val,
        &mut test,
        &config,
    )
    .unwrap();

    // The coefficient starts at 1.0 with optimum 0.5; forty Adam epochs at
    // lr 0.05 must improve substantially on the first epoch's loss.
    assert_eq!(results.train_loss.len(), 40);
    let first = results.train_loss[0];
    let last = *results.train_loss.last().unwrap();
    assert!(first > 0.0);
    assert!(last < first * 0.5, "loss did not decrease: {first} -> {last}");

    // Evaluations at epochs 0, 5, ..., 35.
    assert_eq!(results.eval_epoch, vec![0, 5, 10, 15, 20, 25, 30, 35]);
    assert_eq!(results.val_loss.len(), 8);
    assert_eq!(results.test_loss.len(), 8);

    assert!(best.val_loss.is_finite());
    assert!(best.val_loss < 1e8);
    assert!(best.test_loss < 1e8);

    // The history on disk matches what was returned, under the expected keys.
    let content = std::fs::read_to_string(&results_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["eval epoch"].as_array().unwrap().len(), 8);
    assert_eq!(value["train loss"].as_array().unwrap().len(), 40);
    let parsed: ResultsHistory = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.train_loss, results.train_loss);
}

#[test]
fn test_evaluation_only_epochs_share_parameters() {
    // Running the same validation split twice around a no-op must produce
    // identical losses: evaluation never mutates the model.
    let mut model = LinearDynamics::new(1);
    let mut val = split(3, 8, 4, false, "val");
    let a = andar::train::run_epoch(&mut model, None, &mut val, 0, 1).unwrap();
    let b = andar::train::run_epoch(&mut model, None, &mut val, 1, 1).unwrap();
    assert_eq!(a.loss, b.loss);
}

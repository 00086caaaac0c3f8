//! Andar CLI
//!
//! Single-command training entry point: loads the configured motion-capture
//! splits, trains the configured model, and prints the loss history,
//! best-epoch summary, and forward-pass diagnostics.
//!
//! ```bash
//! andar --data-dir data/motion --case walk --epochs 600 --num-timesteps 10
//! andar --config-by-file configs/config_motion.json
//! ```

use andar::config::{apply_config_file, build_model, build_optimizer, Args};
use andar::data::motion::load_split;
use andar::instrument::{report_sparsity, ForwardTimers};
use andar::train::{run_training, RunConfig};
use andar::Result;
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;

// Evaluation splits are capped the same way regardless of
// max_training_samples.
const MAX_EVAL_SAMPLES: usize = 600;

fn main() -> ExitCode {
    let mut args = Args::parse();
    if let Some(path) = args.config_by_file.clone() {
        args = match apply_config_file(args, &path) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        };
    }
    println!("{args:?}");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    // Missing output directories are recreated; failures surface later when
    // the results file is written.
    let exp_dir = args.outf.join(&args.exp_name);
    let _ = std::fs::create_dir_all(&exp_dir);

    let mut train = load_split(
        &args.data_dir,
        &args.case,
        "train",
        args.num_timesteps,
        args.max_training_samples,
        args.batch_size,
        args.seed,
    )?;
    let mut val = load_split(
        &args.data_dir,
        &args.case,
        "val",
        args.num_timesteps,
        MAX_EVAL_SAMPLES,
        args.batch_size,
        args.seed,
    )?;
    let mut test = load_split(
        &args.data_dir,
        &args.case,
        "test",
        args.num_timesteps,
        MAX_EVAL_SAMPLES,
        args.batch_size,
        args.seed,
    )?;

    let timers = ForwardTimers::handle();
    let mut model = build_model(args, Some(timers.clone()))?;
    let mut optimizer = build_optimizer(args);

    let config = RunConfig {
        epochs: args.epochs,
        test_interval: args.test_interval,
        num_timesteps: args.num_timesteps,
        results_path: exp_dir.join("loss.json"),
    };
    let (best, _results) = run_training(
        model.as_mut(),
        optimizer.as_mut(),
        &mut train,
        &mut val,
        &mut test,
        &config,
    )?;

    println!(
        "best_train = {:.6}, best_lp = {:.6}, best_val = {:.6}, best_test = {:.6}, best_epoch = {}",
        best.train_loss, best.lp_loss, best.val_loss, best.test_loss, best.epoch
    );

    if !timers.borrow().is_empty() {
        timers.borrow().report();
    }
    report_sparsity(&model.named_params(), 1e-8, 0.4);

    println!("Total training time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

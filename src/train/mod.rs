//! Training loop
//!
//! Three layers, innermost first:
//! - `step`: one batch (assembly, forward, loss, optional update)
//! - `epoch`: one split pass with size-weighted loss accumulation
//! - `harness`: the multi-epoch train/val/test state machine with results
//!   persistence and best-metrics tracking

mod epoch;
mod harness;
mod step;

pub use epoch::{run_epoch, EpochStats};
pub use harness::{run_training, BestMetrics, ResultsHistory, RunConfig};
pub use step::{run_step, StepOutcome};

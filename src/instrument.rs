//! Per-layer performance and sparsity diagnostics
//!
//! Timing records live in an explicit side-table keyed by a stable layer
//! identifier, owned by the harness and handed to the model as a shared
//! handle. The model records one entry per instrumented layer per forward
//! pass; the harness prints the averages after training.

use crate::model::Param;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Shared handle to a [`ForwardTimers`] side-table. Training is
/// single-threaded, so a `Rc<RefCell<...>>` suffices.
pub type TimerHandle = Rc<RefCell<ForwardTimers>>;

#[derive(Debug, Clone, Copy, Default)]
struct TimingRecord {
    total: Duration,
    calls: u64,
}

/// Running forward-pass timings, one record per layer identifier.
#[derive(Debug, Default)]
pub struct ForwardTimers {
    records: BTreeMap<String, TimingRecord>,
}

impl ForwardTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shareable handle.
    pub fn handle() -> TimerHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Add one forward-pass duration for `layer`.
    pub fn record(&mut self, layer: &str, elapsed: Duration) {
        let record = self.records.entry(layer.to_string()).or_default();
        record.total += elapsed;
        record.calls += 1;
    }

    /// Average forward time for `layer`, if it was ever recorded.
    pub fn average(&self, layer: &str) -> Option<Duration> {
        let record = self.records.get(layer)?;
        (record.calls > 0).then(|| record.total / record.calls as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Print the average forward time per layer.
    pub fn report(&self) {
        println!("\n=== Forward Pass Timing Summary ===");
        for (layer, record) in &self.records {
            if record.calls == 0 {
                continue;
            }
            let avg_ms = record.total.as_secs_f64() * 1000.0 / record.calls as f64;
            println!("{}: {:.4} ms (avg over {} calls)", layer, avg_ms, record.calls);
        }
    }
}

/// Fraction of entries of `param` below `threshold` in absolute value.
pub fn sparsity(param: &Param, threshold: f32) -> f32 {
    if param.is_empty() {
        return 0.0;
    }
    let zeros = param.data().iter().filter(|v| v.abs() < threshold).count();
    zeros as f32 / param.len() as f32
}

/// Print per-layer parameter sparsity for every layer above
/// `report_threshold` (a fraction in `[0, 1]`).
pub fn report_sparsity(named: &[(String, &Param)], threshold: f32, report_threshold: f32) {
    println!("Per-layer Model Sparsity:");
    println!("{}", "=".repeat(55));
    for (name, param) in named {
        let s = sparsity(param, threshold);
        if s > report_threshold {
            println!(
                "{:<40} num elements: {:>11} sparsity: {:>10.2}%",
                name,
                param.len(),
                s * 100.0
            );
        }
    }
    println!("{}", "=".repeat(55));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_average() {
        let mut timers = ForwardTimers::new();
        timers.record("layer", Duration::from_millis(2));
        timers.record("layer", Duration::from_millis(4));
        assert_eq!(timers.average("layer"), Some(Duration::from_millis(3)));
    }

    #[test]
    fn test_unknown_layer_has_no_average() {
        let timers = ForwardTimers::new();
        assert!(timers.average("missing").is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_sparsity_counts_near_zeros() {
        let param = Param::from_vec(vec![0.0, 1e-9, 0.5, -2.0]);
        assert_eq!(sparsity(&param, 1e-8), 0.5);
    }

    #[test]
    fn test_sparsity_empty_param() {
        let param = Param::from_vec(vec![]);
        assert_eq!(sparsity(&param, 1e-8), 0.0);
    }

    #[test]
    fn test_shared_handle_accumulates() {
        let handle = ForwardTimers::handle();
        handle.borrow_mut().record("a", Duration::from_millis(1));
        handle.borrow_mut().record("a", Duration::from_millis(1));
        assert_eq!(handle.borrow().average("a"), Some(Duration::from_millis(1)));
    }
}

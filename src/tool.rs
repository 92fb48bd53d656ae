//! Exclusive kitchen tools shared by the pipeline's cooks.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::types::PrepUnits;

/// A physical tool that performs one preparation operation at a time.
///
/// The lock guard keeps the tool busy for the whole operation and is
/// released on every exit path, so no two cooks can ever use the same tool
/// concurrently. Tools are created once at bar startup and shared via
/// `Arc` for the process lifetime.
pub struct KitchenTool {
    name: &'static str,
    busy: Mutex<()>,
    duration: Duration,
    output: PrepUnits,
}

impl KitchenTool {
    /// Create a tool whose operation takes `duration` and yields `output`.
    pub fn new(name: &'static str, duration: Duration, output: PrepUnits) -> Self {
        Self {
            name,
            busy: Mutex::new(()),
            duration,
            output,
        }
    }

    /// Tool name for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Perform one operation: hold the tool exclusively for its fixed
    /// duration, then return the prepared value.
    pub fn run(&self) -> PrepUnits {
        let _guard = self.busy.lock().expect("kitchen tool mutex poisoned");
        if !self.duration.is_zero() {
            thread::sleep(self.duration);
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::time::Instant;

    #[test]
    fn run_returns_configured_output() {
        let tool = KitchenTool::new("toaster", Duration::ZERO, 7);
        assert_eq!(tool.run(), 7);
        assert_eq!(tool.name(), "toaster");
    }

    #[test]
    fn concurrent_runs_are_serialized() {
        let tool = Arc::new(KitchenTool::new("grill", Duration::from_millis(30), 0));
        let contenders = 4;
        let barrier = Arc::new(Barrier::new(contenders));

        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..contenders {
            let tool = Arc::clone(&tool);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                tool.run();
            }));
        }
        for handle in handles {
            handle.join().expect("tool thread panicked");
        }

        // Four exclusive 30ms operations cannot overlap, so the batch
        // takes at least the sum of the durations.
        assert!(
            start.elapsed() >= Duration::from_millis(30 * contenders as u64),
            "operations overlapped: finished in {:?}",
            start.elapsed()
        );
    }
}

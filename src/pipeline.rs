//! The serving pipeline: three cook threads, two chains, one burger.
//!
//! Every order fans out onto two independent chains. The assembly chain
//! toasts buns and then chops salad on top of them; the protein chain
//! grills a patty. Each chain delivers its partial result through a
//! single-slot channel and the waiting customer combines the two.

use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};

use log::debug;
use thiserror::Error;

use crate::queue::BoundedQueue;
use crate::tool::KitchenTool;
use crate::types::PrepUnits;

/// Errors reported when ordering from the pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The entry queues are closed and the cooks have gone home.
    #[error("serving pipeline is shut down")]
    Closed,
}

/// One burger order in flight.
///
/// The order is cloned onto both entry queues. Each chain owns its clone,
/// so no two cooks ever write the same slot; the delivery senders are
/// shared across clones and each carries exactly one value per order.
#[derive(Clone)]
struct Order {
    buns: Option<PrepUnits>,
    salad: Option<PrepUnits>,
    veggie_slot: SyncSender<PrepUnits>,
    patty_slot: SyncSender<PrepUnits>,
}

/// Owns the cook threads and the queues between them.
pub struct Pipeline {
    veggie_orders: Arc<BoundedQueue<Order>>,
    patty_orders: Arc<BoundedQueue<Order>>,
    cooks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    /// Spawn the three cooks and wire up their queues.
    ///
    /// `entry_buffer` bounds both chain entry queues; `staging_buffer`
    /// bounds the toast-to-salad handoff. Backpressure from a full queue
    /// propagates upstream all the way to `fulfill`.
    pub fn new(
        toaster: Arc<KitchenTool>,
        chopper: Arc<KitchenTool>,
        grill: Arc<KitchenTool>,
        entry_buffer: usize,
        staging_buffer: usize,
    ) -> Self {
        let veggie_orders = Arc::new(BoundedQueue::new(entry_buffer));
        let patty_orders = Arc::new(BoundedQueue::new(entry_buffer));
        let staged = Arc::new(BoundedQueue::new(staging_buffer));

        let mut cooks = Vec::with_capacity(3);

        let orders = Arc::clone(&veggie_orders);
        let output = Arc::clone(&staged);
        cooks.push(
            thread::Builder::new()
                .name("toast-cook".to_string())
                .spawn(move || toast_cook(&orders, &output, &toaster))
                .expect("failed to spawn toast cook"),
        );

        let input = Arc::clone(&staged);
        cooks.push(
            thread::Builder::new()
                .name("salad-cook".to_string())
                .spawn(move || salad_cook(&input, &chopper))
                .expect("failed to spawn salad cook"),
        );

        let orders = Arc::clone(&patty_orders);
        cooks.push(
            thread::Builder::new()
                .name("grill-cook".to_string())
                .spawn(move || grill_cook(&orders, &grill))
                .expect("failed to spawn grill cook"),
        );

        Self {
            veggie_orders,
            patty_orders,
            cooks: std::sync::Mutex::new(cooks),
        }
    }

    /// Produce one burger: fan the order out onto both chains, wait for
    /// both partial results, combine them.
    ///
    /// Blocks while either entry queue is full. Any number of calls may be
    /// in flight concurrently; the only serialization is inside the tools
    /// and the bounded queues. Fails only once the pipeline is shut down.
    pub fn fulfill(&self) -> Result<PrepUnits, PipelineError> {
        let (veggie_tx, veggie_rx) = mpsc::sync_channel(1);
        let (patty_tx, patty_rx) = mpsc::sync_channel(1);
        let order = Order {
            buns: None,
            salad: None,
            veggie_slot: veggie_tx,
            patty_slot: patty_tx,
        };

        self.veggie_orders
            .push_blocking(order.clone())
            .map_err(|_| PipelineError::Closed)?;
        self.patty_orders
            .push_blocking(order)
            .map_err(|_| PipelineError::Closed)?;

        // The chains finish independently; the receive order is arbitrary.
        let stack = veggie_rx.recv().map_err(|_| PipelineError::Closed)?;
        let patty = patty_rx.recv().map_err(|_| PipelineError::Closed)?;
        Ok(stack + patty)
    }

    /// Close both entry queues and join the cooks.
    ///
    /// Closure cascades downstream: the toast cook closes the staging
    /// queue when its loop ends, which ends the salad cook in turn. Orders
    /// accepted before the close are still fully processed.
    pub fn shutdown(&self) {
        self.veggie_orders.close();
        self.patty_orders.close();
        let mut cooks = self.cooks.lock().expect("cook handle mutex poisoned");
        for cook in cooks.drain(..) {
            cook.join().expect("cook thread panicked");
        }
    }
}

fn toast_cook(
    orders: &BoundedQueue<Order>,
    staged: &BoundedQueue<Order>,
    toaster: &KitchenTool,
) {
    while let Some(mut order) = orders.pop_blocking_or_closed() {
        order.buns = Some(toaster.run());
        debug!("[{}] buns toasted, staging order", toaster.name());
        // The staging queue is closed only by this cook, below.
        if staged.push_blocking(order).is_err() {
            break;
        }
    }
    staged.close();
}

fn salad_cook(staged: &BoundedQueue<Order>, chopper: &KitchenTool) {
    while let Some(mut order) = staged.pop_blocking_or_closed() {
        let salad = chopper.run();
        order.salad = Some(salad);
        // The toast cook fills the bun slot before forwarding.
        let buns = order.buns.expect("staged order missing buns");
        debug!("[{}] salad chopped, veggie stack ready", chopper.name());
        // The customer may have dropped its receiver during shutdown.
        let _ = order.veggie_slot.send(buns + salad);
    }
}

fn grill_cook(orders: &BoundedQueue<Order>, grill: &KitchenTool) {
    while let Some(order) = orders.pop_blocking_or_closed() {
        let patty = grill.run();
        debug!("[{}] patty grilled", grill.name());
        let _ = order.patty_slot.send(patty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn instant_tool(name: &'static str, output: PrepUnits) -> Arc<KitchenTool> {
        Arc::new(KitchenTool::new(name, Duration::ZERO, output))
    }

    fn test_pipeline(toast: PrepUnits, chop: PrepUnits, grill: PrepUnits) -> Pipeline {
        Pipeline::new(
            instant_tool("toaster", toast),
            instant_tool("chopper", chop),
            instant_tool("grill", grill),
            4,
            5,
        )
    }

    #[test]
    fn burger_combines_all_three_stage_outputs() {
        let pipeline = test_pipeline(1, 2, 3);
        // Assembly chain yields 1+2, protein chain yields 3.
        assert_eq!(pipeline.fulfill(), Ok(6));
        pipeline.shutdown();
    }

    #[test]
    fn zero_outputs_yield_zero_burger() {
        let pipeline = test_pipeline(0, 0, 0);
        assert_eq!(pipeline.fulfill(), Ok(0));
        pipeline.shutdown();
    }

    #[test]
    fn concurrent_orders_all_complete() {
        let pipeline = Arc::new(test_pipeline(1, 2, 3));
        let (done_tx, done_rx) = mpsc::channel();

        let in_flight = 4;
        let mut handles = Vec::new();
        for _ in 0..in_flight {
            let pipeline = Arc::clone(&pipeline);
            let done_tx = done_tx.clone();
            handles.push(thread::spawn(move || {
                let burger = pipeline.fulfill().expect("pipeline closed");
                done_tx.send(burger).expect("done");
            }));
        }

        // Every order must come back; a hang here means a lost partial.
        for _ in 0..in_flight {
            let burger = done_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("an order never completed");
            assert_eq!(burger, 6);
        }
        for handle in handles {
            handle.join().expect("order thread panicked");
        }
        pipeline.shutdown();
    }

    #[test]
    fn result_is_identical_whichever_chain_finishes_first() {
        // Slow assembly chain: the patty is delivered first.
        let slow_toast = Pipeline::new(
            Arc::new(KitchenTool::new("toaster", Duration::from_millis(50), 1)),
            instant_tool("chopper", 2),
            instant_tool("grill", 3),
            4,
            5,
        );
        assert_eq!(slow_toast.fulfill(), Ok(6));
        slow_toast.shutdown();

        // Slow protein chain: the veggie stack is delivered first.
        let slow_grill = Pipeline::new(
            instant_tool("toaster", 1),
            instant_tool("chopper", 2),
            Arc::new(KitchenTool::new("grill", Duration::from_millis(50), 3)),
            4,
            5,
        );
        assert_eq!(slow_grill.fulfill(), Ok(6));
        slow_grill.shutdown();
    }

    #[test]
    fn orders_accepted_before_shutdown_still_complete() {
        let pipeline = Arc::new(test_pipeline(1, 2, 3));
        let (done_tx, done_rx) = mpsc::channel();

        let pipeline_clone = Arc::clone(&pipeline);
        let handle = thread::spawn(move || {
            let result = pipeline_clone.fulfill();
            done_tx.send(result).expect("done");
        });

        // Let the order land on the entry queues before closing them.
        thread::sleep(Duration::from_millis(50));
        pipeline.shutdown();

        let result = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("order dropped during shutdown");
        assert_eq!(result, Ok(6));
        handle.join().expect("order thread panicked");
    }

    #[test]
    fn fulfill_after_shutdown_reports_closed() {
        let pipeline = test_pipeline(0, 0, 0);
        pipeline.shutdown();
        assert_eq!(pipeline.fulfill(), Err(PipelineError::Closed));
    }
}

//! The bar itself: seat-pool admission and per-customer service.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::info;

use crate::pipeline::{Pipeline, PipelineError};
use crate::queue::BoundedQueue;
use crate::tool::KitchenTool;
use crate::types::{Customer, PrepUnits, SeatId};

/// Tunable knobs for one bar instance.
///
/// The defaults carry the reference timings; the grill is deliberately an
/// order of magnitude slower than the other tools, making the protein
/// chain the throughput bottleneck.
#[derive(Clone, Copy, Debug)]
pub struct BarConfig {
    /// Seat count; also the depth of each chain's entry queue.
    pub capacity: usize,
    /// Depth of the toast-to-salad staging queue.
    pub staging_buffer: usize,
    pub toast_time: Duration,
    pub chop_time: Duration,
    pub grill_time: Duration,
    /// How long a customer keeps the seat after the burger arrives.
    pub eat_time: Duration,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            staging_buffer: 5,
            toast_time: Duration::from_micros(500),
            chop_time: Duration::from_micros(200),
            grill_time: Duration::from_secs(1),
            eat_time: Duration::from_millis(500),
        }
    }
}

/// A bounded-capacity bar wrapping the serving pipeline.
///
/// Occupancy is enforced purely by seat-token scarcity: the pool starts
/// with `capacity` tokens and a customer must hold one for the whole
/// residency.
pub struct Bar {
    capacity: usize,
    seats: BoundedQueue<SeatId>,
    pipeline: Pipeline,
    eat_time: Duration,
}

impl Bar {
    /// Open a bar: fill the seat pool and start the pipeline cooks.
    pub fn new(config: &BarConfig) -> Self {
        debug_assert!(config.capacity > 0, "bar capacity must be > 0");
        let toaster = Arc::new(KitchenTool::new("toaster", config.toast_time, 0));
        let chopper = Arc::new(KitchenTool::new("chopper", config.chop_time, 0));
        let grill = Arc::new(KitchenTool::new("grill", config.grill_time, 0));
        let pipeline = Pipeline::new(
            toaster,
            chopper,
            grill,
            config.capacity,
            config.staging_buffer,
        );

        let seats = BoundedQueue::new(config.capacity);
        for seat in 0..config.capacity {
            seats
                .push_blocking(seat)
                .expect("seat pool closed at startup");
        }

        Self {
            capacity: config.capacity,
            seats,
            pipeline,
            eat_time: config.eat_time,
        }
    }

    /// Configured seat count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Seats currently free.
    pub fn available_seats(&self) -> usize {
        self.seats.len()
    }

    /// Block until a seat token frees up; `None` once the bar is closed.
    pub fn admit(&self) -> Option<SeatId> {
        self.seats.pop_blocking_or_closed()
    }

    /// Return a seat token to the pool, re-enabling one admission.
    pub fn release(&self, seat: SeatId) {
        // After close the pool is going away; dropping the token is fine.
        let _ = self.seats.push_blocking(seat);
    }

    /// One occupant residency: order, wait, eat, vacate.
    ///
    /// Runs on the caller's thread; the admission loop spawns one thread
    /// per customer so a slow eater never blocks the next admission once
    /// another seat frees.
    pub fn serve(&self, customer: Customer, seat: SeatId) -> Result<PrepUnits, PipelineError> {
        info!("[customer {}] occupied seat {seat}", customer.number);
        info!("[customer {}] sent order", customer.number);
        let burger = match self.pipeline.fulfill() {
            Ok(burger) => burger,
            Err(err) => {
                // Vacate even when the kitchen closed mid-order.
                self.release(seat);
                return Err(err);
            }
        };
        info!("[customer {}] order received - eating", customer.number);
        if !self.eat_time.is_zero() {
            thread::sleep(self.eat_time);
        }
        info!("[customer {}] leaving seat {seat}", customer.number);
        self.release(seat);
        Ok(burger)
    }

    /// Close the seat pool and shut the pipeline down.
    ///
    /// Blocks until all cooks have drained their queues and exited.
    pub fn close(&self) {
        self.seats.close();
        self.pipeline.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn fast_config(capacity: usize) -> BarConfig {
        BarConfig {
            capacity,
            staging_buffer: 5,
            toast_time: Duration::ZERO,
            chop_time: Duration::ZERO,
            grill_time: Duration::ZERO,
            eat_time: Duration::ZERO,
        }
    }

    #[test]
    fn admission_blocks_at_capacity_until_a_seat_frees() {
        let bar = Arc::new(Bar::new(&fast_config(4)));

        let mut held = Vec::new();
        for _ in 0..4 {
            held.push(bar.admit().expect("bar closed"));
        }
        assert_eq!(bar.available_seats(), 0);

        let (seat_tx, seat_rx) = mpsc::channel();
        let bar_clone = Arc::clone(&bar);
        let handle = thread::spawn(move || {
            let seat = bar_clone.admit().expect("bar closed");
            seat_tx.send(seat).expect("send seat");
        });

        // With every token held, the fifth admission must block.
        assert!(
            seat_rx.recv_timeout(Duration::from_millis(100)).is_err(),
            "fifth customer admitted beyond capacity"
        );

        let released = held.pop().expect("held seat");
        bar.release(released);
        let seat = seat_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("admission still blocked after release");
        assert_eq!(seat, released);

        handle.join().expect("admission thread panicked");
        bar.release(seat);
        for seat in held {
            bar.release(seat);
        }
        bar.close();
    }

    #[test]
    fn four_customers_served_concurrently_without_deadlock() {
        let bar = Arc::new(Bar::new(&fast_config(4)));
        let (done_tx, done_rx) = mpsc::channel();

        let mut handles = Vec::new();
        for number in 0..4 {
            let seat = bar.admit().expect("bar closed");
            let bar = Arc::clone(&bar);
            let done_tx = done_tx.clone();
            handles.push(thread::spawn(move || {
                let burger = bar
                    .serve(Customer::new(number), seat)
                    .expect("pipeline closed");
                done_tx.send(burger).expect("done");
            }));
        }

        for _ in 0..4 {
            let burger = done_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("a customer was never served");
            assert_eq!(burger, 0);
        }
        for handle in handles {
            handle.join().expect("session thread panicked");
        }

        assert_eq!(bar.available_seats(), 4);
        bar.close();
    }

    #[test]
    fn seat_pool_is_full_after_sequential_service() {
        let bar = Bar::new(&fast_config(3));
        for number in 0..3 {
            let seat = bar.admit().expect("bar closed");
            bar.serve(Customer::new(number), seat)
                .expect("pipeline closed");
        }
        // Every residency must return its token.
        assert_eq!(bar.available_seats(), bar.capacity());
        bar.close();
    }

    #[test]
    fn admit_returns_none_after_close() {
        let bar = Bar::new(&fast_config(2));
        bar.close();
        // Leftover tokens drain first, then the pool reports closed.
        assert!(bar.admit().is_some());
        assert!(bar.admit().is_some());
        assert!(bar.admit().is_none());
    }
}

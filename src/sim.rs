//! Demo, benchmark, and stress-test runners for the burger bar.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::bar::{Bar, BarConfig};
use crate::types::Customer;

// Demo timing knobs (small for quick CLI feedback).
const DEMO_CUSTOMERS: u64 = 10;
const DEMO_GRILL_MS: u64 = 20;
const DEMO_EAT_MS: u64 = 10;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage};
    let mut usage: rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { getrusage(RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Occupancy sampled from the admission loop: seats taken right after an
/// admit. Token scarcity makes a true violation impossible; the sample is
/// a cross-check, not the enforcement mechanism.
struct SeatSample {
    max_occupancy: usize,
    violation: bool,
}

impl SeatSample {
    fn new() -> Self {
        Self {
            max_occupancy: 0,
            violation: false,
        }
    }

    fn observe(&mut self, bar: &Bar) {
        let occupied = bar.capacity().saturating_sub(bar.available_seats());
        self.max_occupancy = self.max_occupancy.max(occupied);
        if occupied > bar.capacity() {
            self.violation = true;
        }
    }
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    customers: u64,
    capacity: usize,
    burgers: usize,
    elapsed_ms: f64,
    throughput: f64,
    avg_seat_wait_us: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
    max_occupancy: usize,
    seat_violation: bool,
    seats_missing: usize,
}

fn benchmark_once(customers: u64, capacity: usize, grill_us: u64, eat_ms: u64) -> BenchResult {
    debug_assert!(customers > 0, "customers must be > 0");
    debug_assert!(capacity > 0, "capacity must be > 0");
    // Tool timings keep the reference ratios: grill is the bottleneck.
    let config = BarConfig {
        capacity,
        staging_buffer: 5,
        toast_time: Duration::from_micros(grill_us / 2),
        chop_time: Duration::from_micros(grill_us / 5),
        grill_time: Duration::from_micros(grill_us),
        eat_time: Duration::from_millis(eat_ms),
    };
    let bar = Arc::new(Bar::new(&config));
    let burgers = Arc::new(AtomicUsize::new(0));
    // Total admission wait across all customers for averaging.
    let seat_wait_us = Arc::new(AtomicU64::new(0));
    let mut sample = SeatSample::new();

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();
    let mut handles = Vec::new();
    for number in 0..customers {
        let wait_start = Instant::now();
        let seat = bar.admit().expect("seat pool closed during benchmark");
        seat_wait_us.fetch_add(wait_start.elapsed().as_micros() as u64, Ordering::SeqCst);
        sample.observe(&bar);

        let bar = Arc::clone(&bar);
        let burgers = Arc::clone(&burgers);
        handles.push(thread::spawn(move || {
            if bar.serve(Customer::new(number), seat).is_ok() {
                burgers.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("customer session panicked");
    }

    let elapsed_ms = start.elapsed().as_millis() as f64;
    let seats_free = bar.available_seats();
    bar.close();

    let burgers = burgers.load(Ordering::SeqCst);
    let throughput = if elapsed_ms > 0.0 {
        (burgers as f64) / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let avg_seat_wait_us = seat_wait_us.load(Ordering::SeqCst) as f64 / customers as f64;

    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    BenchResult {
        customers,
        capacity,
        burgers,
        elapsed_ms,
        throughput,
        avg_seat_wait_us,
        cpu_user_s,
        cpu_sys_s,
        max_occupancy: sample.max_occupancy,
        seat_violation: sample.violation,
        seats_missing: capacity.saturating_sub(seats_free),
    }
}

const BENCH_CSV_HEADER: &str = "customers,capacity,burgers,elapsed_ms,throughput_burgers_per_s,avg_seat_wait_us,cpu_user_s,cpu_sys_s,max_occupancy,seat_violation,seats_missing";

fn print_result(result: &BenchResult, validate: bool) {
    let cpu_user = result
        .cpu_user_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let cpu_sys = result
        .cpu_sys_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    println!(
        "{},{},{},{:.2},{:.2},{:.2},{},{},{},{},{}",
        result.customers,
        result.capacity,
        result.burgers,
        result.elapsed_ms,
        result.throughput,
        result.avg_seat_wait_us,
        cpu_user,
        cpu_sys,
        result.max_occupancy,
        result.seat_violation,
        result.seats_missing
    );
    if validate {
        if result.seat_violation {
            eprintln!("# violation,seat_capacity");
        }
        if result.burgers != result.customers as usize {
            eprintln!("# violation,missing_burgers");
        }
        if result.seats_missing > 0 {
            eprintln!("# violation,leaked_seats,{}", result.seats_missing);
        }
    }
}

/// Run the default demo: a small stream of customers through a four-seat
/// bar with fast kitchen timings.
pub fn run_demo() {
    let config = BarConfig {
        capacity: 4,
        staging_buffer: 5,
        toast_time: Duration::from_micros(500),
        chop_time: Duration::from_micros(200),
        grill_time: Duration::from_millis(DEMO_GRILL_MS),
        eat_time: Duration::from_millis(DEMO_EAT_MS),
    };
    let bar = Arc::new(Bar::new(&config));
    let burgers = Arc::new(AtomicUsize::new(0));
    let mut sample = SeatSample::new();

    let start = Instant::now();
    let mut handles = Vec::new();
    for number in 0..DEMO_CUSTOMERS {
        info!("customer {number} waiting to enter the bar");
        let seat = bar.admit().expect("seat pool closed during demo");
        info!("customer {number} enters the bar");
        sample.observe(&bar);

        let bar = Arc::clone(&bar);
        let burgers = Arc::clone(&burgers);
        let handle = thread::Builder::new()
            .name(format!("customer-{number}"))
            .spawn(move || {
                if bar.serve(Customer::new(number), seat).is_ok() {
                    burgers.fetch_add(1, Ordering::SeqCst);
                }
            })
            .expect("failed to spawn customer session");
        handles.push(handle);
    }
    for handle in handles {
        handle.join().expect("customer session panicked");
    }

    let seats_free = bar.available_seats();
    bar.close();
    info!("demo finished in {}ms", start.elapsed().as_millis());

    println!("DEMO SUMMARY");
    println!("customers={DEMO_CUSTOMERS} capacity={}", config.capacity);
    println!("burgers_served={}", burgers.load(Ordering::SeqCst));
    println!("max_seat_occupancy_observed={}", sample.max_occupancy);
    println!("seat_violation={}", sample.violation);
    println!("seats_free_at_end={seats_free}");
}

/// Run a single benchmark with optional parameter overrides.
pub fn run_benchmark(
    customers: Option<u64>,
    capacity: Option<usize>,
    grill_us: Option<u64>,
    eat_ms: Option<u64>,
    validate: bool,
) {
    let customers = customers.unwrap_or(50);
    let capacity = capacity.unwrap_or(4);
    let grill_us = grill_us.unwrap_or(1000);
    let eat_ms = eat_ms.unwrap_or(1);
    if customers == 0 {
        eprintln!("benchmark error: customers must be > 0");
        return;
    }
    if capacity == 0 {
        eprintln!("benchmark error: capacity must be > 0");
        return;
    }

    let result = benchmark_once(customers, capacity, grill_us, eat_ms);
    println!("{BENCH_CSV_HEADER}");
    print_result(&result, validate);
}

/// Sweep multiple benchmark configurations and print CSV output.
pub fn run_stress(
    customer_sets: Option<Vec<u64>>,
    capacity_sets: Option<Vec<usize>>,
    grill_us: Option<u64>,
    eat_ms: Option<u64>,
    validate: bool,
) {
    let default_customer_sets = [8u64, 16, 32];
    let default_capacity_sets = [1usize, 2, 4, 8];
    let grill_us = grill_us.unwrap_or(1000);
    let eat_ms = eat_ms.unwrap_or(1);

    let customer_sets = customer_sets.unwrap_or_else(|| default_customer_sets.to_vec());
    let capacity_sets = capacity_sets.unwrap_or_else(|| default_capacity_sets.to_vec());
    if customer_sets.iter().any(|&customers| customers == 0) {
        eprintln!("stress error: customer_sets must be > 0");
        return;
    }
    if capacity_sets.iter().any(|&capacity| capacity == 0) {
        eprintln!("stress error: capacity_sets must be > 0");
        return;
    }

    println!("{BENCH_CSV_HEADER}");
    for customers in customer_sets {
        for capacity in capacity_sets.iter().copied() {
            let result = benchmark_once(customers, capacity, grill_us, eat_ms);
            print_result(&result, validate);
        }
    }
}

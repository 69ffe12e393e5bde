//! Integration tests for batch concurrency.
//!
//! These use a thread-backed factory with synthetic work, so they exercise
//! the fan-out and reduction machinery without a counting service.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tallybench_core::Result;
use tallybench_core::call::{CallFactory, CallFuture, ThreadCallFuture, executor};

/// Each submission spawns a thread that records when it started running,
/// sleeps for a fixed period, and reports the period as its elapsed time.
struct SleepyFactory {
    delay: Duration,
    starts: Arc<Mutex<Vec<Instant>>>,
}

impl SleepyFactory {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            starts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl CallFactory for SleepyFactory {
    fn create_and_submit(&mut self) -> Result<Box<dyn CallFuture>> {
        let delay = self.delay;
        let starts = self.starts.clone();

        let handle = thread::spawn(move || {
            starts.lock().unwrap().push(Instant::now());
            thread::sleep(delay);
            Ok(delay.as_millis() as u64)
        });

        Ok(Box::new(ThreadCallFuture::new(handle)))
    }
}

#[test]
fn test_batch_calls_overlap_rather_than_serialize() {
    let delay = Duration::from_millis(200);
    let mut factory = SleepyFactory::new(delay);

    let begun = Instant::now();
    let average = executor::execute(8, &mut factory).unwrap();
    let wall_clock = begun.elapsed();

    assert_eq!(average, 200);

    // Eight serialized 200ms calls would take 1.6s; overlapping calls take
    // roughly one delay. Allow generous slack for slow machines.
    assert!(
        wall_clock < Duration::from_millis(1000),
        "batch took {:?}, calls appear serialized",
        wall_clock
    );
}

#[test]
fn test_start_timestamps_cluster_in_a_small_window() {
    let mut factory = SleepyFactory::new(Duration::from_millis(100));
    let starts = factory.starts.clone();

    executor::execute(8, &mut factory).unwrap();

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 8);

    let earliest = starts.iter().min().unwrap();
    let latest = starts.iter().max().unwrap();
    let window = latest.duration_since(*earliest);

    // All eight calls must be in flight long before the first one ends.
    assert!(
        window < Duration::from_millis(80),
        "start window {:?} is too wide for overlapping calls",
        window
    );
}

#[test]
fn test_completed_batch_futures_wait_instantly() {
    let mut factory = SleepyFactory::new(Duration::from_millis(50));
    let mut future = factory.create_and_submit().unwrap();

    future.wait_for_completion();

    let again = Instant::now();
    future.wait_for_completion();
    future.wait_for_completion();
    assert!(again.elapsed() < Duration::from_millis(20));
}

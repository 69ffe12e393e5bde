//! The four shared counters and their synchronization disciplines.
//!
//! The counters are deliberately shared, mutated by every connection
//! thread at once. Whether an increment takes the guard mutex, and whether
//! it sleeps before bumping, is part of each operation's identity: the
//! unlocked variants can lose updates under contention, the locked
//! variants cannot, and the delayed variants make overlap versus
//! serialization visible in wall-clock time.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tallybench_core::CounterOp;

/// One counter per operation, plus the single guard the locked variants
/// share.
pub struct CounterBank {
    delay: Duration,
    guard: Mutex<()>,
    slots: [AtomicU64; 4],
}

impl CounterBank {
    /// Create a bank whose delayed operations sleep for `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            guard: Mutex::new(()),
            slots: [const { AtomicU64::new(0) }; 4],
        }
    }

    /// Increment the counter owned by `op` and return its new value.
    ///
    /// For `SleepLocked` the delay happens while the guard is held, so
    /// concurrent callers serialize for the full delay each. For `Sleep`
    /// the delay happens outside any lock and concurrent callers overlap.
    pub fn increment(&self, op: CounterOp) -> u64 {
        if op.uses_lock() {
            let _held = self.guard.lock().unwrap();
            self.sleep_then_bump(op)
        } else {
            self.sleep_then_bump(op)
        }
    }

    /// The current value of `op`'s counter.
    pub fn value(&self, op: CounterOp) -> u64 {
        self.slots[op.index()].load(Ordering::Relaxed)
    }

    fn sleep_then_bump(&self, op: CounterOp) -> u64 {
        if op.has_delay() && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        // A read-modify-write in two separate steps. For the unlocked
        // operations this races with other callers, and increments can be
        // lost; the locked operations run it under the guard and are exact.
        let slot = &self.slots[op.index()];
        let next = slot.load(Ordering::Relaxed) + 1;
        slot.store(next, Ordering::Relaxed);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_increment_returns_running_count() {
        let bank = CounterBank::new(Duration::ZERO);
        assert_eq!(bank.increment(CounterOp::Basic), 1);
        assert_eq!(bank.increment(CounterOp::Basic), 2);
        assert_eq!(bank.increment(CounterOp::Basic), 3);
        assert_eq!(bank.value(CounterOp::Basic), 3);
    }

    #[test]
    fn test_each_operation_owns_its_counter() {
        let bank = CounterBank::new(Duration::ZERO);
        bank.increment(CounterOp::Basic);
        bank.increment(CounterOp::Locked);
        bank.increment(CounterOp::Locked);

        assert_eq!(bank.value(CounterOp::Basic), 1);
        assert_eq!(bank.value(CounterOp::Locked), 2);
        assert_eq!(bank.value(CounterOp::Sleep), 0);
        assert_eq!(bank.value(CounterOp::SleepLocked), 0);
    }

    #[test]
    fn test_locked_increments_are_exact_under_contention() {
        let bank = Arc::new(CounterBank::new(Duration::ZERO));
        let threads = 16;
        let per_thread = 500;

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let bank = bank.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        bank.increment(CounterOp::Locked);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(bank.value(CounterOp::Locked), threads * per_thread);
    }

    #[test]
    fn test_unlocked_increments_never_exceed_the_call_count() {
        let bank = Arc::new(CounterBank::new(Duration::ZERO));
        let threads = 16;
        let per_thread = 500;

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let bank = bank.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        bank.increment(CounterOp::Basic);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // Lost updates are expected under contention; an overshoot would
        // mean the counter invented calls.
        assert!(bank.value(CounterOp::Basic) <= threads * per_thread);
    }

    #[test]
    fn test_sleep_happens_inside_the_guard_for_sleep_locked() {
        let delay = Duration::from_millis(50);
        let bank = Arc::new(CounterBank::new(delay));
        let begun = Instant::now();

        let workers: Vec<_> = (0..3)
            .map(|_| {
                let bank = bank.clone();
                thread::spawn(move || bank.increment(CounterOp::SleepLocked))
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // Three callers serialized behind one guard sleep one delay each.
        assert!(begun.elapsed() >= delay * 3);
        assert_eq!(bank.value(CounterOp::SleepLocked), 3);
    }

    #[test]
    fn test_sleep_overlaps_without_the_guard() {
        let delay = Duration::from_millis(100);
        let bank = Arc::new(CounterBank::new(delay));
        let begun = Instant::now();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let bank = bank.clone();
                thread::spawn(move || bank.increment(CounterOp::Sleep))
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // Four overlapping sleeps finish in roughly one delay, nowhere
        // near the 400ms a serialized run would take.
        assert!(begun.elapsed() < Duration::from_millis(300));
    }
}

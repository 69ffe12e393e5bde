//! Counting operations exposed by the remote service.
//!
//! The four operations differ only in their synchronization discipline and
//! whether they sleep before incrementing. That discipline is part of the
//! operation's identity: the unlocked variants exist to surface lost
//! updates, the delayed variants to surface overlapping versus serialized
//! execution under concurrent load.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Selector for one of the service's four counting operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterOp {
    /// Unsynchronized increment.
    Basic,
    /// Mutex-guarded increment.
    Locked,
    /// Fixed delay, then unsynchronized increment.
    Sleep,
    /// Fixed delay, then mutex-guarded increment.
    SleepLocked,
}

impl CounterOp {
    /// Every operation, in benchmark order.
    pub const ALL: [CounterOp; 4] = [
        CounterOp::Basic,
        CounterOp::Locked,
        CounterOp::Sleep,
        CounterOp::SleepLocked,
    ];

    /// Whether the service takes its guard mutex for this operation.
    pub fn uses_lock(self) -> bool {
        matches!(self, CounterOp::Locked | CounterOp::SleepLocked)
    }

    /// Whether the service sleeps before incrementing.
    pub fn has_delay(self) -> bool {
        matches!(self, CounterOp::Sleep | CounterOp::SleepLocked)
    }

    /// Slot of this operation's counter. Each operation owns its own count.
    pub fn index(self) -> usize {
        match self {
            CounterOp::Basic => 0,
            CounterOp::Locked => 1,
            CounterOp::Sleep => 2,
            CounterOp::SleepLocked => 3,
        }
    }

    /// The flag token used on child command lines and in report lines.
    pub fn token(self) -> &'static str {
        match self {
            CounterOp::Basic => "basic",
            CounterOp::Locked => "locked",
            CounterOp::Sleep => "sleep",
            CounterOp::SleepLocked => "sleep-locked",
        }
    }
}

impl fmt::Display for CounterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CounterOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(CounterOp::Basic),
            "locked" => Ok(CounterOp::Locked),
            "sleep" => Ok(CounterOp::Sleep),
            "sleep-locked" => Ok(CounterOp::SleepLocked),
            other => Err(Error::InvalidOperation(format!(
                "unknown operation '{}', expected one of: basic, locked, sleep, sleep-locked",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        for op in CounterOp::ALL {
            assert_eq!(op.token().parse::<CounterOp>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_token_rejected() {
        let err = "turbo".parse::<CounterOp>().unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_lock_and_delay_table() {
        assert!(!CounterOp::Basic.uses_lock());
        assert!(!CounterOp::Basic.has_delay());
        assert!(CounterOp::Locked.uses_lock());
        assert!(!CounterOp::Locked.has_delay());
        assert!(!CounterOp::Sleep.uses_lock());
        assert!(CounterOp::Sleep.has_delay());
        assert!(CounterOp::SleepLocked.uses_lock());
        assert!(CounterOp::SleepLocked.has_delay());
    }

    #[test]
    fn test_each_op_owns_a_slot() {
        let mut seen = [false; 4];
        for op in CounterOp::ALL {
            assert!(!seen[op.index()]);
            seen[op.index()] = true;
        }
    }
}

//! A single timed invocation of a counting operation.

use std::time::Instant;

use crate::client::ServiceClient;
use crate::ops::CounterOp;

/// Performs one invocation of a counting operation and reports how long it
/// took.
///
/// A failure of the operation itself is logged and swallowed: the elapsed
/// time is still reported, so one misbehaving call cannot abort the batch
/// average it belongs to. There is no retry.
pub struct TimedCall {
    client: ServiceClient,
    op: CounterOp,
}

impl TimedCall {
    pub fn new(client: ServiceClient, op: CounterOp) -> Self {
        Self { client, op }
    }

    /// Run the call once, returning the elapsed wall-clock milliseconds.
    pub fn run(&mut self) -> u64 {
        let started = Instant::now();
        let count = self.client.call(self.op);
        let elapsed = started.elapsed().as_millis() as u64;

        match count {
            Ok(value) => {
                tracing::debug!("call number {} ({} ms)", value, elapsed);
            }
            Err(e) => {
                tracing::warn!("{} call failed after {} ms: {}", self.op, elapsed, e);
            }
        }

        elapsed
    }
}

//! Batch execution: fan out N calls, wait for all, average the timings.

use crate::call::factory::CallFactory;
use crate::error::{Error, Result};

/// Run `calls` concurrent invocations through `factory` and return the
/// integer-truncated mean of their elapsed milliseconds.
///
/// All submissions are issued in a tight loop before any wait, so the calls
/// overlap; any serialization of their effects must come from the service's
/// own synchronization. The first submission or retrieval failure is
/// propagated as-is; there are no retries.
pub fn execute(calls: usize, factory: &mut dyn CallFactory) -> Result<u64> {
    if calls == 0 {
        return Err(Error::InvalidOperation(
            "a batch needs at least one call".to_string(),
        ));
    }

    tracing::debug!("submitting {} calls", calls);
    let mut batch = Vec::with_capacity(calls);
    for _ in 0..calls {
        batch.push(factory.create_and_submit()?);
    }

    tracing::debug!("waiting for {} calls to complete", calls);
    for call in &mut batch {
        call.wait_for_completion();
    }

    let mut total: u64 = 0;
    for call in &mut batch {
        total += call.execution_time()?;
    }

    Ok(total / batch.len() as u64)
}

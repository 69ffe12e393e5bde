//! Uniform blocking wait and result retrieval over one in-flight call.
//!
//! A call runs either on a dedicated thread in this process or inside a
//! spawned child process; [`CallFuture`] hides the difference from the
//! batch executor.

use std::fs;
use std::path::PathBuf;
use std::thread::JoinHandle;

use crate::error::{Error, Result};
use crate::process::ChildProcess;
use crate::report::CallReport;

/// Handle for one in-flight invocation.
///
/// Each invocation gets exactly one future; a future is never reused.
pub trait CallFuture {
    /// Block until the invocation finishes.
    ///
    /// Never panics, and is idempotent: calling it again on a completed
    /// future returns immediately with no additional effect.
    fn wait_for_completion(&mut self);

    /// The elapsed milliseconds the invocation measured.
    ///
    /// Waits for completion first if necessary. Fails if the invocation
    /// produced no result, reporting distinctly whether it failed, never
    /// started, or had its wait interrupted; repeated retrieval reports the
    /// same answer.
    fn execution_time(&mut self) -> Result<u64>;
}

/// Terminal state of one invocation, recorded by the first completed wait.
#[derive(Debug, Clone)]
enum Outcome {
    /// The invocation measured this many elapsed milliseconds.
    Elapsed(u64),
    /// The invocation ran but failed to produce a timing.
    Failed(String),
    /// The underlying process was never started.
    NeverStarted(String),
    /// The wait was disturbed before the invocation finished.
    Interrupted(String),
}

impl Outcome {
    fn to_result(&self) -> Result<u64> {
        match self {
            Outcome::Elapsed(ms) => Ok(*ms),
            Outcome::Failed(message) => Err(Error::Invocation(message.clone())),
            Outcome::NeverStarted(message) => Err(Error::ProcessState(message.clone())),
            Outcome::Interrupted(message) => Err(Error::Interrupted(message.clone())),
        }
    }
}

/// A call running on a dedicated thread in this process.
pub struct ThreadCallFuture {
    handle: Option<JoinHandle<Result<u64>>>,
    outcome: Option<Outcome>,
}

impl ThreadCallFuture {
    pub fn new(handle: JoinHandle<Result<u64>>) -> Self {
        Self {
            handle: Some(handle),
            outcome: None,
        }
    }

    fn finished_outcome(&mut self) -> &Outcome {
        self.wait_for_completion();
        self.outcome.get_or_insert_with(|| {
            Outcome::Interrupted("the call was never submitted".to_string())
        })
    }
}

impl CallFuture for ThreadCallFuture {
    fn wait_for_completion(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        let outcome = match handle.join() {
            Ok(Ok(elapsed)) => Outcome::Elapsed(elapsed),
            Ok(Err(e)) => Outcome::Failed(e.to_string()),
            Err(_) => Outcome::Failed("call thread panicked".to_string()),
        };
        self.outcome = Some(outcome);
    }

    fn execution_time(&mut self) -> Result<u64> {
        self.finished_outcome().to_result()
    }
}

/// A call running inside an independently spawned child process.
///
/// Waiting blocks on the OS-level process wait; the measured time is read
/// from the report file the child wrote before exiting.
pub struct ProcessCallFuture {
    process: ChildProcess,
    report_path: PathBuf,
    outcome: Option<Outcome>,
}

impl ProcessCallFuture {
    pub fn new(process: ChildProcess, report_path: PathBuf) -> Self {
        Self {
            process,
            report_path,
            outcome: None,
        }
    }

    fn finished_outcome(&mut self) -> &Outcome {
        self.wait_for_completion();
        self.outcome.get_or_insert_with(|| {
            Outcome::Interrupted("the call was never submitted".to_string())
        })
    }
}

impl CallFuture for ProcessCallFuture {
    fn wait_for_completion(&mut self) {
        if self.outcome.is_some() {
            return;
        }

        let outcome = match self.process.wait_for_exit() {
            Ok(status) if status.success() => match CallReport::read(&self.report_path) {
                Ok(report) => Outcome::Elapsed(report.elapsed_ms),
                Err(e) => Outcome::Failed(format!(
                    "child exited cleanly but its result could not be read: {}",
                    e
                )),
            },
            Ok(status) => Outcome::Failed(format!(
                "child process terminated without a result ({})",
                status
            )),
            Err(Error::ProcessState(message)) => Outcome::NeverStarted(message),
            Err(e) => Outcome::Interrupted(e.to_string()),
        };

        let _ = fs::remove_file(&self.report_path);
        self.outcome = Some(outcome);
    }

    fn execution_time(&mut self) -> Result<u64> {
        self.finished_outcome().to_result()
    }
}

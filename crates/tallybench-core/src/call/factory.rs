//! Creation and submission of calls, one per factory invocation.

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use uuid::Uuid;

use crate::call::future::{CallFuture, ProcessCallFuture, ThreadCallFuture};
use crate::client::{ServiceClient, ServiceEndpoint};
use crate::error::{Error, Result};
use crate::ops::CounterOp;
use crate::process::{ChildProcess, CommandSpec};
use crate::timed::TimedCall;

/// Environment variable overriding the worker program spawned for
/// process-mode calls. Defaults to the current executable.
pub const WORKER_PROGRAM_ENV: &str = "TALLYBENCH_BIN";

/// Labels child-process console output across concurrent factories. Only
/// used to keep interleaved output attributable; not correctness-relevant.
static CREATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates and starts exactly one call per invocation, returning its future.
///
/// `create_and_submit` must not block on the call itself: the caller issues
/// all of a batch's submissions back-to-back before waiting on any of them,
/// which is what makes the calls genuinely overlap.
pub trait CallFactory {
    fn create_and_submit(&mut self) -> Result<Box<dyn CallFuture>>;
}

/// Runs each call on a freshly spawned thread in this process.
///
/// Every call gets its own thread and its own service connection; nothing
/// is pooled, so no submission can be delayed behind another call.
pub struct InProcessCallFactory {
    endpoint: ServiceEndpoint,
    op: CounterOp,
}

impl InProcessCallFactory {
    pub fn new(endpoint: ServiceEndpoint, op: CounterOp) -> Self {
        Self { endpoint, op }
    }
}

impl CallFactory for InProcessCallFactory {
    fn create_and_submit(&mut self) -> Result<Box<dyn CallFuture>> {
        let endpoint = self.endpoint.clone();
        let op = self.op;

        let handle = thread::Builder::new()
            .name(format!("{}-call", op))
            .spawn(move || {
                let client = ServiceClient::connect(&endpoint)?;
                Ok(TimedCall::new(client, op).run())
            })?;

        Ok(Box::new(ThreadCallFuture::new(handle)))
    }
}

/// Runs each call as an independently spawned child process.
///
/// The factory re-executes this program with the hidden `call` entry point,
/// passing the call unit as single-character flags and a private path for
/// the child's result report. The child's console output is forwarded with
/// a per-spawn numeric prefix.
pub struct SpawnedProcessCallFactory {
    endpoint: ServiceEndpoint,
    op: CounterOp,
    program: PathBuf,
}

impl SpawnedProcessCallFactory {
    /// Create a factory, resolving the worker program.
    ///
    /// Resolution order: the [`WORKER_PROGRAM_ENV`] override, then the
    /// currently running executable.
    pub fn new(endpoint: ServiceEndpoint, op: CounterOp) -> Result<Self> {
        Ok(Self {
            endpoint,
            op,
            program: worker_program()?,
        })
    }

    /// Create a factory spawning an explicit program.
    pub fn with_program(endpoint: ServiceEndpoint, op: CounterOp, program: PathBuf) -> Self {
        Self {
            endpoint,
            op,
            program,
        }
    }
}

fn worker_program() -> Result<PathBuf> {
    if let Ok(path) = env::var(WORKER_PROGRAM_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points at '{}', which does not exist; falling back to the current executable",
            WORKER_PROGRAM_ENV,
            path.display()
        );
    }

    env::current_exe().map_err(|e| Error::Spawn {
        program: "current executable".to_string(),
        source: e,
    })
}

impl CallFactory for SpawnedProcessCallFactory {
    fn create_and_submit(&mut self) -> Result<Box<dyn CallFuture>> {
        let creation_number = CREATION_COUNTER.fetch_add(1, Ordering::SeqCst);
        let report_path =
            env::temp_dir().join(format!("tallybench-call-{}.report", Uuid::new_v4()));

        let spec = CommandSpec::new(&self.program)
            .arg("call")
            .arg(format!("-h{}", self.endpoint.host))
            .arg(format!("-p{}", self.endpoint.port))
            .arg(format!("-n{}", self.endpoint.name))
            .arg(format!("-t{}", self.op))
            .arg(format!("-o{}", report_path.display()));

        let mut process = ChildProcess::new(spec);
        process.execute(&format!("{}: ", creation_number))?;

        Ok(Box::new(ProcessCallFuture::new(process, report_path)))
    }
}

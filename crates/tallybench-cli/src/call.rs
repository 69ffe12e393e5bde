//! Hidden entry point for one spawned timed call.
//!
//! The process-mode factory starts this program with the call unit encoded
//! as single-character flags, each value attached to its flag in the same
//! token (`-p1099`, `-hlocalhost`, ...). A missing required flag fails at
//! parse time, with a usage error, before any network activity. The
//! measured time is written to the report path the parent chose; the exit
//! status only classifies the run.

use std::path::PathBuf;

use clap::Args;

use tallybench_core::report::CallReport;
use tallybench_core::timed::TimedCall;
use tallybench_core::{CounterOp, ServiceClient, ServiceEndpoint};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct CallArgs {
    /// Port of the counting service
    #[arg(short = 'p')]
    pub port: u16,

    /// Host of the counting service
    #[arg(short = 'h')]
    pub host: String,

    /// Name the service is bound under
    #[arg(short = 'n')]
    pub name: String,

    /// Which counting operation to invoke
    #[arg(short = 't')]
    pub op: CounterOp,

    /// Where to write the call report
    #[arg(short = 'o')]
    pub report: PathBuf,
}

pub fn execute(args: CallArgs) -> anyhow::Result<()> {
    let endpoint = ServiceEndpoint::new(args.host, args.port, args.name);
    let client = ServiceClient::connect(&endpoint)?;

    let elapsed_ms = TimedCall::new(client, args.op).run();

    CallReport { elapsed_ms }.write(&args.report)?;
    println!("{} executed in {} ms", args.op, elapsed_ms);

    Ok(())
}

//! Bench command implementation: fan out call batches and print averages.

use clap::ValueEnum;

use tallybench_core::call::{
    CallFactory, InProcessCallFactory, SpawnedProcessCallFactory, executor,
};
use tallybench_core::{CounterOp, ServiceClient, ServiceEndpoint};

/// Which concurrency substrate each call runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One thread per call, inside this process
    Thread,
    /// One independently spawned child process per call
    Process,
}

pub fn execute(
    host: &str,
    port: u16,
    name: &str,
    calls: usize,
    mode: Mode,
    op: Option<CounterOp>,
) -> anyhow::Result<()> {
    let endpoint = ServiceEndpoint::new(host, port, name);

    // Check the service is actually there before fanning anything out.
    ServiceClient::connect(&endpoint)
        .map_err(|e| anyhow::anyhow!("counter service is not usable: {}", e))?;

    let ops: Vec<CounterOp> = match op {
        Some(op) => vec![op],
        None => CounterOp::ALL.to_vec(),
    };

    for op in ops {
        let mut factory: Box<dyn CallFactory> = match mode {
            Mode::Thread => Box::new(InProcessCallFactory::new(endpoint.clone(), op)),
            Mode::Process => Box::new(SpawnedProcessCallFactory::new(endpoint.clone(), op)?),
        };

        let average = executor::execute(calls, factory.as_mut())?;
        println!("{}: {} ms", op, average);
    }

    Ok(())
}

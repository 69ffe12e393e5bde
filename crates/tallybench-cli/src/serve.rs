//! Serve command implementation: run the counting service until killed.

use std::io::{self, Write};
use std::time::Duration;

use tallybench_server::{CounterService, ServiceConfig};

pub fn execute(host: &str, port: u16, name: &str, delay_ms: u64) -> anyhow::Result<()> {
    let config = ServiceConfig {
        host: host.to_string(),
        port,
        name: name.to_string(),
        delay: Duration::from_millis(delay_ms),
    };

    let service = CounterService::bind(&config)?;
    let addr = service.local_addr()?;

    // The line scripts key on, and the only way to learn the port when 0
    // was requested. Flushed eagerly: stdout is block-buffered when piped.
    println!("counter service '{}' listening on {}", name, addr);
    io::stdout().flush()?;

    service.run()?;
    Ok(())
}

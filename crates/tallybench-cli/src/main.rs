//! tallybench - concurrency micro-benchmark for a remote counting service.
//!
//! One executable, three roles: `serve` runs the counting service, `bench`
//! fans out concurrent calls and prints their average latencies, and the
//! hidden `call` subcommand is the entry point the process-mode benchmark
//! spawns for each call.

mod bench;
mod call;
mod serve;

use clap::{Parser, Subcommand};

use bench::Mode;
use tallybench_core::CounterOp;

#[derive(Parser)]
#[command(name = "tallybench")]
#[command(about = "Concurrency micro-benchmark against a remote counting service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the counting service
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on; 0 picks an ephemeral port
        #[arg(short, long, default_value = "1099")]
        port: u16,

        /// Name to bind the service under
        #[arg(short, long, default_value = "counters")]
        name: String,

        /// Delay of the sleep operations, in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,
    },

    /// Run concurrent call batches and print per-operation averages
    Bench {
        /// Host of the counting service
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port of the counting service
        #[arg(short, long, default_value = "1099")]
        port: u16,

        /// Name the service is bound under
        #[arg(short, long, default_value = "counters")]
        name: String,

        /// Number of concurrent calls per operation
        #[arg(short, long, default_value = "8")]
        calls: usize,

        /// How each call runs
        #[arg(short, long, value_enum, default_value_t = Mode::Thread)]
        mode: Mode,

        /// Benchmark a single operation instead of all four
        #[arg(short, long)]
        op: Option<CounterOp>,
    },

    /// Entry point of a spawned single-call child process
    #[command(hide = true)]
    Call(call::CallArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve {
            host,
            port,
            name,
            delay_ms,
        } => serve::execute(&host, port, &name, delay_ms)?,

        Commands::Bench {
            host,
            port,
            name,
            calls,
            mode,
            op,
        } => bench::execute(&host, port, &name, calls, mode, op)?,

        Commands::Call(args) => call::execute(args)?,
    }

    Ok(())
}

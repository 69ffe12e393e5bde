//! Core call-execution machinery for the tallybench concurrency harness.
//!
//! The harness fires a configurable number of concurrent invocations of a
//! remote counting operation and averages their wall-clock latencies. Every
//! invocation runs behind the same [`call::CallFuture`] interface whether it
//! executes on a dedicated thread in this process or inside an independently
//! spawned child process.
//!
//! # Architecture
//!
//! - **process**: OS process lifecycle (spawn, output redirection, wait,
//!   kill, exit status)
//! - **wire**: length-prefixed messages exchanged with the counting service
//! - **client**: service lookup and per-call transport
//! - **timed**: a single timed invocation
//! - **report**: the structured result channel written by spawned calls
//! - **call**: futures, factories, and the batch executor

pub mod call;
pub mod client;
pub mod error;
pub mod ops;
pub mod process;
pub mod report;
pub mod timed;
pub mod wire;

pub use client::{ServiceClient, ServiceEndpoint};
pub use error::{Error, Result};
pub use ops::CounterOp;

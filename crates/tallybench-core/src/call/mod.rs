//! Call futures, factories, and the batch executor.

pub mod executor;
pub mod factory;
pub mod future;

pub use factory::{CallFactory, InProcessCallFactory, SpawnedProcessCallFactory};
pub use future::{CallFuture, ProcessCallFuture, ThreadCallFuture};

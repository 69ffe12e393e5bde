//! The tallybench counting service.
//!
//! A TCP service exposing four counting operations that differ only in
//! synchronization discipline: plain increment, mutex-guarded increment,
//! and delayed versions of both. The service exists so the harness can
//! observe lost updates and lock serialization from the outside; the
//! counters are process-wide state shared across every connection.
//!
//! Clients resolve the service by symbolic name before calling: a
//! connection must send a successful `Lookup` for the bound name before
//! any `Call` is accepted on it.

pub mod counters;
pub mod error;

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tallybench_core::wire::{Request, Response, read_message_opt, write_message};

pub use counters::CounterBank;
pub use error::{ServerError, ServerResult};

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on; 0 picks an ephemeral port.
    pub port: u16,
    /// Symbolic name the service is bound under.
    pub name: String,
    /// How long the delayed operations sleep.
    pub delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1099,
            name: "counters".to_string(),
            delay: Duration::from_millis(1000),
        }
    }
}

/// A bound counting service, ready to accept connections.
pub struct CounterService {
    listener: TcpListener,
    name: String,
    bank: Arc<CounterBank>,
    shutdown: Arc<AtomicBool>,
}

impl CounterService {
    /// Bind the listening socket. The service does not accept connections
    /// until [`run`] or [`spawn`] is called.
    ///
    /// [`run`]: CounterService::run
    /// [`spawn`]: CounterService::spawn
    pub fn bind(config: &ServiceConfig) -> ServerResult<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).map_err(|e| ServerError::Bind {
            addr,
            source: e,
        })?;

        Ok(Self {
            listener,
            name: config.name.clone(),
            bank: Arc::new(CounterBank::new(config.delay)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address the service is bound to.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared counter bank.
    pub fn counters(&self) -> Arc<CounterBank> {
        self.bank.clone()
    }

    /// Accept connections until shut down, one handler thread per
    /// connection. Blocks the calling thread.
    pub fn run(self) -> ServerResult<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!("counter service '{}' exported at {}", self.name, addr);

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let name = self.name.clone();
                    let bank = self.bank.clone();
                    let peer = stream.peer_addr().ok();
                    thread::Builder::new()
                        .name("counter-connection".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &name, &bank) {
                                tracing::warn!("connection from {:?} failed: {}", peer, e);
                            }
                        })?;
                }
                Err(e) => tracing::warn!("failed to accept connection: {}", e),
            }
        }

        tracing::info!("counter service '{}' shut down", self.name);
        Ok(())
    }

    /// Run the accept loop on a background thread, returning a handle that
    /// can shut it down. Intended for embedding the service in tests.
    pub fn spawn(self) -> ServerResult<ServiceHandle> {
        let addr = self.listener.local_addr()?;
        let shutdown = self.shutdown.clone();
        let bank = self.bank.clone();

        let thread = thread::Builder::new()
            .name("counter-service".to_string())
            .spawn(move || {
                if let Err(e) = self.run() {
                    tracing::error!("counter service stopped with error: {}", e);
                }
            })?;

        Ok(ServiceHandle {
            addr,
            shutdown,
            bank,
            thread: Some(thread),
        })
    }
}

/// Handle to a background [`CounterService`].
pub struct ServiceHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    bank: Arc<CounterBank>,
    thread: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    /// The address the service is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The service's shared counters.
    pub fn counters(&self) -> &CounterBank {
        &self.bank
    }

    /// Stop accepting connections and wait for the accept loop to finish.
    ///
    /// Existing connection threads are left to drain on their own.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Wake the accept loop so it observes the flag.
        let _ = TcpStream::connect(self.addr);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Serve one client connection: a lookup handshake, then any number of
/// calls. Returns when the peer disconnects.
fn handle_connection(stream: TcpStream, name: &str, bank: &CounterBank) -> ServerResult<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    let mut bound = false;

    while let Some(request) = read_message_opt(&mut reader)? {
        let response = match request {
            Request::Lookup { name: wanted } => {
                if wanted == name {
                    bound = true;
                    Response::Bound
                } else {
                    tracing::warn!("lookup for unbound name '{}'", wanted);
                    Response::NotBound { name: wanted }
                }
            }
            Request::Call { op } => {
                if bound {
                    let value = bank.increment(op);
                    tracing::info!("call number {} ({})", value, op);
                    Response::Count { value }
                } else {
                    Response::Error {
                        message: "no name has been looked up on this connection".to_string(),
                    }
                }
            }
        };
        write_message(&mut writer, &response)?;
    }

    Ok(())
}

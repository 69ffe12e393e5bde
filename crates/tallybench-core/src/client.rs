//! Client side of the counting service: name lookup and per-call transport.

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::net::TcpStream;

use crate::error::{Error, Result};
use crate::ops::CounterOp;
use crate::wire::{Request, Response, read_message, write_message};

/// Where a counting service lives and what it is bound as.
///
/// This is the connection-parameter half of a call unit; it is fixed once a
/// call has been created from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Host the service listens on.
    pub host: String,
    /// Port the service listens on.
    pub port: u16,
    /// Symbolic name the service is bound under.
    pub name: String,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}:{}", self.name, self.host, self.port)
    }
}

/// A connected client for one counting service.
///
/// Connecting performs the name lookup handshake, so a constructed client is
/// known to hold a live, correctly bound connection.
pub struct ServiceClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl ServiceClient {
    /// Connect to the endpoint and resolve its binding name.
    ///
    /// Fails with [`Error::Connection`] if the service is unreachable and
    /// [`Error::Lookup`] if it is reachable but not bound under the
    /// expected name.
    pub fn connect(endpoint: &ServiceEndpoint) -> Result<Self> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .map_err(|e| Error::Connection(format!("cannot reach {}: {}", endpoint, e)))?;
        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);

        let mut client = Self { reader, writer };
        client.lookup(&endpoint.name)?;

        tracing::debug!("connected to counter service {}", endpoint);
        Ok(client)
    }

    fn lookup(&mut self, name: &str) -> Result<()> {
        write_message(
            &mut self.writer,
            &Request::Lookup {
                name: name.to_string(),
            },
        )?;

        match read_message(&mut self.reader)? {
            Response::Bound => Ok(()),
            Response::NotBound { name } => Err(Error::Lookup(name)),
            other => Err(Error::Protocol(format!(
                "unexpected response to lookup: {:?}",
                other
            ))),
        }
    }

    /// Invoke one counting operation and return the counter's new value.
    pub fn call(&mut self, op: CounterOp) -> Result<u64> {
        write_message(&mut self.writer, &Request::Call { op })?;

        match read_message(&mut self.reader)? {
            Response::Count { value } => Ok(value),
            Response::Error { message } => Err(Error::Invocation(message)),
            other => Err(Error::Protocol(format!(
                "unexpected response to call: {:?}",
                other
            ))),
        }
    }
}

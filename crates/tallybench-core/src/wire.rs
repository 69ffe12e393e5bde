//! Wire protocol for the counting service.
//!
//! Uses length-prefixed bincode messages over TCP.
//! Format: 4-byte length (u32 LE) + bincode-encoded message.

use std::io::{ErrorKind, Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ops::CounterOp;

/// Largest frame either side will accept. The protocol only carries small
/// control messages, so anything beyond this is a corrupt length prefix.
const MAX_FRAME_LEN: usize = 64 * 1024;

/// Request sent from a client to the counting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Resolve a service binding by symbolic name.
    Lookup {
        /// Name the client expects the service to be bound under.
        name: String,
    },

    /// Invoke one counting operation.
    Call {
        /// Which of the four operations to run.
        op: CounterOp,
    },
}

/// Response sent from the counting service to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    /// The requested name is bound by this service.
    Bound,

    /// No binding exists under the requested name.
    NotBound {
        /// The name that failed to resolve.
        name: String,
    },

    /// The operation completed, returning the counter's new value.
    Count {
        /// Running count after this increment.
        value: u64,
    },

    /// The operation was rejected or failed.
    Error {
        /// Failure description.
        message: String,
    },
}

/// Write a message to a writer using length-prefixed bincode encoding.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let bytes = bincode::serialize(message)
        .map_err(|e| Error::Protocol(format!("failed to encode message: {}", e)))?;

    let len = bytes.len() as u32;
    writer
        .write_all(&len.to_le_bytes())
        .map_err(|e| Error::Connection(format!("failed to write message length: {}", e)))?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::Connection(format!("failed to write message body: {}", e)))?;
    writer
        .flush()
        .map_err(|e| Error::Connection(format!("failed to flush stream: {}", e)))?;

    Ok(())
}

/// Read a message, or `None` if the stream was closed cleanly before a
/// frame began. EOF mid-frame is still an error.
pub fn read_message_opt<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => {
            return Err(Error::Connection(format!(
                "failed to read message length: {}",
                e
            )));
        }
    }
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_FRAME_LEN {
        return Err(Error::Protocol(format!("message too large: {} bytes", len)));
    }

    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| Error::Connection(format!("failed to read message body: {}", e)))?;

    let message = bincode::deserialize(&bytes)
        .map_err(|e| Error::Protocol(format!("failed to decode message: {}", e)))?;

    Ok(Some(message))
}

/// Read a message from a reader, treating any closed stream as a failure.
pub fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    read_message_opt(reader)?
        .ok_or_else(|| Error::Connection("service closed the connection".to_string()))
}

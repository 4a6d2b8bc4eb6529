//! Protocol error types.

use thiserror::Error;

use crate::message::MessageId;

/// Errors that can occur when working with the serial protocol.
///
/// Framing and checksum failures seen by the [`Parser`](crate::Parser) are not
/// errors: the parser resynchronizes and records them in
/// [`ParserStats`](crate::ParserStats) instead.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Message id is not in the registry.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// Payload length disagrees with the registered length for its id.
    #[error("payload length mismatch for {id}: expected {expected} bytes, got {actual}")]
    PayloadLengthMismatch {
        /// Message type being encoded or decoded.
        id: MessageId,
        /// Registered payload length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A typed accessor was called on a different message variant.
    #[error("wrong message type: expected {expected}, got {actual}")]
    WrongMessageType {
        /// Variant the caller asked for.
        expected: MessageId,
        /// Variant actually held.
        actual: MessageId,
    },

    /// Framing configuration is unusable.
    #[error("invalid frame config: {0}")]
    InvalidConfig(String),

    /// Byte source or sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

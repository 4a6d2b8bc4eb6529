//! Frame encoding.
//!
//! Every message travels in a self-delimiting frame:
//!
//! ```text
//! +-------+----+-----+-------------------+-----+
//! | start | id | len | payload[0..len]   | crc |
//! +-------+----+-----+-------------------+-----+
//! ```
//!
//! - `start`: start-of-frame marker, [`START_BYTE`] unless configured
//! - `id`: [`MessageId`] wire byte
//! - `len`: payload length, always the registered length for `id`
//! - `payload`: little-endian fields in declaration order
//! - `crc`: CRC-8 over `id`, `len` and `payload` (see [`crate::checksum`])

use bytes::{BufMut, BytesMut};

use crate::checksum::crc8;
use crate::config::FrameConfig;
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, MessageId};
use crate::types::Payload;

/// Stateless frame encoder.
///
/// Holds only the framing config, so it is `Copy` and can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEncoder {
    config: FrameConfig,
}

impl FrameEncoder {
    /// Create an encoder for the given framing config.
    pub fn new(config: FrameConfig) -> Self {
        FrameEncoder { config }
    }

    /// Framing config in use.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Encode a message into a new buffer.
    pub fn encode(&self, message: &Message) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(message.id().frame_len());
        self.encode_into(message, &mut buf);
        buf.to_vec()
    }

    /// Append an encoded message to `buf`.
    pub fn encode_into(&self, message: &Message, buf: &mut BytesMut) {
        let id = message.id();
        buf.reserve(id.frame_len());
        let start = buf.len();

        buf.put_u8(self.config.start_byte);
        buf.put_u8(id.as_u8());
        buf.put_u8(id.payload_len() as u8);
        message.write_payload(buf);

        let crc = crc8(&buf[start + 1..]);
        buf.put_u8(crc);
    }

    /// Encode a bare payload struct.
    pub fn encode_payload<T: Payload>(&self, payload: &T) -> Vec<u8> {
        self.encode(&payload.into_message())
    }

    /// Encode an untyped payload under a raw wire id.
    ///
    /// The id must be registered and `payload` must have exactly the
    /// registered length.
    pub fn encode_raw(&self, id: u8, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
        let id = MessageId::try_from(id)?;
        if payload.len() != id.payload_len() {
            return Err(ProtocolError::PayloadLengthMismatch {
                id,
                expected: id.payload_len(),
                actual: payload.len(),
            });
        }

        let mut buf = Vec::with_capacity(id.frame_len());
        buf.push(self.config.start_byte);
        buf.push(id.as_u8());
        buf.push(payload.len() as u8);
        buf.extend_from_slice(payload);
        let crc = crc8(&buf[1..]);
        buf.push(crc);
        Ok(buf)
    }
}

/// Encode a message with the default framing config.
pub fn encode(message: &Message) -> Vec<u8> {
    FrameEncoder::default().encode(message)
}

/// Append a message encoded with the default framing config to `buf`.
pub fn encode_into(message: &Message, buf: &mut BytesMut) {
    FrameEncoder::default().encode_into(message, buf)
}

/// Encode a bare payload struct with the default framing config.
pub fn encode_payload<T: Payload>(payload: &T) -> Vec<u8> {
    FrameEncoder::default().encode_payload(payload)
}

/// Encode an untyped payload under a raw wire id with the default framing
/// config.
pub fn encode_raw(id: u8, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    FrameEncoder::default().encode_raw(id, payload)
}

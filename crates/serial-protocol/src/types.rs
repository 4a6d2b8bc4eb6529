//! Message payload layouts.
//!
//! Every payload is a fixed-size run of little-endian fields. The [`Payload`]
//! trait ties each struct to its registry entry and knows how to move it to
//! and from the wire.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, MessageId};

/// A fixed-layout message payload.
pub trait Payload: Sized + Copy {
    /// Registry entry for this payload.
    const ID: MessageId;

    /// Exact encoded size in bytes.
    const LEN: usize;

    /// Append the payload fields to `buf`.
    fn write_to<B: BufMut>(&self, buf: &mut B);

    /// Read the fields from their fixed offsets.
    ///
    /// Fails unless `data` is exactly [`Self::LEN`] bytes.
    fn read_from(data: &[u8]) -> ProtocolResult<Self>;

    /// Wrap this payload in the message enum.
    fn into_message(self) -> Message;
}

fn check_len(id: MessageId, data: &[u8]) -> ProtocolResult<()> {
    if data.len() != id.payload_len() {
        return Err(ProtocolError::PayloadLengthMismatch {
            id,
            expected: id.payload_len(),
            actual: data.len(),
        });
    }
    Ok(())
}

/// Periodic liveness message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Number of heartbeats sent so far.
    pub count: u32,
}

impl Payload for Heartbeat {
    const ID: MessageId = MessageId::Heartbeat;
    const LEN: usize = HEARTBEAT_LEN;

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(self.count);
    }

    fn read_from(mut data: &[u8]) -> ProtocolResult<Self> {
        check_len(Self::ID, data)?;
        Ok(Heartbeat {
            count: data.get_u32_le(),
        })
    }

    fn into_message(self) -> Message {
        Message::Heartbeat(self)
    }
}

/// Request for the peer to add two operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    /// First operand.
    pub a: i32,
    /// Second operand.
    pub b: i32,
}

impl Request {
    /// Create a request.
    pub fn new(a: i32, b: i32) -> Self {
        Request { a, b }
    }

    /// The request that follows this one in a periodic send loop: both
    /// operands advance by one.
    pub fn next(&self) -> Self {
        Request {
            a: self.a.wrapping_add(1),
            b: self.b.wrapping_add(1),
        }
    }
}

impl Payload for Request {
    const ID: MessageId = MessageId::Request;
    const LEN: usize = REQUEST_LEN;

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.a);
        buf.put_i32_le(self.b);
    }

    fn read_from(mut data: &[u8]) -> ProtocolResult<Self> {
        check_len(Self::ID, data)?;
        let a = data.get_i32_le();
        let b = data.get_i32_le();
        Ok(Request { a, b })
    }

    fn into_message(self) -> Message {
        Message::Request(self)
    }
}

/// Answer to a [`Request`]: the operands echoed back with their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    /// First operand.
    pub a: i32,
    /// Second operand.
    pub b: i32,
    /// Result, `a + b` (wrapping).
    pub c: i32,
}

impl Response {
    /// Create a response with an explicit result.
    pub fn new(a: i32, b: i32, c: i32) -> Self {
        Response { a, b, c }
    }

    /// Answer a request.
    pub fn from_request(request: &Request) -> Self {
        Response {
            a: request.a,
            b: request.b,
            c: request.a.wrapping_add(request.b),
        }
    }
}

impl Payload for Response {
    const ID: MessageId = MessageId::Response;
    const LEN: usize = RESPONSE_LEN;

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.a);
        buf.put_i32_le(self.b);
        buf.put_i32_le(self.c);
    }

    fn read_from(mut data: &[u8]) -> ProtocolResult<Self> {
        check_len(Self::ID, data)?;
        let a = data.get_i32_le();
        let b = data.get_i32_le();
        let c = data.get_i32_le();
        Ok(Response { a, b, c })
    }

    fn into_message(self) -> Message {
        Message::Response(self)
    }
}

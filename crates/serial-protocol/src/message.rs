//! Message registry and the message sum type.

use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{Heartbeat, Payload, Request, Response};

/// Identifier of a registered message type.
///
/// The registry is closed: the wire id space is one byte and each id maps to
/// exactly one fixed payload layout. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageId {
    /// [`Heartbeat`] payload.
    Heartbeat = MSG_ID_HEARTBEAT,
    /// [`Request`] payload.
    Request = MSG_ID_REQUEST,
    /// [`Response`] payload.
    Response = MSG_ID_RESPONSE,
}

impl MessageId {
    /// Every registered id, in wire order.
    pub const ALL: [MessageId; 3] = [
        MessageId::Heartbeat,
        MessageId::Request,
        MessageId::Response,
    ];

    /// The wire byte for this id.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Fixed payload length registered for this id.
    pub fn payload_len(self) -> usize {
        match self {
            MessageId::Heartbeat => HEARTBEAT_LEN,
            MessageId::Request => REQUEST_LEN,
            MessageId::Response => RESPONSE_LEN,
        }
    }

    /// Total encoded frame length for this id.
    pub fn frame_len(self) -> usize {
        self.payload_len() + FRAME_OVERHEAD
    }
}

impl TryFrom<u8> for MessageId {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            MSG_ID_HEARTBEAT => Ok(MessageId::Heartbeat),
            MSG_ID_REQUEST => Ok(MessageId::Request),
            MSG_ID_RESPONSE => Ok(MessageId::Response),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

impl From<MessageId> for u8 {
    fn from(id: MessageId) -> Self {
        id as u8
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Heartbeat => write!(f, "Heartbeat"),
            MessageId::Request => write!(f, "Request"),
            MessageId::Response => write!(f, "Response"),
        }
    }
}

/// A decoded or outgoing message.
///
/// Exactly one payload is active. Use [`Message::id`] to dispatch, or the
/// `as_*` accessors, which fail on the wrong variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    /// Liveness counter.
    Heartbeat(Heartbeat),
    /// Operands to add.
    Request(Request),
    /// Operands and their sum.
    Response(Response),
}

impl Message {
    /// Registry id of the active variant.
    pub fn id(&self) -> MessageId {
        match self {
            Message::Heartbeat(_) => MessageId::Heartbeat,
            Message::Request(_) => MessageId::Request,
            Message::Response(_) => MessageId::Response,
        }
    }

    /// Decode a payload according to the registry layout for `id`.
    pub fn decode(id: MessageId, payload: &[u8]) -> ProtocolResult<Self> {
        let message = match id {
            MessageId::Heartbeat => Message::Heartbeat(Heartbeat::read_from(payload)?),
            MessageId::Request => Message::Request(Request::read_from(payload)?),
            MessageId::Response => Message::Response(Response::read_from(payload)?),
        };
        Ok(message)
    }

    /// Decode a payload given its raw wire id.
    pub fn decode_raw(id: u8, payload: &[u8]) -> ProtocolResult<Self> {
        Message::decode(MessageId::try_from(id)?, payload)
    }

    /// Append the payload fields (no framing) to `buf`.
    pub fn write_payload<B: BufMut>(&self, buf: &mut B) {
        match self {
            Message::Heartbeat(m) => m.write_to(buf),
            Message::Request(m) => m.write_to(buf),
            Message::Response(m) => m.write_to(buf),
        }
    }

    /// Heartbeat payload, or an error for any other variant.
    pub fn as_heartbeat(&self) -> ProtocolResult<&Heartbeat> {
        match self {
            Message::Heartbeat(m) => Ok(m),
            other => Err(other.wrong_type(MessageId::Heartbeat)),
        }
    }

    /// Request payload, or an error for any other variant.
    pub fn as_request(&self) -> ProtocolResult<&Request> {
        match self {
            Message::Request(m) => Ok(m),
            other => Err(other.wrong_type(MessageId::Request)),
        }
    }

    /// Response payload, or an error for any other variant.
    pub fn as_response(&self) -> ProtocolResult<&Response> {
        match self {
            Message::Response(m) => Ok(m),
            other => Err(other.wrong_type(MessageId::Response)),
        }
    }

    fn wrong_type(&self, expected: MessageId) -> ProtocolError {
        ProtocolError::WrongMessageType {
            expected,
            actual: self.id(),
        }
    }
}

impl From<Heartbeat> for Message {
    fn from(m: Heartbeat) -> Self {
        m.into_message()
    }
}

impl From<Request> for Message {
    fn from(m: Request) -> Self {
        m.into_message()
    }
}

impl From<Response> for Message {
    fn from(m: Response) -> Self {
        m.into_message()
    }
}

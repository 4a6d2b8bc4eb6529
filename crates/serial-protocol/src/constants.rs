//! Protocol constants
//!
//! These constants define the framing bytes, message identifiers and payload
//! sizes used on the wire.

// ============================================================================
// Framing
// ============================================================================

/// Default start-of-frame marker.
pub const START_BYTE: u8 = 0xA5;

/// Bytes preceding the payload: start marker, message id, payload length.
pub const FRAME_HEADER_LEN: usize = 3;

/// Bytes following the payload: the CRC-8 trailer.
pub const FRAME_TRAILER_LEN: usize = 1;

/// Framing overhead added to every payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + FRAME_TRAILER_LEN;

/// Largest payload of any registered message type.
pub const MAX_PAYLOAD_LEN: usize = RESPONSE_LEN;

/// Largest complete frame on the wire.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + FRAME_OVERHEAD;

// ============================================================================
// Message Identifiers
// ============================================================================

/// Periodic liveness counter.
pub const MSG_ID_HEARTBEAT: u8 = 0;
/// Request carrying two operands.
pub const MSG_ID_REQUEST: u8 = 1;
/// Response carrying both operands and their sum.
pub const MSG_ID_RESPONSE: u8 = 2;

// ============================================================================
// Payload Lengths
// ============================================================================

/// Heartbeat payload: count(4).
pub const HEARTBEAT_LEN: usize = 4;
/// Request payload: a(4) + b(4).
pub const REQUEST_LEN: usize = 8;
/// Response payload: a(4) + b(4) + c(4).
pub const RESPONSE_LEN: usize = 12;

// ============================================================================
// Checksum
// ============================================================================

/// CRC-8 generator polynomial (x^8 + x^2 + x + 1).
pub const CRC8_POLY: u8 = 0x07;
/// CRC-8 initial register value.
pub const CRC8_INIT: u8 = 0x00;

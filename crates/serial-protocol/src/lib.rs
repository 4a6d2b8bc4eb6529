//! Serial Message Protocol
//!
//! This crate frames small, fixed-layout messages for byte-at-a-time serial
//! links and recovers them from a noisy stream. A microcontroller and a host
//! exchange heartbeats, requests and responses; either side can drop, garble
//! or attach mid-stream and the receiver resynchronizes on its own.
//!
//! # Protocol Overview
//!
//! Each message is sent as one frame:
//!
//! - **Start marker**: `0xA5` by default (see [`FrameConfig`])
//! - **Header**: one-byte [`MessageId`] and one-byte payload length
//! - **Payload**: fixed-width little-endian fields
//! - **Trailer**: CRC-8 over header and payload
//!
//! The set of message types is closed ([`Message`]); every id has exactly
//! one payload length, which lets the [`Parser`] reject a plausible-looking
//! header that does not belong to a real frame.
//!
//! # Example
//!
//! ```rust
//! use serial_protocol::{encode, Message, Parser, Request};
//!
//! let bytes = encode(&Message::Request(Request::new(1, 1)));
//!
//! let mut parser = Parser::new();
//! let mut received = None;
//! for &byte in &bytes {
//!     if let Some(message) = parser.parse_byte(byte) {
//!         received = Some(message);
//!     }
//! }
//! assert_eq!(received, Some(Message::Request(Request::new(1, 1))));
//! ```

pub mod checksum;
mod config;
mod constants;
mod error;
mod frame;
mod message;
mod parser;
mod session;
mod types;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use message::*;
pub use parser::*;
pub use session::*;
pub use types::*;

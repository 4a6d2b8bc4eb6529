//! Streaming frame parser.
//!
//! [`Parser`] is fed one byte at a time and hands back a [`Message`] on the
//! byte that completes a valid frame. It never fails: anything that does not
//! frame up (unknown id, wrong length, bad CRC) is dropped and the parser
//! resynchronizes on the next start marker.
//!
//! Resynchronization replays the bytes that followed a false start marker, so
//! a real start marker swallowed by a rejected frame attempt is still found.
//!
//! ```text
//!              start            id + len ok          len bytes
//! AwaitingSync ------> ReadingHeader ------> ReadingPayload ------> ReadingChecksum
//!      ^                     |                                          |
//!      |   bad id / len      |               crc ok: emit message       |
//!      +---------------------+------------------------------------------+
//!                            crc bad: replay
//! ```

use std::collections::VecDeque;

use bytes::{BufMut, BytesMut};

use crate::checksum::crc8;
use crate::config::FrameConfig;
use crate::constants::*;
use crate::message::{Message, MessageId};

/// Stage of the frame currently being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseState {
    /// Scanning for a start marker.
    AwaitingSync,
    /// Reading the id and length bytes.
    ReadingHeader,
    /// Reading payload bytes.
    ReadingPayload,
    /// Waiting for the CRC byte.
    ReadingChecksum,
}

/// Running counters for a [`Parser`].
///
/// These are the only record of framing failures; the parse loop itself
/// reports nothing but "message" or "no message".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Frames that passed the CRC check and decoded.
    pub frames_decoded: u64,
    /// Bytes dropped while hunting for a start marker, including false
    /// start markers.
    pub bytes_discarded: u64,
    /// Frame attempts with an unregistered id.
    pub unknown_type: u64,
    /// Frame attempts whose length byte disagreed with the registry.
    pub length_mismatch: u64,
    /// Frame attempts that failed the CRC check.
    pub checksum_failures: u64,
}

impl ParserStats {
    /// Total frame attempts abandoned for any reason.
    pub fn frames_rejected(&self) -> u64 {
        self.unknown_type + self.length_mismatch + self.checksum_failures
    }
}

/// Internal stage, carrying what has been learned about the frame so far.
#[derive(Debug, Clone, Copy)]
enum Stage {
    AwaitingSync,
    ReadingHeader { id: Option<MessageId> },
    ReadingPayload { id: MessageId },
    ReadingChecksum { id: MessageId },
}

/// Why a frame attempt was abandoned.
#[derive(Debug)]
enum Reject {
    UnknownType(u8),
    LengthMismatch {
        id: MessageId,
        expected: usize,
        actual: usize,
    },
    Checksum {
        expected: u8,
        actual: u8,
    },
}

enum Step {
    Pending,
    Complete(Message),
    Rejected(Reject),
}

/// Byte-at-a-time frame parser.
///
/// A parser belongs to a single reader; every operation takes `&mut self`.
#[derive(Debug)]
pub struct Parser {
    config: FrameConfig,
    stage: Stage,
    /// Bytes of the current attempt after the start marker: id, len,
    /// payload and finally the CRC.
    frame: BytesMut,
    /// Bytes waiting to be (re)fed through the state machine.
    backlog: VecDeque<u8>,
    /// Messages decoded but not yet handed out.
    ready: VecDeque<Message>,
    stats: ParserStats,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser using the default start marker.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a parser for a specific framing config.
    pub fn with_config(config: FrameConfig) -> Self {
        Parser {
            config,
            stage: Stage::AwaitingSync,
            frame: BytesMut::with_capacity(MAX_FRAME_LEN),
            backlog: VecDeque::with_capacity(MAX_FRAME_LEN),
            ready: VecDeque::new(),
            stats: ParserStats::default(),
        }
    }

    /// Framing config in use.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Consume one byte.
    ///
    /// Returns the decoded message when `byte` completes a valid frame and
    /// `None` otherwise. Corrupt input only ever yields `None`.
    ///
    /// A replay after a rejected frame can, rarely, recover more than one
    /// message at once; the extras are returned by later calls or by
    /// [`take_ready`](Self::take_ready).
    pub fn parse_byte(&mut self, byte: u8) -> Option<Message> {
        self.backlog.push_back(byte);
        while let Some(b) = self.backlog.pop_front() {
            match self.step(b) {
                Step::Pending => {}
                Step::Complete(message) => self.ready.push_back(message),
                Step::Rejected(reason) => self.resync(reason),
            }
        }
        self.ready.pop_front()
    }

    /// Consume a slice, returning every message completed along the way.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Message> {
        let mut messages = Vec::new();
        for &byte in data {
            if let Some(message) = self.parse_byte(byte) {
                messages.push(message);
            }
        }
        messages.extend(self.ready.drain(..));
        messages
    }

    /// Take a message that was decoded but not yet returned.
    pub fn take_ready(&mut self) -> Option<Message> {
        self.ready.pop_front()
    }

    /// Current stage of the frame being assembled.
    pub fn state(&self) -> ParseState {
        match self.stage {
            Stage::AwaitingSync => ParseState::AwaitingSync,
            Stage::ReadingHeader { .. } => ParseState::ReadingHeader,
            Stage::ReadingPayload { .. } => ParseState::ReadingPayload,
            Stage::ReadingChecksum { .. } => ParseState::ReadingChecksum,
        }
    }

    /// Number of bytes held for the frame in progress.
    pub fn buffered_len(&self) -> usize {
        self.frame.len()
    }

    /// Counters since creation or the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Zero the counters.
    pub fn reset_stats(&mut self) {
        self.stats = ParserStats::default();
    }

    /// Drop any partial frame and undelivered messages and return to
    /// [`ParseState::AwaitingSync`]. Counters are kept.
    pub fn reset(&mut self) {
        self.clear_frame();
        self.backlog.clear();
        self.ready.clear();
    }

    fn clear_frame(&mut self) {
        self.frame.clear();
        self.stage = Stage::AwaitingSync;
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.stage {
            Stage::AwaitingSync => {
                if byte == self.config.start_byte {
                    self.stage = Stage::ReadingHeader { id: None };
                } else {
                    self.stats.bytes_discarded += 1;
                }
                Step::Pending
            }

            Stage::ReadingHeader { id: None } => {
                self.frame.put_u8(byte);
                match MessageId::try_from(byte) {
                    Ok(id) => {
                        self.stage = Stage::ReadingHeader { id: Some(id) };
                        Step::Pending
                    }
                    Err(_) => Step::Rejected(Reject::UnknownType(byte)),
                }
            }

            Stage::ReadingHeader { id: Some(id) } => {
                self.frame.put_u8(byte);
                let expected = id.payload_len();
                if byte as usize != expected {
                    return Step::Rejected(Reject::LengthMismatch {
                        id,
                        expected,
                        actual: byte as usize,
                    });
                }
                self.stage = if expected == 0 {
                    Stage::ReadingChecksum { id }
                } else {
                    Stage::ReadingPayload { id }
                };
                Step::Pending
            }

            Stage::ReadingPayload { id } => {
                self.frame.put_u8(byte);
                if self.frame.len() == 2 + id.payload_len() {
                    self.stage = Stage::ReadingChecksum { id };
                }
                Step::Pending
            }

            Stage::ReadingChecksum { id } => {
                let expected = crc8(&self.frame);
                if byte != expected {
                    self.frame.put_u8(byte);
                    return Step::Rejected(Reject::Checksum {
                        expected,
                        actual: byte,
                    });
                }

                // Length was checked against the registry in the header, so
                // the payload always fits the layout.
                let decoded = Message::decode(id, &self.frame[2..]);
                self.clear_frame();
                match decoded {
                    Ok(message) => {
                        self.stats.frames_decoded += 1;
                        log::trace!("decoded {} frame", id);
                        Step::Complete(message)
                    }
                    Err(e) => {
                        log::debug!("dropping {} frame: {}", id, e);
                        Step::Pending
                    }
                }
            }
        }
    }

    /// Abandon the current attempt and queue its bytes (minus the start
    /// marker) for another pass.
    fn resync(&mut self, reason: Reject) {
        match reason {
            Reject::UnknownType(raw) => {
                self.stats.unknown_type += 1;
                log::debug!("resync: unknown message type 0x{:02X}", raw);
            }
            Reject::LengthMismatch {
                id,
                expected,
                actual,
            } => {
                self.stats.length_mismatch += 1;
                log::debug!(
                    "resync: {} length {} (expected {})",
                    id,
                    actual,
                    expected
                );
            }
            Reject::Checksum { expected, actual } => {
                self.stats.checksum_failures += 1;
                log::debug!(
                    "resync: crc 0x{:02X} (expected 0x{:02X})",
                    actual,
                    expected
                );
            }
        }

        // The start marker that opened this attempt was not a real one.
        self.stats.bytes_discarded += 1;

        log::trace!("replaying {} bytes", self.frame.len());
        for &b in self.frame.iter().rev() {
            self.backlog.push_front(b);
        }
        self.clear_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;
    use crate::types::{Heartbeat, Request, Response};

    fn feed_all(parser: &mut Parser, data: &[u8]) -> Vec<Message> {
        parser.feed(data)
    }

    #[test]
    fn test_request_one_one() {
        let msg = Message::Request(Request::new(1, 1));
        let frame = encode(&msg);
        let mut parser = Parser::new();

        for (i, &byte) in frame.iter().enumerate() {
            let result = parser.parse_byte(byte);
            if i + 1 < frame.len() {
                assert!(result.is_none(), "message early at byte {}", i);
            } else {
                assert_eq!(result, Some(msg));
            }
        }
        assert_eq!(parser.state(), ParseState::AwaitingSync);
        assert_eq!(parser.buffered_len(), 0);
    }

    #[test]
    fn test_state_progression() {
        let frame = encode(&Heartbeat { count: 9 }.into());
        let mut parser = Parser::new();

        assert_eq!(parser.state(), ParseState::AwaitingSync);
        parser.parse_byte(frame[0]);
        assert_eq!(parser.state(), ParseState::ReadingHeader);
        parser.parse_byte(frame[1]);
        assert_eq!(parser.state(), ParseState::ReadingHeader);
        parser.parse_byte(frame[2]);
        assert_eq!(parser.state(), ParseState::ReadingPayload);
        for &b in &frame[3..7] {
            parser.parse_byte(b);
        }
        assert_eq!(parser.state(), ParseState::ReadingChecksum);
        assert!(parser.parse_byte(frame[7]).is_some());
        assert_eq!(parser.state(), ParseState::AwaitingSync);
    }

    #[test]
    fn test_garbage_before_frame() {
        let msg = Message::Response(Response::new(3, 4, 7));
        let mut data = vec![0x00, 0x13, 0xFF, 0x42];
        data.extend_from_slice(&encode(&msg));

        let mut parser = Parser::new();
        assert_eq!(feed_all(&mut parser, &data), vec![msg]);
        assert_eq!(parser.stats().bytes_discarded, 4);
        assert_eq!(parser.stats().frames_decoded, 1);
    }

    #[test]
    fn test_start_byte_in_garbage() {
        // A stray start marker right before the real one must not eat it
        let msg = Message::Request(Request::new(5, 6));
        let mut data = vec![0x10, START_BYTE, START_BYTE];
        data.extend_from_slice(&encode(&msg));

        let mut parser = Parser::new();
        assert_eq!(feed_all(&mut parser, &data), vec![msg]);
        assert_eq!(parser.stats().unknown_type, 2);
    }

    #[test]
    fn test_unknown_type_resyncs() {
        let mut parser = Parser::new();
        assert!(parser.parse_byte(START_BYTE).is_none());
        assert!(parser.parse_byte(0x33).is_none());
        assert_eq!(parser.state(), ParseState::AwaitingSync);
        assert_eq!(parser.stats().unknown_type, 1);
        assert_eq!(parser.buffered_len(), 0);
    }

    #[test]
    fn test_length_mismatch_resyncs() {
        let mut parser = Parser::new();
        parser.feed(&[START_BYTE, MSG_ID_REQUEST, 4]);
        assert_eq!(parser.state(), ParseState::AwaitingSync);
        assert_eq!(parser.stats().length_mismatch, 1);

        let msg = Message::Request(Request::new(1, 2));
        assert_eq!(parser.feed(&encode(&msg)), vec![msg]);
    }

    #[test]
    fn test_checksum_mismatch() {
        let msg = Message::Heartbeat(Heartbeat { count: 100 });
        let mut frame = encode(&msg);
        let last = frame.len() - 1;
        frame[last] ^= 0x01;

        let mut parser = Parser::new();
        assert!(parser.feed(&frame).is_empty());
        assert_eq!(parser.stats().checksum_failures, 1);
        assert_eq!(parser.state(), ParseState::AwaitingSync);

        assert_eq!(parser.feed(&encode(&msg)), vec![msg]);
    }

    #[test]
    fn test_truncated_frame() {
        let frame = encode(&Response::new(1, 2, 3).into());
        for k in 0..frame.len() {
            let mut parser = Parser::new();
            assert!(parser.feed(&frame[..k]).is_empty(), "prefix {}", k);
        }
    }

    #[test]
    fn test_back_to_back() {
        let messages = vec![
            Message::Heartbeat(Heartbeat { count: 1 }),
            Message::Request(Request::new(1, 1)),
            Message::Response(Response::new(1, 1, 2)),
            Message::Heartbeat(Heartbeat { count: 2 }),
        ];
        let data: Vec<u8> = messages.iter().flat_map(encode).collect();

        let mut parser = Parser::new();
        assert_eq!(parser.feed(&data), messages);
        assert_eq!(parser.stats().frames_rejected(), 0);
        assert_eq!(parser.stats().bytes_discarded, 0);
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let frame = encode(&Request::new(8, 9).into());
        let mut parser = Parser::new();
        parser.feed(&frame[..5]);
        assert_eq!(parser.buffered_len(), 4);

        parser.reset();
        assert_eq!(parser.state(), ParseState::AwaitingSync);
        assert_eq!(parser.buffered_len(), 0);

        // The tail of the old frame is now garbage
        assert!(parser.feed(&frame[5..]).is_empty());
        assert_eq!(parser.feed(&frame).len(), 1);
    }

    #[test]
    fn test_custom_start_byte() {
        let config = FrameConfig::with_start_byte(0x7E).unwrap();
        let encoder = crate::frame::FrameEncoder::new(config);
        let msg = Message::Heartbeat(Heartbeat { count: 5 });

        let mut parser = Parser::with_config(config);
        assert_eq!(parser.feed(&encoder.encode(&msg)), vec![msg]);

        // Default framing is not recognized
        let mut parser = Parser::with_config(config);
        assert!(parser.feed(&encode(&msg)).is_empty());
    }

    #[test]
    fn test_reset_stats() {
        let mut parser = Parser::new();
        parser.feed(&[1, 2, 3]);
        assert_eq!(parser.stats().bytes_discarded, 3);
        parser.reset_stats();
        assert_eq!(parser.stats(), ParserStats::default());
    }
}

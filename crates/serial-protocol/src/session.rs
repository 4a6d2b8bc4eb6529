//! Glue between the protocol engine and a byte transport.
//!
//! Nothing here opens a device. Any `Read`/`Write` will do: a serial port
//! handle, a TCP stream, a pipe, or an in-memory buffer in tests.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BytesMut};

use crate::config::FrameConfig;
use crate::error::ProtocolResult;
use crate::frame::FrameEncoder;
use crate::message::Message;
use crate::parser::{Parser, ParserStats};

/// Read chunk size for [`MessageReader`].
const READ_CHUNK: usize = 64;

/// Encoder and parser for one end of a link.
#[derive(Debug, Default)]
pub struct ProtocolSession {
    encoder: FrameEncoder,
    parser: Parser,
    decoded: VecDeque<Message>,
}

impl ProtocolSession {
    /// Create a session with default framing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with custom framing.
    pub fn with_config(config: FrameConfig) -> Self {
        ProtocolSession {
            encoder: FrameEncoder::new(config),
            parser: Parser::with_config(config),
            decoded: VecDeque::new(),
        }
    }

    /// Encode a message for transmission.
    pub fn encode(&self, message: &Message) -> Vec<u8> {
        self.encoder.encode(message)
    }

    /// Encode a message and write it to `writer`.
    pub fn send<W: Write>(&self, writer: &mut W, message: &Message) -> ProtocolResult<()> {
        write_message(writer, message, &self.encoder)
    }

    /// Feed received data into the parser.
    pub fn feed(&mut self, data: &[u8]) {
        let messages = self.parser.feed(data);
        self.decoded.extend(messages);
    }

    /// Next decoded message, if any.
    pub fn try_decode(&mut self) -> Option<Message> {
        self.decoded.pop_front()
    }

    /// Parser counters.
    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
    }

    /// Drop partial frames and undelivered messages.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.decoded.clear();
    }
}

/// Encode `message` and write the whole frame to `writer`.
pub fn write_message<W: Write>(
    writer: &mut W,
    message: &Message,
    encoder: &FrameEncoder,
) -> ProtocolResult<()> {
    let frame = encoder.encode(message);
    writer.write_all(&frame)?;
    log::trace!("sent {} frame ({} bytes)", message.id(), frame.len());
    Ok(())
}

/// Pulls bytes from a reader and yields decoded messages.
///
/// Read timeouts (`TimedOut`, `WouldBlock`) and `Interrupted` mean "no byte
/// this poll", not failure, which matches how serial ports with a read
/// timeout behave.
#[derive(Debug)]
pub struct MessageReader<R> {
    reader: R,
    parser: Parser,
    pending: BytesMut,
    eof: bool,
}

impl<R: Read> MessageReader<R> {
    /// Wrap a reader with default framing.
    pub fn new(reader: R) -> Self {
        Self::with_parser(reader, Parser::new())
    }

    /// Wrap a reader with an existing parser.
    pub fn with_parser(reader: R, parser: Parser) -> Self {
        MessageReader {
            reader,
            parser,
            pending: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
        }
    }

    /// Whether the reader has reported end of stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Parser counters.
    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Make one read attempt and return the first message it completes.
    ///
    /// `Ok(None)` means the read timed out or hit end of stream before a
    /// frame completed; partial frames are kept for the next poll. A caller
    /// running a receive loop can check its shutdown flag between polls.
    pub fn poll(&mut self) -> ProtocolResult<Option<Message>> {
        if let Some(message) = self.drain_pending() {
            return Ok(Some(message));
        }
        if self.eof {
            return Ok(None);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = match self.reader.read(&mut chunk) {
            Ok(0) => {
                self.eof = true;
                return Ok(None);
            }
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        self.pending.extend_from_slice(&chunk[..n]);
        Ok(self.drain_pending())
    }

    fn drain_pending(&mut self) -> Option<Message> {
        if let Some(message) = self.parser.take_ready() {
            return Some(message);
        }
        while self.pending.has_remaining() {
            let byte = self.pending.get_u8();
            if let Some(message) = self.parser.parse_byte(byte) {
                return Some(message);
            }
        }
        None
    }
}

impl<R: Read> Iterator for MessageReader<R> {
    type Item = ProtocolResult<Message>;

    /// Blocks through timeouts; ends at end of stream.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.poll() {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) if self.eof => return None,
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

//! Line assembly for interactive shell output.
//!
//! Raw chunks go through two filters before they land in the buffer:
//!
//! 1. The erase artefact some Foundry firmware emits to wipe its
//!    `--More--` banner is removed from the start of the chunk.
//! 2. ANSI/VT escape sequences are stripped with a `vte` parser that lives
//!    as long as the buffer, so sequences split across reads are handled.
//!
//! Only printable characters plus `\n`, `\r` and `\t` survive.

use bytes::BytesMut;
use memchr::memchr;
use vte::{Parser, Perform};

/// Remove a leading erase artefact: one backspace, then any run of
/// `" \b\b"`, then a single `" \b"`.
pub fn strip_erase_prefix(mut chunk: &[u8]) -> &[u8] {
    if chunk.first() == Some(&0x08) {
        chunk = &chunk[1..];
    }
    while chunk.starts_with(b" \x08\x08") {
        chunk = &chunk[3..];
    }
    if chunk.starts_with(b" \x08") {
        chunk = &chunk[2..];
    }
    chunk
}

/// Collects the printable output of the vte parser.
struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

/// Buffer that turns a stream of chunks into lines.
pub struct LineBuffer {
    buffer: BytesMut,
    parser: Parser,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            parser: Parser::new(),
        }
    }

    /// Append a raw chunk read from the transport.
    pub fn extend(&mut self, chunk: &[u8]) {
        let chunk = strip_erase_prefix(chunk);
        let mut sink = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, chunk);
    }

    /// Pop the next complete line, including its `\n`.
    pub fn next_line(&mut self) -> Option<String> {
        let idx = memchr(b'\n', &self.buffer)?;
        let line = self.buffer.split_to(idx + 1);
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Take whatever is buffered, complete line or not.
    pub fn take_partial(&mut self) -> String {
        let rest = self.buffer.split();
        String::from_utf8_lossy(&rest).into_owned()
    }

    /// Pop everything up to and including the first occurrence of `needle`.
    pub fn take_until(&mut self, needle: &[u8]) -> Option<String> {
        if needle.is_empty() {
            return Some(String::new());
        }
        let pos = self
            .buffer
            .windows(needle.len())
            .position(|window| window == needle)?;
        let taken = self.buffer.split_to(pos + needle.len());
        Some(String::from_utf8_lossy(&taken).into_owned())
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use log::trace;
use tokio::time::Instant;

use super::backoff::Backoff;
use super::buffer::LineBuffer;
use crate::error::{ChannelError, Result};
use crate::transport::Transport;

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// How long to wait for the first byte of a line.
    pub timeout: Duration,

    /// Polls for more data before a partial line is returned as a prompt.
    pub partial_read: Backoff,

    /// How long the drain after logout waits for the peer to close.
    pub drain_timeout: Duration,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            partial_read: Backoff::partial_read(),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of one bounded read from the transport.
enum Fill {
    Data,
    Idle,
    Closed,
}

/// Text collected by [`PtyChannel::read_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadUntil {
    /// Everything read, including the needle when it was found.
    pub text: String,

    /// Whether the needle was seen before the timeout.
    pub matched: bool,
}

/// Line-oriented channel over a [`Transport`].
///
/// Reads never block indefinitely: the first byte of a line is awaited for
/// at most the configured timeout, and a line without a newline is returned
/// as-is once the partial-read polls come up empty.
pub struct PtyChannel {
    transport: Box<dyn Transport>,
    buffer: LineBuffer,
    config: PtyConfig,
}

impl PtyChannel {
    /// Create a channel over an open transport.
    pub fn new(transport: Box<dyn Transport>, config: PtyConfig) -> Self {
        Self {
            transport,
            buffer: LineBuffer::new(),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PtyConfig {
        &self.config
    }

    /// Write raw text.
    pub async fn send(&mut self, data: &str) -> Result<()> {
        self.transport.send(data.as_bytes()).await
    }

    /// Write `line` followed by `terminator`.
    pub async fn send_line(&mut self, line: &str, terminator: &str) -> Result<()> {
        let mut wire = String::with_capacity(line.len() + terminator.len());
        wire.push_str(line);
        wire.push_str(terminator);
        self.transport.send(wire.as_bytes()).await
    }

    async fn fill(&mut self, wait: Duration) -> Result<Fill> {
        match tokio::time::timeout(wait, self.transport.recv()).await {
            Err(_) => Ok(Fill::Idle),
            Ok(Ok(Some(chunk))) => {
                trace!("<<< {:?}", String::from_utf8_lossy(&chunk));
                self.buffer.extend(&chunk);
                Ok(Fill::Data)
            }
            Ok(Ok(None)) => Ok(Fill::Closed),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Read one line, including its line ending when it has one.
    pub async fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.config.timeout;
        while self.buffer.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ChannelError::ReadTimeout(self.config.timeout).into());
            }
            match self.fill(remaining).await? {
                Fill::Data => {}
                Fill::Idle => return Err(ChannelError::ReadTimeout(self.config.timeout).into()),
                Fill::Closed => return Err(ChannelError::Closed.into()),
            }
        }

        let polls = self.config.partial_read;
        loop {
            if let Some(line) = self.buffer.next_line() {
                return Ok(line);
            }

            let mut grew = false;
            for _ in 0..polls.attempts() {
                match self.fill(polls.delay).await? {
                    Fill::Data => {
                        grew = true;
                        break;
                    }
                    Fill::Idle => {}
                    Fill::Closed => break,
                }
            }

            if !grew {
                return Ok(self.buffer.take_partial());
            }
        }
    }

    /// Read until `needle` appears or `timeout` elapses.
    ///
    /// Text after the needle stays buffered for the next read.
    pub async fn read_until(&mut self, needle: &str, timeout: Duration) -> Result<ReadUntil> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(text) = self.buffer.take_until(needle.as_bytes()) {
                return Ok(ReadUntil {
                    text,
                    matched: true,
                });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.fill(remaining).await? {
                Fill::Data => {}
                Fill::Idle | Fill::Closed => break,
            }
        }
        Ok(ReadUntil {
            text: self.buffer.take_partial(),
            matched: false,
        })
    }

    /// Wait up to `grace` for the remote shell to exit.
    pub async fn wait_for_exit(&mut self, grace: Duration) -> Result<bool> {
        let deadline = Instant::now() + grace;
        loop {
            if self.transport.exit_status().is_some() || self.transport.is_closed() {
                return Ok(true);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.fill(remaining).await? {
                Fill::Data => {}
                Fill::Idle => return Ok(false),
                Fill::Closed => return Ok(true),
            }
        }
    }

    /// Read and discard until the peer closes or the drain timeout passes.
    ///
    /// Returns the number of bytes thrown away.
    pub async fn drain(&mut self) -> usize {
        let mut drained = self.buffer.len();
        let deadline = Instant::now() + self.config.drain_timeout;
        loop {
            let _ = self.buffer.take_partial();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.fill(remaining).await {
                Ok(Fill::Data) => drained += self.buffer.len(),
                Ok(Fill::Idle) | Ok(Fill::Closed) | Err(_) => break,
            }
        }
        drained
    }

    /// Exit status reported by the remote shell.
    pub fn exit_status(&self) -> Option<u32> {
        self.transport.exit_status()
    }

    /// Release the transport.
    pub async fn close(self) -> Result<()> {
        self.transport.close().await
    }
}

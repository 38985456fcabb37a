//! Minimal Telnet transport for terminal servers.
//!
//! Option negotiation is refused outright: every `DO` is answered with
//! `WONT` and every `WILL` with `DONT`, which leaves the peer in plain
//! NVT mode. Subnegotiation blocks are discarded.

use async_trait::async_trait;
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::config::TelnetConfig;
use super::{Connector, Transport};
use crate::error::{Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

/// Opens plain TCP Telnet sessions.
#[derive(Debug, Clone, Default)]
pub struct TelnetConnector {
    config: TelnetConfig,
}

impl TelnetConnector {
    /// Create a connector using `config` for every host.
    pub fn new(config: TelnetConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for TelnetConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn Transport>> {
        debug!("Opening telnet session to {}:{}", host, self.config.port);
        let stream = tokio::time::timeout(
            self.config.timeout,
            TcpStream::connect((host, self.config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: host.to_string(),
            port: self.config.port,
            source,
        })?;
        Ok(Box::new(TelnetTransport::new(stream)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Option(u8),
    Sub,
    SubIac,
}

/// Telnet codec over any async byte stream.
pub struct TelnetTransport<S> {
    stream: S,
    state: State,
    closed: bool,
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: State::Data,
            closed: false,
        }
    }

    /// Strip protocol bytes from `input`, returning payload and replies.
    fn decode(&mut self, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(input.len());
        let mut replies = Vec::new();

        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, b) => {
                    data.push(b);
                    State::Data
                }
                (State::Iac, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Iac, cmd @ (DO | DONT | WILL | WONT)) => State::Option(cmd),
                (State::Iac, SB) => State::Sub,
                (State::Iac, _) => State::Data,
                (State::Option(cmd), option) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    trace!("telnet: refused option {} ({})", option, cmd);
                    State::Data
                }
                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
            };
        }

        (data, replies)
    }
}

#[async_trait]
impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut escaped = Vec::with_capacity(data.len());
        for &byte in data {
            escaped.push(byte);
            if byte == IAC {
                escaped.push(IAC);
            }
        }
        self.stream
            .write_all(&escaped)
            .await
            .map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; 4096];
        while !self.closed {
            let n = self.stream.read(&mut buf).await.map_err(TransportError::Io)?;
            if n == 0 {
                self.closed = true;
                break;
            }
            let (data, replies) = self.decode(&buf[..n]);
            if !replies.is_empty() {
                self.stream
                    .write_all(&replies)
                    .await
                    .map_err(TransportError::Io)?;
            }
            if !data.is_empty() {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }

    fn exit_status(&self) -> Option<u32> {
        None
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

//! Scripted shell used by unit tests in place of a real device.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Connector, Transport};
use crate::error::{Result, TransportError};

/// Produces the bytes a device writes back after receiving one line.
/// `None` closes the shell.
pub(crate) type Responder = Box<dyn FnMut(&str) -> Option<Vec<u8>> + Send>;

/// A fake interactive shell. Lines sent to it are split on `\n`, passed to
/// the responder, and the reply is queued for `recv`.
pub(crate) struct ScriptedShell {
    inbox: VecDeque<u8>,
    partial: Vec<u8>,
    responder: Responder,
    sent: Arc<Mutex<Vec<String>>>,
    closing: bool,
    exit_status: Option<u32>,
}

impl ScriptedShell {
    pub(crate) fn new(banner: &str, responder: Responder) -> Self {
        Self {
            inbox: banner.bytes().collect(),
            partial: Vec::new(),
            responder,
            sent: Arc::new(Mutex::new(Vec::new())),
            closing: false,
            exit_status: None,
        }
    }

    pub(crate) fn sent_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.sent.clone()
    }

    pub(crate) fn with_sent_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.sent = log;
        self
    }
}

/// Echo `command`, then `body`, then `prompt` without a newline.
pub(crate) fn reply(command: &str, body: &str, prompt: &str) -> Option<Vec<u8>> {
    Some(format!("{command}\r\n{body}{prompt}").into_bytes())
}

#[async_trait]
impl Transport for ScriptedShell {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.closing {
            return Err(TransportError::Disconnected.into());
        }
        self.partial.extend_from_slice(data);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            self.sent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(line.clone());
            match (self.responder)(&line) {
                Some(bytes) => self.inbox.extend(bytes),
                None => {
                    self.inbox.extend(format!("{line}\r\n").into_bytes());
                    self.closing = true;
                    self.exit_status = Some(0);
                    break;
                }
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.inbox.is_empty() {
            return Ok(Some(self.inbox.drain(..).collect()));
        }
        if self.closing {
            return Ok(None);
        }
        std::future::pending::<()>().await;
        Ok(None)
    }

    fn exit_status(&self) -> Option<u32> {
        self.exit_status
    }

    fn is_closed(&self) -> bool {
        self.closing && self.inbox.is_empty()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Hands out scripted shells, failing the first `failures` attempts.
pub(crate) struct ScriptedConnector {
    failures: AtomicU32,
    attempts: AtomicU32,
    make: Box<dyn Fn() -> ScriptedShell + Send + Sync>,
}

impl ScriptedConnector {
    pub(crate) fn new(make: impl Fn() -> ScriptedShell + Send + Sync + 'static) -> Self {
        Self {
            failures: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
            make: Box::new(make),
        }
    }

    pub(crate) fn failing(self, failures: u32) -> Self {
        self.failures.store(failures, Ordering::SeqCst);
        self
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::ConnectionFailed {
                host: host.to_string(),
                port: 22,
                source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "kex reset"),
            }
            .into());
        }
        Ok(Box::new((self.make)()))
    }
}

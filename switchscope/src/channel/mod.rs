//! Channel layer: line assembly, prompt detection and bounded reads.
//!
//! This module turns a raw [`Transport`](crate::transport::Transport) byte
//! stream into the lines and prompts the session state machine works with.

mod backoff;
mod buffer;
mod patterns;
mod pty;

pub use backoff::Backoff;
pub use buffer::{LineBuffer, strip_erase_prefix};
pub use patterns::{MODE_GROUP, Mode, PromptLine, PromptMatcher, compile_prompt};
pub use pty::{PtyChannel, PtyConfig, ReadUntil};

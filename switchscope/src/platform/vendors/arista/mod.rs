//! Arista EOS platform support.

mod platform;

pub use platform::{AristaBehavior, platform, vocabulary};

//! Built-in vendor definitions.

pub mod arista;
pub mod cisco;
pub mod foundry;

use regex::Regex;

/// Banner printed when output is paged.
pub const MORE_BANNER: &str =
    "--More--, next page: Space, next line: Return key, quit: Control-c";

/// Command whose prompt shows the current mode without changing anything.
pub const MODE_PROBE: &str = "show clock";

/// Hex MAC in the dotted `xxxx.xxxx.xxxx` form all supported switches print.
pub(crate) const DOTTED_MAC: &str = r"[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}";

pub(crate) fn more_banner() -> Regex {
    pattern(&format!("^{}", regex::escape(MORE_BANNER)))
}

pub(crate) fn pattern(source: &str) -> Regex {
    match Regex::new(source) {
        Ok(re) => re,
        Err(e) => panic!("built-in pattern {source:?} is invalid: {e}"),
    }
}

//! Prompt detection.
//!
//! Switch prompts are matched per host. A vendor supplies a template such
//! as `^SSH@{host}(?:\([-/\w]*\))?{mode}(?P<cmd>.*)`; `{host}` is replaced
//! with the escaped host name and `{mode}` with a capture of the one-character
//! mode indicator. Whatever follows the prompt is the echoed command.

use std::fmt;

use regex::Regex;

/// CLI mode signalled by the last character of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `>` prompt.
    Unprivileged,
    /// `#` prompt.
    Privileged,
}

impl Mode {
    /// Parse a prompt mode character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Mode::Unprivileged),
            '#' => Some(Mode::Privileged),
            _ => None,
        }
    }

    /// The prompt character for this mode.
    pub fn as_char(self) -> char {
        match self {
            Mode::Unprivileged => '>',
            Mode::Privileged => '#',
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A line recognised as a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLine {
    /// Mode shown by the prompt.
    pub mode: Mode,

    /// Text after the prompt (the echoed command, possibly empty).
    pub command: String,
}

/// Trait for prompt matching - regex by default, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Parse `line` as a prompt, or `None` if it is ordinary output.
    fn parse(&self, line: &str) -> Option<PromptLine>;

    /// Check if the line is a prompt.
    fn is_match(&self, line: &str) -> bool {
        self.parse(line).is_some()
    }
}

/// Regex matcher. The pattern must define `mode` and `cmd` groups.
impl PromptMatcher for Regex {
    fn parse(&self, line: &str) -> Option<PromptLine> {
        let caps = self.captures(line)?;
        let mode = caps
            .name("mode")
            .and_then(|m| m.as_str().chars().next())
            .and_then(Mode::from_char)?;
        let command = caps.name("cmd").map_or("", |m| m.as_str()).to_string();
        Some(PromptLine { mode, command })
    }
}

/// Pattern substituted for `{mode}` in prompt templates.
pub const MODE_GROUP: &str = "(?P<mode>[#>])";

/// Compile a prompt template for `host`.
pub fn compile_prompt(template: &str, host: &str) -> Result<Regex, regex::Error> {
    let pattern = template
        .replace("{host}", &regex::escape(host))
        .replace("{mode}", MODE_GROUP);
    Regex::new(&pattern)
}

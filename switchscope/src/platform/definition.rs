//! Platform definition for vendor-specific session configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use super::VendorBehavior;

/// Everything the session layer needs to know about one vendor's shell.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g. "cisco", "ruckus").
    pub name: String,

    /// Prompt template with `{host}` and `{mode}` placeholders and a `cmd`
    /// capture for the echoed command.
    pub prompt_template: String,

    /// Line terminator appended to every command.
    pub terminator: String,

    /// Banner printed when output is paged.
    pub pagination: Option<Regex>,

    /// Output substrings that mark a command as failed.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the shell opens, before any user command.
    pub on_open_commands: Vec<String>,

    /// How long logout waits for the shell to exit before retrying.
    pub logout_grace: Duration,

    /// Optional vendor-specific behavior.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a platform with a prompt template and `"\n"` terminator.
    pub fn new(name: impl Into<String>, prompt_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt_template: prompt_template.into(),
            terminator: "\n".to_string(),
            pagination: None,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            logout_grace: Duration::from_millis(250),
            behavior: None,
        }
    }

    /// Set the line terminator.
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    /// Set the pagination banner.
    pub fn with_pagination(mut self, pattern: Regex) -> Self {
        self.pagination = Some(pattern);
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set how long logout waits for the shell to go away.
    pub fn with_logout_grace(mut self, grace: Duration) -> Self {
        self.logout_grace = grace;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Check whether `line` is the pagination banner.
    pub fn is_pagination(&self, line: &str) -> bool {
        self.pagination.as_ref().is_some_and(|p| p.is_match(line))
    }

    /// First failure marker contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .cloned()
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("prompt_template", &self.prompt_template)
            .field("terminator", &self.terminator)
            .field("pagination", &self.pagination.as_ref().map(Regex::as_str))
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("logout_grace", &self.logout_grace)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_detection() {
        let platform = PlatformDefinition::new("test", r"^{host}{mode}(?P<cmd>.*)")
            .with_failure_pattern("% Invalid input")
            .with_failure_pattern("% Error");

        assert_eq!(
            platform.detect_failure("  ^\r\n% Invalid input detected at '^' marker.\r\n"),
            Some("% Invalid input".to_string())
        );
        assert_eq!(platform.detect_failure("VLAN0010 active"), None);
    }

    #[test]
    fn test_pagination_optional() {
        let platform = PlatformDefinition::new("test", r"^{host}{mode}(?P<cmd>.*)");
        assert!(!platform.is_pagination("--More--"));

        let platform = platform.with_pagination(Regex::new("^--More--").unwrap());
        assert!(platform.is_pagination("--More--"));
        assert!(!platform.is_pagination("output --More--"));
    }
}

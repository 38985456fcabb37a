//! Shell-style wildcards over host names and attribute values.
//!
//! `*` matches any run of characters, `?` matches one, `[abc]` and `[a-z]`
//! match one of a set and `[!abc]` one outside it. Everything else is
//! literal. A `[` with no closing `]` is literal too.

use regex::{Regex, RegexBuilder};

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    /// Compile a case-sensitive pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, false)
    }

    /// Compile a pattern that ignores ASCII and Unicode case.
    pub fn case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&translate(pattern))
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Whether the whole of `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// True when the pattern has no wildcards and can only match itself.
    pub fn is_literal(&self) -> bool {
        !self.pattern.contains(['*', '?', '['])
    }
}

/// Translate a wildcard pattern into an anchored regex.
pub fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push_str(".*");
                i += 1;
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            '[' => match class(&chars[i + 1..]) {
                Some((set, consumed)) => {
                    out.push_str(&set);
                    i += consumed + 1;
                }
                None => {
                    out.push_str(r"\[");
                    i += 1;
                }
            },
            c => {
                out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                i += 1;
            }
        }
    }
    out.push('$');
    out
}

/// Parse a bracket expression body (after `[`). Returns the regex class
/// and how many characters it used, including the closing `]`.
fn class(rest: &[char]) -> Option<(String, usize)> {
    let mut j = 0;
    let negated = matches!(rest.first(), Some('!'));
    if negated {
        j += 1;
    }
    // A `]` right after the opening bracket is a member, not the end.
    if rest.get(j) == Some(&']') {
        j += 1;
    }
    let close = j + rest[j.min(rest.len())..].iter().position(|&c| c == ']')?;
    let body = &rest[usize::from(negated)..close];

    let mut set = String::from(if negated { "[^" } else { "[" });
    for &c in body {
        match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => {
                set.push('\\');
                set.push(c);
            }
            _ => set.push(c),
        }
    }
    set.push(']');
    Some((set, close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        Glob::new(pattern).unwrap().is_match(text)
    }

    #[test]
    fn test_star_and_question() {
        assert!(matches("switch-*", "switch-b34-01"));
        assert!(!matches("switch-*", "digi-b34-01"));
        assert!(matches("cam-0?", "cam-07"));
        assert!(!matches("cam-0?", "cam-070"));
        assert!(matches("*", ""));
    }

    #[test]
    fn test_classes() {
        assert!(matches("cam-[0-4]", "cam-3"));
        assert!(!matches("cam-[0-4]", "cam-7"));
        assert!(matches("cam-[!0-4]", "cam-7"));
        assert!(matches("x[]]y", "x]y"));
    }

    #[test]
    fn test_literals_are_escaped() {
        assert!(matches("daq.pcdsn", "daq.pcdsn"));
        assert!(!matches("daq.pcdsn", "daqxpcdsn"));
        assert!(matches("a[b", "a[b"));
        assert!(matches("(lab)+", "(lab)+"));
    }

    #[test]
    fn test_case() {
        assert!(!matches("Ruckus*", "ruckus icx7150"));
        assert!(
            Glob::case_insensitive("*RUCKUS*")
                .unwrap()
                .is_match("Ruckus ICX7150-48P")
        );
        assert!(Glob::new("sw1").unwrap().is_literal());
        assert!(!Glob::new("sw*").unwrap().is_literal());
    }
}

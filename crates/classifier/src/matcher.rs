//! Pluggable matcher capability.
//!
//! Rules never call a regex engine directly: they hold a `Box<dyn Matcher>`.
//! The built-in tables compile to [`RegexMatcher`] (backed by `fancy-regex`,
//! which needs look-around for the "bare" parity rules), but a catalog can be
//! assembled from any implementation.

use fancy_regex::Regex;

/// A matcher failed to run to completion (e.g. backtrack limit hit).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MatcherError(pub String);

/// A compiled textual test applied to a whole snippet.
///
/// # Implementation Notes
/// - Called once per eligible rule per snippet; never per occurrence
/// - Must be deterministic: same haystack, same answer
/// - Must be `Send + Sync`; catalogs are shared across tasks
///
/// # Example
/// ```
/// use classifier::matcher::{Matcher, MatcherError};
///
/// struct Contains(&'static str);
///
/// impl Matcher for Contains {
///     fn is_match(&self, haystack: &str) -> Result<bool, MatcherError> {
///         Ok(haystack.contains(self.0))
///     }
///
///     fn pattern(&self) -> &str {
///         self.0
///     }
/// }
///
/// assert!(Contains("% 2").is_match("n % 2 == 0").unwrap());
/// ```
pub trait Matcher: Send + Sync {
    /// Returns `true` if the pattern occurs anywhere in `haystack`.
    fn is_match(&self, haystack: &str) -> Result<bool, MatcherError>;

    /// Source text of the pattern, for diagnostics.
    fn pattern(&self) -> &str;
}

/// Line-handling flags applied when compiling a regex rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// `^`/`$` match at line boundaries.
    pub multi_line: bool,
    /// `.` also matches `\n`.
    pub dot_all: bool,
}

impl Flags {
    /// Plain matching, no inline flags.
    pub const NONE: Flags = Flags {
        multi_line: false,
        dot_all: false,
    };
    /// Multi-line only (language indicators).
    pub const MULTI_LINE: Flags = Flags {
        multi_line: true,
        dot_all: false,
    };
    /// Multi-line + dot-matches-newline (full catalog).
    pub const WHOLE_TEXT: Flags = Flags {
        multi_line: true,
        dot_all: true,
    };

    fn prefix(self) -> &'static str {
        match (self.multi_line, self.dot_all) {
            (true, true) => "(?ms)",
            (true, false) => "(?m)",
            (false, true) => "(?s)",
            (false, false) => "",
        }
    }
}

/// `fancy-regex` backed matcher.
///
/// Patterns without look-around are delegated to the linear-time `regex`
/// engine by `fancy-regex` itself.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    source: String,
    regex: Regex,
}

impl RegexMatcher {
    /// Compiles `pattern` with the given flags.
    pub fn compile(pattern: &str, flags: Flags) -> Result<Self, Box<fancy_regex::Error>> {
        let regex = Regex::new(&format!("{}{}", flags.prefix(), pattern)).map_err(Box::new)?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }
}

impl Matcher for RegexMatcher {
    fn is_match(&self, haystack: &str) -> Result<bool, MatcherError> {
        self.regex
            .is_match(haystack)
            .map_err(|e| MatcherError(e.to_string()))
    }

    fn pattern(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookahead_supported() {
        let m = RegexMatcher::compile(r"\w+\s*%\s*2(?!\s*[=!])", Flags::WHOLE_TEXT).unwrap();
        assert!(m.is_match("x = n % 2").unwrap());
        assert!(!m.is_match("n % 2 == 0").unwrap());
    }

    #[test]
    fn test_dot_all_crosses_lines() {
        let plain = RegexMatcher::compile(r"a.b", Flags::NONE).unwrap();
        let whole = RegexMatcher::compile(r"a.b", Flags::WHOLE_TEXT).unwrap();
        assert!(!plain.is_match("a\nb").unwrap());
        assert!(whole.is_match("a\nb").unwrap());
    }

    #[test]
    fn test_multi_line_anchor() {
        let m = RegexMatcher::compile(r":\s*$", Flags::MULTI_LINE).unwrap();
        assert!(m.is_match("def f(n):\n    pass").unwrap());
        assert!(!m.is_match("x: int = 3").unwrap());
    }

    #[test]
    fn test_pattern_keeps_source_text() {
        let m = RegexMatcher::compile(r"&\s*1", Flags::WHOLE_TEXT).unwrap();
        assert_eq!(m.pattern(), r"&\s*1");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(RegexMatcher::compile(r"(unclosed", Flags::NONE).is_err());
    }
}

//! Language sniffer: python-like vs c/c++-like, by indicator votes.
//!
//! Each dialect has its own list of lightweight indicators. A dialect's score is
//! the number of *distinct* indicators present at least once; repeating one
//! indicator does not add votes.

use common::Language;

use crate::matcher::{Flags, Matcher, RegexMatcher};
use crate::ClassifierError;

static PYTHON_INDICATORS: &[&str] = &[
    r"\bdef\s+",
    r"\bimport\s+",
    r"\bfrom\s+\w+\s+import\b",
    r"\bprint\s*\(",
    r":\s*$",
];

static CPP_INDICATORS: &[&str] = &[
    r"#include\s*<",
    r"\b(?:int|void)\s+main\s*\(",
    r"\b(?:void|int|char|float|double)\s+\w+\s*\(",
    r"#define\s+",
    r"\bstd::",
    r"cout\s*<<",
];

/// Heuristic dialect detector.
#[derive(Debug)]
pub struct LanguageSniffer {
    python: Vec<RegexMatcher>,
    cpp: Vec<RegexMatcher>,
}

impl LanguageSniffer {
    /// Compiles the built-in indicator lists.
    pub fn new() -> Result<Self, ClassifierError> {
        Ok(Self {
            python: compile_indicators("python", PYTHON_INDICATORS)?,
            cpp: compile_indicators("c/c++", CPP_INDICATORS)?,
        })
    }

    /// Labels `snippet` with the dialect holding strictly more distinct
    /// indicators. Ties and zero votes are [`Language::Unknown`].
    ///
    /// # Examples
    /// ```
    /// # use classifier::language::LanguageSniffer;
    /// # use common::Language;
    /// let sniffer = LanguageSniffer::new().unwrap();
    /// assert_eq!(sniffer.detect("import os\ndef f(n):\n    pass"), Language::Python);
    /// assert_eq!(sniffer.detect("#include <stdio.h>\nint main() {}"), Language::Cpp);
    /// assert_eq!(sniffer.detect(""), Language::Unknown);
    /// ```
    pub fn detect(&self, snippet: &str) -> Language {
        let python = votes(&self.python, snippet);
        let cpp = votes(&self.cpp, snippet);

        if python > cpp {
            Language::Python
        } else if cpp > python {
            Language::Cpp
        } else {
            Language::Unknown
        }
    }
}

fn compile_indicators(
    dialect: &str,
    patterns: &[&str],
) -> Result<Vec<RegexMatcher>, ClassifierError> {
    patterns
        .iter()
        .map(|p| {
            RegexMatcher::compile(p, Flags::MULTI_LINE).map_err(|source| {
                ClassifierError::InvalidPattern {
                    rule: format!("{dialect} indicator `{p}`"),
                    source,
                }
            })
        })
        .collect()
}

/// Distinct indicators present. A matcher error counts as absent.
fn votes(indicators: &[RegexMatcher], snippet: &str) -> usize {
    indicators
        .iter()
        .filter(|m| m.is_match(snippet).unwrap_or(false))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sniff(s: &str) -> Language {
        LanguageSniffer::new().unwrap().detect(s)
    }

    #[test]
    fn test_python_snippet() {
        let src = "from math import floor\n\ndef is_even(n):\n    return n % 2 == 0\n";
        assert_eq!(sniff(src), Language::Python);
    }

    #[test]
    fn test_cpp_snippet() {
        let src = "#include <iostream>\nint main() {\n    std::cout << 1;\n}\n";
        assert_eq!(sniff(src), Language::Cpp);
    }

    #[test]
    fn test_empty_and_prose_are_unknown() {
        assert_eq!(sniff(""), Language::Unknown);
        assert_eq!(sniff("the quick brown fox"), Language::Unknown);
        assert_eq!(sniff("\u{0}\u{1}\u{2}binary"), Language::Unknown);
    }

    #[test]
    fn test_tie_is_unknown() {
        // One python indicator (`print(`) against one c/c++ indicator (`std::`).
        assert_eq!(sniff("print(std::endl)"), Language::Unknown);
    }

    #[test]
    fn test_repeated_indicator_counts_once() {
        // Three `#define`s are still one vote; `import` + `print(` are two.
        let src = "#define A 1\n#define B 2\n#define C 3\nimport x\nprint(x)";
        assert_eq!(sniff(src), Language::Python);
    }

    #[test]
    fn test_parity_one_liner_is_unknown() {
        assert_eq!(sniff("if n % 2 == 0: return True"), Language::Unknown);
    }
}

//! # Classifier: parity-construct detection for snippets
//!
//! **Role**: turns an arbitrary text snippet into a [`ClassificationResult`]
//! that the pet can eat.
//!
//! **Pipeline**:
//! 1. Size gate. Snippets over [`LARGE_INPUT_THRESHOLD`] bytes run only the
//!    coarse rule set ([`Method::Degraded`]). The input is never truncated; the
//!    rule set shrinks instead.
//! 2. Sniff the dialect once ([`LanguageSniffer`]).
//! 3. Walk the catalog in order. A rule runs if its affinity admits the
//!    detected language and its anchor is present; a hit counts once no matter
//!    how often the construct repeats.
//!
//! Detection is deliberately shallow: regexes over raw text, no parsing.

pub mod catalog;
pub mod language;
pub mod matcher;

pub use catalog::{Catalog, Rule, RuleSpec, COARSE_RULES, LARGE_INPUT_THRESHOLD, PARITY_RULES};
pub use language::LanguageSniffer;
pub use matcher::{Flags, Matcher, MatcherError, RegexMatcher};

use common::{ClassificationResult, Language, Method};

/// Errors raised while building a classifier. Evaluation itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("rule `{rule}` has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error("anchor automaton build failed: {0}")]
    Anchors(#[from] aho_corasick::BuildError),
}

/// Immutable classifier: full catalog, coarse catalog, sniffer.
///
/// Build once and share (`Arc<Classifier>`); `analyze` takes `&self`.
#[derive(Debug)]
pub struct Classifier {
    full: Catalog,
    coarse: Catalog,
    sniffer: LanguageSniffer,
    threshold: usize,
}

impl Classifier {
    /// Compiles the built-in tables.
    pub fn new() -> Result<Self, ClassifierError> {
        Ok(Self::from_parts(
            Catalog::parity()?,
            Catalog::coarse()?,
            LanguageSniffer::new()?,
        ))
    }

    /// Assembles a classifier from custom catalogs (any [`Matcher`] engine).
    pub fn from_parts(full: Catalog, coarse: Catalog, sniffer: LanguageSniffer) -> Self {
        Self {
            full,
            coarse,
            sniffer,
            threshold: LARGE_INPUT_THRESHOLD,
        }
    }

    /// Overrides the degraded-path size threshold (bytes).
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn full_catalog(&self) -> &Catalog {
        &self.full
    }

    pub fn coarse_catalog(&self) -> &Catalog {
        &self.coarse
    }

    /// Runs only the language sniffer.
    pub fn detect_language(&self, snippet: &str) -> Language {
        self.sniffer.detect(snippet)
    }

    /// Classifies `snippet`.
    ///
    /// # Examples
    /// ```
    /// # use classifier::Classifier;
    /// # use common::Method;
    /// let classifier = Classifier::new().unwrap();
    /// let result = classifier.analyze("if n % 2 == 0: return True");
    /// assert!(result.matched);
    /// assert_eq!(result.method, Method::Full);
    /// assert_eq!(result.rules, vec!["modulo_even"]);
    /// ```
    pub fn analyze(&self, snippet: &str) -> ClassificationResult {
        let size = snippet.len();
        if size > self.threshold {
            return self.analyze_degraded(snippet);
        }

        let language = self.sniffer.detect(snippet);
        let present = self.full.present_anchors(snippet);

        let mut score = 0u32;
        let mut rules = Vec::new();
        for rule in self.full.rules() {
            if !rule.affinity.admits(language) {
                continue;
            }
            if !rule.anchor.is_empty() && !present.contains(rule.anchor.as_str()) {
                continue;
            }
            if evaluate(rule, snippet) {
                score += rule.weight;
                rules.push(rule.name.clone());
            }
        }

        tracing::debug!(
            %language,
            size,
            score,
            rules = ?rules,
            "classified snippet"
        );

        ClassificationResult {
            matched: !rules.is_empty(),
            score,
            rules,
            method: Method::Full,
            language: Some(language),
            size,
        }
    }

    fn analyze_degraded(&self, snippet: &str) -> ClassificationResult {
        let size = snippet.len();
        let mut score = 0u32;
        let mut rules = Vec::new();
        for rule in self.coarse.rules() {
            if evaluate(rule, snippet) {
                score += rule.weight;
                rules.push(rule.name.clone());
            }
        }

        tracing::debug!(size, score, "classified oversized snippet on the coarse rule set");

        ClassificationResult {
            matched: !rules.is_empty(),
            score,
            rules,
            method: Method::Degraded,
            language: None,
            size,
        }
    }
}

/// Runs one rule. A matcher failure is a miss.
fn evaluate(rule: &Rule, snippet: &str) -> bool {
    match rule.matcher.is_match(snippet) {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(rule = %rule.name, error = %e, "matcher failed; counting as miss");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Affinity;

    fn classifier() -> Classifier {
        Classifier::new().unwrap()
    }

    #[test]
    fn test_simple_modulo_matches() {
        let r = classifier().analyze("if n % 2 == 0: return True");
        assert!(r.matched);
        assert_eq!(r.score, 1);
        assert_eq!(r.rules, vec!["modulo_even"]);
        assert_eq!(r.method, Method::Full);
        assert_eq!(r.language, Some(Language::Unknown));
        assert_eq!(r.size, 26);
    }

    #[test]
    fn test_no_parity_no_match() {
        let r = classifier().analyze("print('hello world')");
        assert!(!r.matched);
        assert_eq!(r.score, 0);
        assert!(r.rules.is_empty());
        assert_eq!(r.language, Some(Language::Python));
    }

    #[test]
    fn test_empty_snippet() {
        let r = classifier().analyze("");
        assert!(!r.matched);
        assert_eq!(r.size, 0);
        assert_eq!(r.language, Some(Language::Unknown));
    }

    #[test]
    fn test_python_bitwise_not() {
        let r = classifier().analyze("def f(n):\n    return not (n & 1)\n");
        assert_eq!(r.language, Some(Language::Python));
        assert_eq!(
            r.rules,
            vec!["bitwise_and_bare", "bitwise_parentheses", "bitwise_not_python"]
        );
        assert_eq!(r.score, 3);
    }

    #[test]
    fn test_c_predicate_function() {
        let src = "#include <stdio.h>\nint is_even(int n) { return n % 2 == 0; }\n";
        let r = classifier().analyze(src);
        assert_eq!(r.language, Some(Language::Cpp));
        assert_eq!(r.rules, vec!["modulo_even", "function_parity_c"]);
    }

    #[test]
    fn test_language_filter_skips_foreign_rules() {
        let src = "#include <vector>\n#define IS_EVEN(x) ((x) % 2 == 0)\n// lambda x: x & 1\n";
        let r = classifier().analyze(src);
        assert_eq!(r.language, Some(Language::Cpp));
        assert!(r.rules.iter().any(|n| n == "macro_parity"));
        assert!(!r.rules.iter().any(|n| n == "lambda_bitwise"));
    }

    #[test]
    fn test_unknown_language_admits_every_rule() {
        // No indicators at all, yet a python-only rule still fires.
        let r = classifier().analyze("f = lambda x: x & 1");
        assert_eq!(r.language, Some(Language::Unknown));
        assert!(r.rules.iter().any(|n| n == "lambda_bitwise"));
    }

    #[test]
    fn test_string_digit_check() {
        let r = classifier().analyze("def even(n):\n    return str(n)[-1] in '02468'\n");
        assert!(r.rules.iter().any(|n| n == "string_even_check"));
        assert!(!r.rules.iter().any(|n| n == "string_odd_check"));
    }

    #[test]
    fn test_loop_decrement() {
        let r = classifier().analyze("while n > 0: n -= 2");
        assert_eq!(r.rules, vec!["loop_decrement_while"]);
    }

    #[test]
    fn test_recursion_spans_lines() {
        let src = "def is_even(n):\n    if n == 0:\n        return True\n    return is_even(n - 2)\n";
        let r = classifier().analyze(src);
        assert!(r.rules.iter().any(|n| n == "recursion_parity"));
    }

    #[test]
    fn test_repetition_counts_once() {
        let c = classifier();
        let once = c.analyze("x % 2 == 0");
        let many = c.analyze(&vec!["x % 2 == 0"; 50].join("\n"));
        assert_eq!(once.score, many.score);
        assert_eq!(once.rules, many.rules);
    }

    #[test]
    fn test_bare_rules_survive_long_identifiers() {
        let c = classifier();
        for n in [1_000, 3_000, 10_000] {
            let src = format!("{} x % 2", "a".repeat(n));
            assert!(src.len() <= LARGE_INPUT_THRESHOLD);
            let r = c.analyze(&src);
            assert_eq!(r.method, Method::Full);
            assert_eq!(r.rules, vec!["modulo_bare"], "identifier of {n} chars");

            let src = format!("{}_flag & 1", "b".repeat(n));
            assert_eq!(c.analyze(&src).rules, vec!["bitwise_and_bare"]);
        }
    }

    #[test]
    fn test_deterministic() {
        let c = classifier();
        let src = "evens = [x for x in xs if x % 2 == 0]";
        assert_eq!(c.analyze(src), c.analyze(src));
    }

    #[test]
    fn test_large_input_uses_coarse_rules() {
        let big = "x % 2 == 0\n".repeat(2_000);
        assert!(big.len() > LARGE_INPUT_THRESHOLD);
        let r = classifier().analyze(&big);
        assert_eq!(r.method, Method::Degraded);
        assert!(r.matched);
        assert_eq!(r.score, 1);
        assert_eq!(r.rules, vec!["coarse_modulo_even"]);
        assert_eq!(r.language, None);
        assert_eq!(r.size, big.len());
    }

    #[test]
    fn test_degraded_ignores_language() {
        // Full-catalog-only construct in a python-heavy oversized snippet.
        let mut big = String::from("import os\ndef f(x):\n    return lambda y: y & 1\n");
        big.push_str(&"#".repeat(LARGE_INPUT_THRESHOLD));
        let r = classifier().analyze(&big);
        assert_eq!(r.method, Method::Degraded);
        assert!(!r.matched);
        assert_eq!(r.language, None);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let c = classifier().with_threshold(10);
        assert_eq!(c.analyze("n % 2 == 0").method, Method::Full);
        assert_eq!(c.analyze("n % 2 == 0 ").method, Method::Degraded);
    }

    #[test]
    fn test_custom_matcher_engine() {
        struct Contains(&'static str);
        impl Matcher for Contains {
            fn is_match(&self, haystack: &str) -> Result<bool, MatcherError> {
                Ok(haystack.contains(self.0))
            }
            fn pattern(&self) -> &str {
                self.0
            }
        }
        struct Broken;
        impl Matcher for Broken {
            fn is_match(&self, _haystack: &str) -> Result<bool, MatcherError> {
                Err(MatcherError("backtrack limit".into()))
            }
            fn pattern(&self) -> &str {
                "?"
            }
        }

        let full = Catalog::new(vec![
            Rule {
                name: "broken".into(),
                matcher: Box::new(Broken),
                affinity: Affinity::Any,
                weight: 7,
                anchor: String::new(),
            },
            Rule {
                name: "heavy".into(),
                matcher: Box::new(Contains("even")),
                affinity: Affinity::Any,
                weight: 5,
                anchor: String::new(),
            },
        ])
        .unwrap();
        let c = Classifier::from_parts(
            full,
            Catalog::coarse().unwrap(),
            LanguageSniffer::new().unwrap(),
        );
        let r = c.analyze("is_even");
        assert_eq!(r.rules, vec!["heavy"]);
        assert_eq!(r.score, 5);
    }
}

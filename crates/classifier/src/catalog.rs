//! The rule catalog: every parity construct the pet knows how to taste.
//!
//! Two tables, both compile-time constants:
//!
//! - [`PARITY_RULES`]: the full catalog, evaluated in order on snippets up to
//!   [`LARGE_INPUT_THRESHOLD`] bytes. Each rule carries a language affinity and
//!   a literal anchor.
//! - [`COARSE_RULES`]: three language-agnostic patterns used for oversized input.
//!
//! **Anchors**: every full-catalog rule names one literal that must occur in any
//! text the rule can match. A single Aho-Corasick pass over the snippet finds
//! which anchors are present, and rules whose anchor is absent are skipped
//! before their regex ever runs.

use aho_corasick::AhoCorasick;
use common::{Affinity, Language};
use std::collections::HashSet;

use crate::matcher::{Flags, Matcher, RegexMatcher};
use crate::ClassifierError;

/// Snippets strictly larger than this many bytes take the degraded path.
pub const LARGE_INPUT_THRESHOLD: usize = 10 * 1024;

/// Declarative form of a rule, before compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: &'static str,
    pub pattern: &'static str,
    pub affinity: Affinity,
    pub weight: u32,
    /// Literal required by `pattern`. Empty means "always evaluate".
    pub anchor: &'static str,
}

const fn rule(
    name: &'static str,
    pattern: &'static str,
    affinity: Affinity,
    anchor: &'static str,
) -> RuleSpec {
    RuleSpec {
        name,
        pattern,
        affinity,
        weight: 1,
        anchor,
    }
}

const ANY: Affinity = Affinity::Any;
const PY: Affinity = Affinity::Only(Language::Python);
const CPP: Affinity = Affinity::Only(Language::Cpp);

/// Full catalog, in evaluation (and reporting) order.
pub static PARITY_RULES: &[RuleSpec] = &[
    // Modulo. Look-ahead rules run on the backtracking VM, so they anchor on a
    // single word character instead of `\w+`.
    rule("modulo_even", r"\w+\s*%\s*2\s*==\s*0", ANY, "%"),
    rule("modulo_odd_neq", r"\w+\s*%\s*2\s*!=\s*0", ANY, "%"),
    rule("modulo_odd_eq1", r"\w+\s*%\s*2\s*==\s*1", ANY, "%"),
    rule("modulo_even_neq1", r"\w+\s*%\s*2\s*!=\s*1", ANY, "%"),
    rule("modulo_bare", r"\w\s*%\s*2(?!\s*[=!])", ANY, "%"),
    // Bitwise AND
    rule("bitwise_and_even", r"\w+\s*&\s*1\s*==\s*0", ANY, "&"),
    rule("bitwise_and_odd", r"\w+\s*&\s*1\s*!=\s*0", ANY, "&"),
    rule("bitwise_and_bare", r"\w\s*&\s*1(?!\s*[=!])", ANY, "&"),
    rule("bitwise_parentheses", r"\(\s*\w+\s*&\s*1\s*\)", ANY, "&"),
    rule("bitwise_not_c", r"!\s*\(\s*\w+\s*&\s*1\s*\)", CPP, "&"),
    // Python `not`
    rule("bitwise_not_python", r"not\s+\(\s*\w+\s*&\s*1\s*\)", PY, "not"),
    rule("bitwise_not_python_bare", r"not\s+\w+\s*&\s*1", PY, "not"),
    // Last decimal digit
    rule(
        "string_even_check",
        r#"str\s*\(\s*\w+\s*\)\s*\[\s*-1\s*\]\s+in\s+['"][02468]+['"]"#,
        PY,
        "str",
    ),
    rule(
        "string_odd_check",
        r#"str\s*\(\s*\w+\s*\)\s*\[\s*-1\s*\]\s+in\s+['"][13579]+['"]"#,
        PY,
        "str",
    ),
    // Subtract two until done
    rule(
        "loop_decrement_while",
        r"while\s+\w+\s*>\s*0\s*:?\s*\{?\s*\w+\s*-=\s*2",
        ANY,
        "-=",
    ),
    rule("loop_decrement_alt", r"while\s*\([^)]*>\s*0\)[^}]*-=\s*2", ANY, "-="),
    // Division round trip
    rule("division_int_check", r"\w+\s*//\s*2\s*\*\s*2\s*==\s*\w+", ANY, "//"),
    rule(
        "division_float_check",
        r"\w+\s*/\s*2\s*==\s*int\s*\(\s*\w+\s*/\s*2\s*\)",
        PY,
        "int",
    ),
    // Mutual recursion
    rule(
        "recursion_parity",
        r"def\s+(?:is_?)?(?:even|odd)\s*\([^)]*\)\s*:(?:.*\n)*.*return.*(?:is_?)?(?:even|odd)\s*\([^)]*-\s*2",
        PY,
        "def",
    ),
    // Lambdas
    rule(
        "lambda_modulo",
        r"lambda\s+\w+\s*:\s*\w+\s*%\s*2\s*(?:==|!=)\s*[01]",
        PY,
        "lambda",
    ),
    rule("lambda_bitwise", r"lambda\s+\w+\s*:\s*\w+\s*&\s*1", PY, "lambda"),
    // Preprocessor
    rule(
        "macro_parity",
        r"#define\s+(?:IS_)?(?:EVEN|ODD)\s*\([^)]*\).*(?:%\s*2|&\s*1)",
        CPP,
        "#define",
    ),
    // Ternaries
    rule("ternary_modulo", r"\w+\s*%\s*2\s*==\s*0\s*\?", CPP, "%"),
    rule("ternary_bitwise", r"\w+\s*&\s*1\s*\?", CPP, "&"),
    // Comprehensions
    rule("list_comp_parity", r"\[.*for.*if.*\w+\s*%\s*2", PY, "for"),
    // Dedicated predicate functions
    rule(
        "function_parity_c",
        r"(?:bool|int)\s+(?:is_?)?(?:even|odd)\s*\([^)]*\)\s*\{[^}]*%\s*2",
        CPP,
        "%",
    ),
];

/// Coarse patterns for oversized snippets. No affinity, no anchors.
pub static COARSE_RULES: &[RuleSpec] = &[
    rule("coarse_modulo_even", r"%\s*2\s*==\s*0", ANY, ""),
    rule("coarse_bitwise_even", r"&\s*1\s*==\s*0", ANY, ""),
    rule("coarse_not_bitwise", r"not\s*\(.*\s*&\s*1\)", ANY, ""),
];

/// A compiled rule: `{id, matcher, affinity, weight}` plus its anchor.
pub struct Rule {
    pub name: String,
    pub matcher: Box<dyn Matcher>,
    pub affinity: Affinity,
    pub weight: u32,
    pub anchor: String,
}

impl Rule {
    /// Compiles a table entry into a regex-backed rule.
    pub fn compile(spec: &RuleSpec, flags: Flags) -> Result<Self, ClassifierError> {
        let matcher =
            RegexMatcher::compile(spec.pattern, flags).map_err(|source| {
                ClassifierError::InvalidPattern {
                    rule: spec.name.to_string(),
                    source,
                }
            })?;
        Ok(Self {
            name: spec.name.to_string(),
            matcher: Box::new(matcher),
            affinity: spec.affinity,
            weight: spec.weight,
            anchor: spec.anchor.to_string(),
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.matcher.pattern())
            .field("affinity", &self.affinity)
            .field("weight", &self.weight)
            .field("anchor", &self.anchor)
            .finish()
    }
}

/// Ordered, immutable rule table with an anchor prefilter.
#[derive(Debug)]
pub struct Catalog {
    rules: Vec<Rule>,
    /// Distinct non-empty anchors, indexed by Aho-Corasick pattern id.
    anchors: Vec<String>,
    automaton: Option<AhoCorasick>,
}

impl Catalog {
    /// Validates and indexes a list of rules. Order is preserved.
    ///
    /// # Errors
    /// Empty or duplicate rule names, zero weights, or an automaton build failure.
    pub fn new(rules: Vec<Rule>) -> Result<Self, ClassifierError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if rule.name.trim().is_empty() {
                return Err(ClassifierError::InvalidRule(
                    "rule name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ClassifierError::InvalidRule(format!(
                    "duplicate rule name `{}`",
                    rule.name
                )));
            }
            if rule.weight == 0 {
                return Err(ClassifierError::InvalidRule(format!(
                    "rule `{}` must have a positive weight",
                    rule.name
                )));
            }
        }

        let mut anchors: Vec<String> = Vec::new();
        for rule in &rules {
            if !rule.anchor.is_empty() && !anchors.contains(&rule.anchor) {
                anchors.push(rule.anchor.clone());
            }
        }
        let automaton = if anchors.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&anchors)?)
        };

        Ok(Self {
            rules,
            anchors,
            automaton,
        })
    }

    /// Compiles a static table with the given flags.
    pub fn compile(specs: &[RuleSpec], flags: Flags) -> Result<Self, ClassifierError> {
        let rules = specs
            .iter()
            .map(|spec| Rule::compile(spec, flags))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    /// The full built-in catalog (multi-line, dot-matches-newline).
    pub fn parity() -> Result<Self, ClassifierError> {
        Self::compile(PARITY_RULES, Flags::WHOLE_TEXT)
    }

    /// The built-in coarse set for oversized input.
    pub fn coarse() -> Result<Self, ClassifierError> {
        Self::compile(COARSE_RULES, Flags::NONE)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Anchors that occur at least once in `text`.
    pub fn present_anchors<'a>(&'a self, text: &str) -> HashSet<&'a str> {
        let mut present = HashSet::new();
        if let Some(ac) = &self.automaton {
            for mat in ac.find_overlapping_iter(text) {
                present.insert(self.anchors[mat.pattern().as_usize()].as_str());
                if present.len() == self.anchors.len() {
                    break;
                }
            }
        }
        present
    }
}

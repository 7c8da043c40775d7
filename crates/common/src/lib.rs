//! # Common: shared value types for sys.pet
//!
//! Types that cross crate boundaries: the classifier produces
//! [`ClassificationResult`], the pet consumes it and reports [`PetStatus`].
//! Everything here is plain data with `serde` derives so the CLI can print it
//! as JSON without a second set of wire types.

pub mod snapshot;

pub use snapshot::{FeedOutcome, HealthReport, PetSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source dialect reported by the language sniffer.
///
/// The set is closed on purpose: anything that does not clearly lean one way
/// is `Unknown`, and `Unknown` makes every rule eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Language {
    /// Python-like: `def`, `import`, trailing colons.
    Python = 0,
    /// C/C++-like: `#include`, `#define`, `std::`.
    #[serde(rename = "c/c++")]
    Cpp = 1,
    /// Neither dialect won (tie or no indicators at all).
    Unknown = 2,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "c/c++",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language a rule is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    /// Applies regardless of the detected language.
    Any,
    /// Applies only when the snippet was not detected as another dialect.
    Only(Language),
}

impl Affinity {
    /// Whether a rule with this affinity runs against a snippet sniffed as `detected`.
    ///
    /// `Unknown` is permissive: every rule is eligible.
    ///
    /// # Examples
    /// ```
    /// # use common::{Affinity, Language};
    /// assert!(Affinity::Any.admits(Language::Cpp));
    /// assert!(Affinity::Only(Language::Python).admits(Language::Unknown));
    /// assert!(!Affinity::Only(Language::Python).admits(Language::Cpp));
    /// ```
    pub fn admits(self, detected: Language) -> bool {
        match self {
            Affinity::Any => true,
            Affinity::Only(lang) => detected == Language::Unknown || lang == detected,
        }
    }
}

/// Which rule set produced a [`ClassificationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Whole catalog, filtered by detected language.
    Full,
    /// Input over the size threshold: coarse language-agnostic patterns only.
    Degraded,
}

/// Outcome of classifying one snippet.
///
/// Built fresh per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// At least one rule was counted.
    pub matched: bool,
    /// Sum of the weights of counted rules.
    pub score: u32,
    /// Names of counted rules, in catalog order.
    pub rules: Vec<String>,
    pub method: Method,
    /// Detected dialect. `None` on the degraded path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Input length in bytes.
    pub size: usize,
}

impl ClassificationResult {
    /// Number of distinct rules that fired.
    pub fn match_count(&self) -> usize {
        self.rules.len()
    }
}

/// Derived pet status. Never stored; recomputed from the stats on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetStatus {
    Dead,
    Evolving,
    Hungry,
    Tired,
    Happy,
}

impl PetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PetStatus::Dead => "dead",
            PetStatus::Evolving => "evolving",
            PetStatus::Hungry => "hungry",
            PetStatus::Tired => "tired",
            PetStatus::Happy => "happy",
        }
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

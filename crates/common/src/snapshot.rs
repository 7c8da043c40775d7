//! Read-only views handed to the transport boundary.

use crate::{ClassificationResult, PetStatus};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of every pet field, with reals rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSnapshot {
    pub name: String,
    pub sanity: f64,
    pub hunger: f64,
    pub fatigue: f64,
    pub happiness: f64,
    pub weight: f64,
    pub course: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub skin: String,
    pub status_message: String,
    pub status: PetStatus,
    pub total_xp: u64,
    pub code_fed: u64,
}

/// Everything `feed` reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedOutcome {
    pub success: bool,
    pub message: String,
    /// Hunger points actually restored (after clamping).
    pub restored: f64,
    pub match_count: usize,
    pub analysis: ClassificationResult,
    pub pet: PetSnapshot,
}

/// Liveness probe answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub pet_alive: bool,
}

/// Rounds to one decimal place, the precision snapshots are reported at.
///
/// # Examples
/// ```
/// # use common::snapshot::round1;
/// assert_eq!(round1(12.345), 12.3);
/// assert_eq!(round1(99.96), 100.0);
/// ```
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

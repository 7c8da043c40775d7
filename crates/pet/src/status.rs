//! Status derivation. Pure: no state, no clock.

use common::PetStatus;

use crate::tuning::{HUNGRY_BELOW, TIRED_ABOVE, XP_TO_NEXT_COURSE};

/// Inputs the status depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub sanity: f64,
    pub xp: u32,
    pub hunger: f64,
    pub fatigue: f64,
}

/// First matching state wins: dead, evolving, hungry, tired, happy.
///
/// # Examples
/// ```
/// # use pet::status::{derive, Vitals};
/// # use common::PetStatus;
/// let v = Vitals { sanity: 0.0, xp: 150, hunger: 5.0, fatigue: 95.0 };
/// assert_eq!(derive(v), PetStatus::Dead);
/// ```
pub fn derive(v: Vitals) -> PetStatus {
    if v.sanity <= 0.0 {
        PetStatus::Dead
    } else if v.xp >= XP_TO_NEXT_COURSE {
        PetStatus::Evolving
    } else if v.hunger < HUNGRY_BELOW {
        PetStatus::Hungry
    } else if v.fatigue > TIRED_ABOVE {
        PetStatus::Tired
    } else {
        PetStatus::Happy
    }
}

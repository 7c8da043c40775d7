//! Game balance constants. Every bounded stat lives in `[STAT_MIN, STAT_MAX]`.

use std::time::Duration;

pub const STAT_MIN: f64 = 0.0;
pub const STAT_MAX: f64 = 100.0;

/// XP needed to move to the next course.
pub const XP_TO_NEXT_COURSE: u32 = 100;

// --- Construction defaults ---

pub const DEFAULT_NAME: &str = "sys.pet";
pub const DEFAULT_SANITY: f64 = 100.0;
pub const DEFAULT_HUNGER: f64 = 20.0;
pub const DEFAULT_FATIGUE: f64 = 0.0;
pub const DEFAULT_HAPPINESS: f64 = 80.0;
pub const DEFAULT_WEIGHT: f64 = 50.0;
pub const DEFAULT_MESSAGE: &str = "Waiting for code...";

// --- Status thresholds ---

pub const HUNGRY_BELOW: f64 = 20.0;
pub const TIRED_ABOVE: f64 = 80.0;

// --- Feeding ---

/// Hunger restored per distinct rule counted in a snippet.
pub const HUNGER_PER_RULE: f64 = 20.0;
pub const FEED_HAPPINESS_BONUS: f64 = 15.0;
pub const BAD_FOOD_SANITY_PENALTY: f64 = 10.0;
pub const BAD_FOOD_HAPPINESS_PENALTY: f64 = 10.0;

// --- Tick ---

/// Ticks closer together than this are no-ops.
pub const TICK_MIN_INTERVAL: Duration = Duration::from_secs(1);
/// Fatigue gained per tick at 100% CPU (scaled linearly).
pub const FATIGUE_PER_TICK_AT_FULL_CPU: f64 = 5.0;
pub const TIRED_HAPPINESS_DRAIN: f64 = 1.0;
pub const TIRED_HUNGER_DRAIN: f64 = 1.0;
pub const STARVING_BELOW: f64 = 10.0;
pub const STARVATION_SANITY_DRAIN: f64 = 2.0;
pub const CONTENT_ABOVE: f64 = 70.0;
pub const CONTENT_SANITY_RECOVERY: f64 = 0.5;

pub const HUNGER_DECAY: f64 = 2.0;
pub const HUNGER_DECAY_INTERVAL: Duration = Duration::from_secs(10);
pub const HAPPINESS_DECAY: f64 = 1.0;
pub const HAPPINESS_DECAY_INTERVAL: Duration = Duration::from_secs(30);
/// While fatigue is saturated, one XP per interval.
pub const XP_GRANT_INTERVAL: Duration = Duration::from_secs(5);

// --- Evolution ---

pub const EVOLVE_SANITY_BONUS: f64 = 10.0;
pub const EVOLVE_HAPPINESS_BONUS: f64 = 20.0;

/// Skin per course; anything past the table is [`MAX_SKIN`].
pub static SKINS: &[(u32, &str)] = &[
    (1, "👶"),
    (2, "🧒"),
    (3, "👦"),
    (4, "👨"),
    (5, "💻"),
    (6, "🤖"),
];
pub const MAX_SKIN: &str = "🌟";

// --- Actions ---

pub const REST_FATIGUE_RELIEF: f64 = 30.0;
pub const REST_HUNGER_COST: f64 = 10.0;
pub const PET_HAPPINESS_BONUS: f64 = 5.0;
pub const KILL_SANITY_REWARD: f64 = 5.0;

/// Skin for a given course.
///
/// # Examples
/// ```
/// # use pet::tuning::skin_for;
/// assert_eq!(skin_for(1), "👶");
/// assert_eq!(skin_for(6), "🤖");
/// assert_eq!(skin_for(42), "🌟");
/// ```
pub fn skin_for(course: u32) -> &'static str {
    SKINS
        .iter()
        .find(|(c, _)| *c == course)
        .map(|(_, s)| *s)
        .unwrap_or(MAX_SKIN)
}

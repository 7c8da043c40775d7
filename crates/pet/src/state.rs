//! The pet itself: bounded stats, progress, display fields and cadence gates.
//!
//! `PetState` is a single-writer structure. It takes `&mut self` for every
//! mutation and reads time only through the `now` arguments it is given, so
//! all scheduling policy stays with the caller.

use std::sync::Arc;
use std::time::Instant;

use classifier::Classifier;
use common::snapshot::round1;
use common::{FeedOutcome, PetSnapshot, PetStatus};

use crate::metrics::{MetricsError, SystemSample};
use crate::status::{self, Vitals};
use crate::tuning::*;

/// Clamps a stat into `[STAT_MIN, STAT_MAX]`.
fn bounded(value: f64) -> f64 {
    value.clamp(STAT_MIN, STAT_MAX)
}

/// What a `tick` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Called before `TICK_MIN_INTERVAL` elapsed; nothing changed.
    Throttled,
    Ran(TickReport),
}

/// Sub-steps of an applied tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Metrics were read and applied. `false` means the read failed.
    pub metrics_applied: bool,
    pub hunger_decayed: bool,
    pub happiness_decayed: bool,
    pub xp_granted: bool,
    pub evolved: bool,
}

pub struct PetState {
    classifier: Arc<Classifier>,
    pub(crate) name: String,

    pub(crate) sanity: f64,
    pub(crate) hunger: f64,
    pub(crate) fatigue: f64,
    pub(crate) happiness: f64,
    pub(crate) weight: f64,

    pub(crate) course: u32,
    pub(crate) xp: u32,

    pub(crate) skin: &'static str,
    pub(crate) status_message: String,

    pub(crate) total_xp: u64,
    pub(crate) code_fed: u64,

    pub(crate) last_update: Instant,
    pub(crate) last_hunger_decay: Instant,
    pub(crate) last_happiness_decay: Instant,
    pub(crate) last_xp_grant: Instant,
}

impl std::fmt::Debug for PetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetState")
            .field("name", &self.name)
            .field("sanity", &self.sanity)
            .field("hunger", &self.hunger)
            .field("fatigue", &self.fatigue)
            .field("happiness", &self.happiness)
            .field("weight", &self.weight)
            .field("course", &self.course)
            .field("xp", &self.xp)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl PetState {
    /// A fresh pet with default stats; every cadence gate starts at `now`.
    pub fn new(name: impl Into<String>, classifier: Arc<Classifier>, now: Instant) -> Self {
        Self {
            classifier,
            name: name.into(),
            sanity: DEFAULT_SANITY,
            hunger: DEFAULT_HUNGER,
            fatigue: DEFAULT_FATIGUE,
            happiness: DEFAULT_HAPPINESS,
            weight: DEFAULT_WEIGHT,
            course: 1,
            xp: 0,
            skin: skin_for(1),
            status_message: DEFAULT_MESSAGE.to_string(),
            total_xp: 0,
            code_fed: 0,
            last_update: now,
            last_hunger_decay: now,
            last_happiness_decay: now,
            last_xp_grant: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sanity(&self) -> f64 {
        self.sanity
    }

    pub fn hunger(&self) -> f64 {
        self.hunger
    }

    pub fn fatigue(&self) -> f64 {
        self.fatigue
    }

    pub fn happiness(&self) -> f64 {
        self.happiness
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn course(&self) -> u32 {
        self.course
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn skin(&self) -> &str {
        self.skin
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn code_fed(&self) -> u64 {
        self.code_fed
    }

    pub fn is_alive(&self) -> bool {
        self.status() != PetStatus::Dead
    }

    /// Recomputed on every call.
    pub fn status(&self) -> PetStatus {
        status::derive(Vitals {
            sanity: self.sanity,
            xp: self.xp,
            hunger: self.hunger,
            fatigue: self.fatigue,
        })
    }

    pub fn snapshot(&self) -> PetSnapshot {
        PetSnapshot {
            name: self.name.clone(),
            sanity: round1(self.sanity),
            hunger: round1(self.hunger),
            fatigue: round1(self.fatigue),
            happiness: round1(self.happiness),
            weight: round1(self.weight),
            course: self.course,
            xp: self.xp,
            xp_to_next: XP_TO_NEXT_COURSE,
            skin: self.skin.to_string(),
            status_message: self.status_message.clone(),
            status: self.status(),
            total_xp: self.total_xp,
            code_fed: self.code_fed,
        }
    }

    // -----------------------------------------------------------------------
    // Feeding
    // -----------------------------------------------------------------------

    /// Classifies `snippet` and eats it.
    ///
    /// Tasty code restores hunger (per distinct construct) and cheers the pet
    /// up. Anything else costs sanity and happiness. Feeding never grants XP.
    pub fn feed(&mut self, snippet: &str) -> FeedOutcome {
        let analysis = self.classifier.analyze(snippet);
        let match_count = analysis.match_count();

        if analysis.matched {
            let before = self.hunger;
            self.hunger = bounded(self.hunger + match_count as f64 * HUNGER_PER_RULE);
            let restored = self.hunger - before;
            self.happiness = bounded(self.happiness + FEED_HAPPINESS_BONUS);
            self.code_fed += 1;
            self.status_message = "Yum, tasty! 😋".to_string();

            tracing::info!(
                rules = match_count,
                restored,
                hunger = self.hunger,
                "pet ate a parity check"
            );

            FeedOutcome {
                success: true,
                message: format!("The pet ate the code! +{} hunger", round1(restored)),
                restored,
                match_count,
                analysis,
                pet: self.snapshot(),
            }
        } else {
            self.sanity = bounded(self.sanity - BAD_FOOD_SANITY_PENALTY);
            self.happiness = bounded(self.happiness - BAD_FOOD_HAPPINESS_PENALTY);
            self.status_message = "Yuck, that's not it... 😢".to_string();

            tracing::info!(sanity = self.sanity, "pet rejected a snippet");

            FeedOutcome {
                success: false,
                message: "The pet didn't understand this code...".to_string(),
                restored: 0.0,
                match_count,
                analysis,
                pet: self.snapshot(),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Whether a tick at `now` would run (not throttled).
    pub fn is_tick_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_update) >= TICK_MIN_INTERVAL
    }

    /// Periodic update.
    ///
    /// The metric-driven step runs only on `Ok`; the decay and XP cadences run
    /// either way, each behind its own timestamp gate.
    pub fn tick(
        &mut self,
        now: Instant,
        sample: Result<SystemSample, MetricsError>,
    ) -> TickOutcome {
        if !self.is_tick_due(now) {
            return TickOutcome::Throttled;
        }
        self.last_update = now;

        let mut report = TickReport::default();

        match sample.and_then(SystemSample::validated) {
            Ok(sample) => {
                self.apply_metrics(&sample);
                report.metrics_applied = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping metric-driven update");
                self.status_message = format!("System error: {}", truncate(&e.to_string(), 40));
            }
        }

        if now.saturating_duration_since(self.last_hunger_decay) >= HUNGER_DECAY_INTERVAL {
            self.hunger = bounded(self.hunger - HUNGER_DECAY);
            self.last_hunger_decay = now;
            report.hunger_decayed = true;
        }

        if now.saturating_duration_since(self.last_happiness_decay) >= HAPPINESS_DECAY_INTERVAL {
            self.happiness = bounded(self.happiness - HAPPINESS_DECAY);
            self.last_happiness_decay = now;
            report.happiness_decayed = true;
        }

        if self.fatigue >= STAT_MAX {
            if now.saturating_duration_since(self.last_xp_grant) >= XP_GRANT_INTERVAL {
                self.xp = self.xp.saturating_add(1);
                self.total_xp += 1;
                self.last_xp_grant = now;
                report.xp_granted = true;
                report.evolved = self.evolve();
            }
        } else {
            // The grant interval restarts whenever saturation is lost.
            self.last_xp_grant = now;
        }

        TickOutcome::Ran(report)
    }

    fn apply_metrics(&mut self, sample: &SystemSample) {
        self.fatigue = bounded(
            self.fatigue + sample.cpu_percent / 100.0 * FATIGUE_PER_TICK_AT_FULL_CPU,
        );
        self.weight = bounded(sample.memory_percent);

        if self.fatigue > TIRED_ABOVE {
            self.happiness = bounded(self.happiness - TIRED_HAPPINESS_DRAIN);
            self.hunger = bounded(self.hunger - TIRED_HUNGER_DRAIN);
        }
        if self.hunger < STARVING_BELOW {
            self.sanity = bounded(self.sanity - STARVATION_SANITY_DRAIN);
        }
        if self.happiness > CONTENT_ABOVE {
            self.sanity = bounded(self.sanity + CONTENT_SANITY_RECOVERY);
        }
    }

    // -----------------------------------------------------------------------
    // Evolution
    // -----------------------------------------------------------------------

    /// Moves to the next course if XP reached the threshold.
    ///
    /// Returns `true` if an evolution happened.
    pub fn evolve(&mut self) -> bool {
        if self.xp < XP_TO_NEXT_COURSE {
            return false;
        }
        self.xp = 0;
        self.course = self.course.saturating_add(1);
        self.sanity = bounded(self.sanity + EVOLVE_SANITY_BONUS);
        self.happiness = bounded(self.happiness + EVOLVE_HAPPINESS_BONUS);
        self.skin = skin_for(self.course);
        self.status_message = format!("Evolution! Now on course {}! ✨", self.course);
        tracing::info!(course = self.course, skin = self.skin, "pet evolved");
        true
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Sleeps off fatigue at a hunger cost.
    pub fn rest(&mut self) {
        self.fatigue = bounded(self.fatigue - REST_FATIGUE_RELIEF);
        self.hunger = bounded(self.hunger - REST_HUNGER_COST);
        self.status_message = "Zzz... resting 😴".to_string();
    }

    pub fn pet(&mut self) {
        self.happiness = bounded(self.happiness + PET_HAPPINESS_BONUS);
        self.status_message = "Purr! 💕".to_string();
    }

    /// Reward for a confirmed process termination.
    pub fn process_killed(&mut self) {
        self.sanity = bounded(self.sanity + KILL_SANITY_REWARD);
        self.status_message = "One less process to worry about. 🔪".to_string();
    }

    /// Back to construction defaults. The name and classifier survive.
    pub fn reset(&mut self, now: Instant) {
        let name = std::mem::take(&mut self.name);
        *self = Self::new(name, Arc::clone(&self.classifier), now);
        tracing::info!(name = %self.name, "pet reset");
    }
}

/// Truncates to at most `max` characters.
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

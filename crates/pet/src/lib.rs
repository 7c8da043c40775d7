//! # Pet: the virtual pet's state machine
//!
//! A [`PetState`] owns bounded stats (sanity, hunger, fatigue, happiness,
//! weight), progress (course, xp), display fields and cadence timestamps.
//! It is driven by four inputs:
//!
//! - **feed**: a snippet goes through the shared [`classifier::Classifier`];
//!   parity checks nourish, anything else hurts.
//! - **tick**: a periodic update fed with a [`SystemSample`] (or the reason
//!   there is none). Throttled to one application per second.
//! - **actions**: rest, pet, process-killed, reset.
//! - **evolve**: triggered from tick once XP reaches the course threshold.
//!
//! The state never reads the clock itself; every time-dependent method takes
//! `now: Instant`. Status is derived on demand by [`status::derive`].

pub mod metrics;
pub mod state;
pub mod status;
pub mod tuning;

pub use metrics::{MetricsError, SystemSample};
pub use state::{PetState, TickOutcome, TickReport};

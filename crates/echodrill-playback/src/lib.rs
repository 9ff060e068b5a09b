//! Practice playback for echodrill
//!
//! Drives an audio engine through a practice schedule with repeats, silence,
//! pause/resume and cancellation.

pub mod engine;
pub mod error;
pub mod probe;
pub mod scheduler;
pub mod simulated;

pub use engine::PlaybackEngine;
pub use error::PlaybackError;
pub use probe::probe_duration;
pub use scheduler::{PlaybackStatus, RunOutcome, RunState, Scheduler, SchedulerConfig};
pub use simulated::{EngineEvent, SimulatedEngine};

// Re-export types from echodrill-core
pub use echodrill_core::{PlayWindow, Schedule, Step};

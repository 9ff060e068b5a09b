//! echodrill-core - timing alignment and practice scheduling for narrated audio
//!
//! Turns word-level timestamps into sentence spans, maps marker-annotated
//! text back onto the audio timeline, and computes the step-by-step timing of
//! every practice mode.

pub mod cut_plan;
pub mod error;
pub mod markers;
pub mod plan;
pub mod segmenter;
pub mod session;
pub mod settings;
pub mod timing;
pub mod types;

pub use cut_plan::CutPlan;
pub use error::CoreError;
pub use markers::{Marker, MarkerInsertion};
pub use plan::{SegmentPlanBuilder, TimedSegment};
pub use segmenter::{SegmenterConfig, SentenceSegmenter};
pub use session::PracticeSession;
pub use settings::PlaybackSettings;
pub use timing::{
    build_schedule, estimate_duration, PlayWindow, PracticeInput, PracticeMode, PracticeSentence,
    Schedule, SegmentGrain, Step, TimingProfile,
};
pub use types::*;

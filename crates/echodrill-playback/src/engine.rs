//! Playback engine contract

use std::path::Path;

use tokio::sync::watch;

use crate::error::PlaybackError;

/// Transport control over one loaded audio file
///
/// Seeking is not assumed to be sample-accurate; the scheduler pads windows
/// and polls the reported position.
#[trait_variant::make(PlaybackEngine: Send)]
pub trait LocalPlaybackEngine {
    /// Load a file, returning its duration in seconds
    async fn load(&self, path: &Path) -> Result<f64, PlaybackError>;

    /// Move the playhead (seconds)
    async fn seek(&self, time: f64) -> Result<(), PlaybackError>;

    /// Start or resume the transport
    async fn play(&self) -> Result<(), PlaybackError>;

    /// Pause the transport, keeping the position
    async fn pause(&self) -> Result<(), PlaybackError>;

    /// Stop the transport
    async fn stop(&self) -> Result<(), PlaybackError>;

    /// Emit the short audible cue played between segments
    async fn cue(&self) -> Result<(), PlaybackError>;

    /// Current playhead position (seconds)
    fn current_position(&self) -> f64;

    /// Position notifications, if the engine publishes them
    ///
    /// Engines returning `None` are polled.
    fn position_updates(&self) -> Option<watch::Receiver<f64>>;
}

//! Clock-driven engine that plays nothing
//!
//! The playhead advances with the tokio clock, so schedules can be rehearsed
//! (and tested under paused time) without an audio device.

use std::path::Path;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::engine::PlaybackEngine;
use crate::error::PlaybackError;

/// Transport command observed by the simulated engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Load,
    Seek(f64),
    Play,
    Pause,
    Stop,
    Cue,
}

#[derive(Debug, Default)]
struct SimState {
    anchor: f64,
    playing_since: Option<Instant>,
    plays: usize,
    events: Vec<EngineEvent>,
}

/// Engine whose position is derived from elapsed time
#[derive(Debug)]
pub struct SimulatedEngine {
    duration: f64,
    fail_on_play: Option<usize>,
    state: Mutex<SimState>,
}

impl SimulatedEngine {
    /// Engine for audio of the given length (seconds)
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_on_play: None,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Make the n-th `play` call (1-based) fail
    pub fn fail_on_play(mut self, n: usize) -> Self {
        self.fail_on_play = Some(n);
        self
    }

    /// Commands received so far
    pub fn events(&self) -> Vec<EngineEvent> {
        self.lock().events.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing_since.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // A poisoned lock only means a test panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn position_of(&self, state: &SimState) -> f64 {
        let elapsed = state
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (state.anchor + elapsed).min(self.duration)
    }

    fn freeze(&self, state: &mut SimState) {
        state.anchor = self.position_of(state);
        state.playing_since = None;
    }
}

impl PlaybackEngine for SimulatedEngine {
    async fn load(&self, path: &Path) -> Result<f64, PlaybackError> {
        if !path.exists() {
            return Err(PlaybackError::FileNotFound(path.display().to_string()));
        }
        let mut state = self.lock();
        state.anchor = 0.0;
        state.playing_since = None;
        state.events.push(EngineEvent::Load);
        debug!("Simulated engine loaded {} ({:.2}s)", path.display(), self.duration);
        Ok(self.duration)
    }

    async fn seek(&self, time: f64) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        state.anchor = time.clamp(0.0, self.duration);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        state.events.push(EngineEvent::Seek(time));
        Ok(())
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        state.plays += 1;
        if self.fail_on_play == Some(state.plays) {
            return Err(PlaybackError::Engine("simulated output failure".to_string()));
        }
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
        state.events.push(EngineEvent::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        self.freeze(&mut state);
        state.events.push(EngineEvent::Pause);
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        state.anchor = 0.0;
        state.playing_since = None;
        state.events.push(EngineEvent::Stop);
        Ok(())
    }

    async fn cue(&self) -> Result<(), PlaybackError> {
        self.lock().events.push(EngineEvent::Cue);
        Ok(())
    }

    fn current_position(&self) -> f64 {
        let state = self.lock();
        self.position_of(&state)
    }

    fn position_updates(&self) -> Option<watch::Receiver<f64>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_position_follows_clock() {
        let engine = SimulatedEngine::new(10.0);
        engine.seek(2.0).await.unwrap();
        engine.play().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!((engine.current_position() - 2.5).abs() < 1e-6);

        engine.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!((engine.current_position() - 2.5).abs() < 1e-6);
        assert!(!engine.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_stops_at_duration() {
        let engine = SimulatedEngine::new(1.0);
        engine.seek(0.8).await.unwrap();
        engine.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(engine.current_position(), 1.0);
    }

    #[tokio::test]
    async fn test_scripted_play_failure() {
        let engine = SimulatedEngine::new(1.0).fail_on_play(2);
        assert!(engine.play().await.is_ok());
        assert!(matches!(engine.play().await, Err(PlaybackError::Engine(_))));
    }
}

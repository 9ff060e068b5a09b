//! Practice run scheduler
//!
//! One scheduler owns the playback engine for an audio item. A run walks the
//! steps of a [`Schedule`] on a spawned task; starting another run (or a
//! preview) cancels and joins the active one first, so the transport never
//! has two owners.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use echodrill_core::{PlayWindow, Schedule, SegmentGrain, SegmentKey, Step};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::PlaybackEngine;
use crate::error::PlaybackError;

/// Scheduler timing knobs
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Longest wait between position checks for sentence windows
    pub sentence_poll: Duration,
    /// Longest wait between position checks for word windows
    pub word_poll: Duration,
    /// Shortest wait between position checks
    pub min_poll: Duration,
    /// Silence is slept in slices of at most this length
    pub silence_slice: Duration,
    /// A window whose position stops advancing for this long is treated as finished
    pub stall_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sentence_poll: Duration::from_millis(50),
            word_poll: Duration::from_millis(10),
            min_poll: Duration::from_millis(2),
            silence_slice: Duration::from_millis(50),
            stall_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Snapshot of the scheduler, published on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub state: RunState,
    pub paused: bool,
    /// Segment whose window is currently playing
    pub current: Option<SegmentKey>,
    /// Segment visits finished so far
    pub done: usize,
    pub total: usize,
    /// Error that ended the last run, if any
    pub last_error: Option<String>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

struct ActiveRun {
    token: CancellationToken,
    handle: JoinHandle<Result<RunOutcome, PlaybackError>>,
}

/// Drives a playback engine through practice schedules
pub struct Scheduler<E> {
    engine: Arc<E>,
    config: SchedulerConfig,
    status_tx: Arc<watch::Sender<PlaybackStatus>>,
    pause_tx: watch::Sender<bool>,
    loaded: Option<PathBuf>,
    active: Option<ActiveRun>,
}

impl<E> Scheduler<E>
where
    E: PlaybackEngine + Sync + 'static,
{
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, SchedulerConfig::default())
    }

    pub fn with_config(engine: E, config: SchedulerConfig) -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::default());
        let (pause_tx, _) = watch::channel(false);
        Self {
            engine: Arc::new(engine),
            config,
            status_tx: Arc::new(status_tx),
            pause_tx,
            loaded: None,
            active: None,
        }
    }

    /// Observe status changes
    pub fn status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Start a run, cancelling any active one first
    pub async fn start(&mut self, audio: &Path, schedule: Schedule) -> Result<(), PlaybackError> {
        self.cancel().await;

        if !audio.exists() {
            return Err(PlaybackError::FileNotFound(audio.display().to_string()));
        }
        if self.loaded.as_deref() != Some(audio) {
            let duration = self.engine.load(audio).await?;
            info!("Loaded {} ({:.2}s)", audio.display(), duration);
            self.loaded = Some(audio.to_path_buf());
        }

        self.pause_tx.send_replace(false);
        self.status_tx.send_replace(PlaybackStatus {
            state: RunState::Running,
            total: schedule.total_segments,
            ..PlaybackStatus::default()
        });

        info!(
            "Starting {} run: {} steps over {} segments",
            schedule.mode.map_or("preview", |m| m.name()),
            schedule.steps.len(),
            schedule.total_segments
        );

        let token = CancellationToken::new();
        let run = Run {
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
            status: Arc::clone(&self.status_tx),
            paused: self.pause_tx.subscribe(),
            token: token.clone(),
        };
        let handle = tokio::spawn(run.drive(schedule.steps));
        self.active = Some(ActiveRun { token, handle });
        Ok(())
    }

    /// Play a single window under the same cancel-then-run rule as full runs
    pub async fn preview(&mut self, audio: &Path, window: PlayWindow) -> Result<(), PlaybackError> {
        let schedule = Schedule {
            mode: None,
            steps: vec![Step::Play(window), Step::Progress { done: 1, total: 1 }],
            total_segments: 1,
        };
        self.start(audio, schedule).await
    }

    pub fn pause(&self) {
        self.pause_tx.send_replace(true);
        self.status_tx.send_modify(|s| s.paused = true);
    }

    pub fn resume(&self) {
        self.pause_tx.send_replace(false);
        self.status_tx.send_modify(|s| s.paused = false);
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Cancel the active run and wait for its task to exit
    ///
    /// Returns `None` when nothing was running or the run ended in an error
    /// (reported through [`PlaybackStatus::last_error`]).
    pub async fn cancel(&mut self) -> Option<RunOutcome> {
        let active = self.active.take()?;
        active.token.cancel();
        match join(active.handle).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                debug!("Cancelled run had already failed: {}", e);
                None
            }
        }
    }

    /// Wait for the active run to finish on its own
    pub async fn wait(&mut self) -> Result<Option<RunOutcome>, PlaybackError> {
        match self.active.take() {
            Some(active) => join(active.handle).await.map(Some),
            None => Ok(None),
        }
    }
}

impl<E> Drop for Scheduler<E> {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.token.cancel();
        }
    }
}

async fn join(
    handle: JoinHandle<Result<RunOutcome, PlaybackError>>,
) -> Result<RunOutcome, PlaybackError> {
    handle
        .await
        .map_err(|e| PlaybackError::Engine(format!("Scheduler task failed: {}", e)))?
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Cancelled,
}

/// State owned by one run's task
struct Run<E> {
    engine: Arc<E>,
    config: SchedulerConfig,
    status: Arc<watch::Sender<PlaybackStatus>>,
    paused: watch::Receiver<bool>,
    token: CancellationToken,
}

impl<E> Run<E>
where
    E: PlaybackEngine + Sync + 'static,
{
    async fn drive(mut self, steps: Vec<Step>) -> Result<RunOutcome, PlaybackError> {
        let started = Instant::now();
        let result = self.run(steps).await;

        match &result {
            Ok(RunOutcome::Completed) => {
                info!("Practice run completed in {:.2}s", started.elapsed().as_secs_f64());
                self.finish(None);
            }
            Ok(RunOutcome::Cancelled) => {
                if let Err(e) = self.engine.pause().await {
                    warn!("Failed to pause transport after cancel: {}", e);
                }
                info!("Practice run cancelled after {:.2}s", started.elapsed().as_secs_f64());
                self.finish(None);
            }
            Err(e) => {
                warn!("Practice run failed: {}", e);
                if let Err(stop_err) = self.engine.stop().await {
                    warn!("Failed to stop transport: {}", stop_err);
                }
                self.finish(Some(e.to_string()));
            }
        }
        result
    }

    async fn run(&mut self, steps: Vec<Step>) -> Result<RunOutcome, PlaybackError> {
        for step in steps {
            if self.token.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            let flow = match step {
                Step::Play(window) => self.play_window(&window).await?,
                Step::Silence { seconds } | Step::Gap { seconds } => self.hold(seconds).await,
                Step::Cue => {
                    self.engine.cue().await?;
                    Flow::Continue
                }
                Step::Progress { done, total } => {
                    self.status.send_modify(|s| {
                        s.done = done;
                        s.total = total;
                    });
                    Flow::Continue
                }
            };
            if flow == Flow::Cancelled {
                return Ok(RunOutcome::Cancelled);
            }
        }
        Ok(RunOutcome::Completed)
    }

    /// Seek, play, and wait until the playhead reaches the window end
    async fn play_window(&mut self, window: &PlayWindow) -> Result<Flow, PlaybackError> {
        debug!(
            "Playing {} [{:.3}, {:.3}] {:?}",
            window.key, window.start, window.end, window.grain
        );
        self.status.send_modify(|s| s.current = Some(window.key));

        self.engine.seek(window.start).await?;
        self.engine.play().await?;

        let poll_cap = match window.grain {
            SegmentGrain::Word => self.config.word_poll,
            SegmentGrain::Sentence | SegmentGrain::WholeSentence => self.config.sentence_poll,
        };
        let mut updates = self.engine.position_updates();
        let mut last_position = self.engine.current_position();
        let mut last_advance = Instant::now();

        loop {
            if self.is_paused() {
                self.engine.pause().await?;
                if self.park().await == Flow::Cancelled {
                    return Ok(Flow::Cancelled);
                }
                self.engine.play().await?;
                last_advance = Instant::now();
            }

            let position = self.engine.current_position();
            if position >= window.end {
                break;
            }
            if position > last_position {
                last_position = position;
                last_advance = Instant::now();
            } else if last_advance.elapsed() >= self.config.stall_timeout {
                warn!(
                    "Playhead stuck at {:.3}s before {:.3}s, moving on",
                    position, window.end
                );
                break;
            }

            let wait = Duration::try_from_secs_f64(window.end - position)
                .unwrap_or(self.config.min_poll)
                .min(poll_cap)
                .max(self.config.min_poll);

            tokio::select! {
                biased;
                _ = self.token.cancelled() => return Ok(Flow::Cancelled),
                _ = tick(&mut updates, wait) => {}
            }
        }

        self.engine.pause().await?;
        Ok(Flow::Continue)
    }

    /// Sleep for `seconds` of unpaused time in bounded slices
    async fn hold(&mut self, seconds: f64) -> Flow {
        let mut remaining = Duration::try_from_secs_f64(seconds).unwrap_or_default();
        while !remaining.is_zero() {
            if self.is_paused() && self.park().await == Flow::Cancelled {
                return Flow::Cancelled;
            }
            let slice = remaining.min(self.config.silence_slice);
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return Flow::Cancelled,
                _ = sleep(slice) => remaining -= slice,
            }
        }
        Flow::Continue
    }

    /// Wait until resumed or cancelled
    async fn park(&mut self) -> Flow {
        debug!("Run paused");
        while self.is_paused() {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return Flow::Cancelled,
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Run resumed");
        Flow::Continue
    }

    fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    fn finish(&self, error: Option<String>) {
        self.status.send_modify(|s| {
            s.state = RunState::Idle;
            s.current = None;
            s.paused = false;
            if error.is_some() {
                s.last_error = error;
            }
        });
    }
}

/// Wait for a position update or the poll interval, whichever comes first
async fn tick(updates: &mut Option<watch::Receiver<f64>>, wait: Duration) {
    match updates {
        Some(rx) => {
            if let Ok(Err(_)) = timeout(wait, rx.changed()).await {
                // Publisher gone, poll from now on
                *updates = None;
            }
        }
        None => sleep(wait).await,
    }
}

//! `rehearse`: run a schedule on the simulated transport

use anyhow::{anyhow, Context, Result};
use clap::Args;
use echodrill_core::{
    estimate_duration, PracticeMode, PracticeSession, Schedule, SegmentKey, TimingProfile,
};
use echodrill_playback::{
    PlayWindow, PlaybackStatus, RunOutcome, RunState, Scheduler, SimulatedEngine, Step,
};
use echodrill_store::PlanStore;
use tokio::time::Instant;
use tracing::{info, warn};

use super::estimate::{format_duration, ModeArgs};
use crate::state::{Lesson, LessonArgs};

#[derive(Args, Debug)]
pub struct RehearseArgs {
    #[command(flatten)]
    pub lesson: LessonArgs,

    #[command(flatten)]
    pub practice: ModeArgs,

    /// Play only the segment with this key.
    #[arg(long)]
    pub preview: Option<String>,
}

fn find_window(schedules: &[Schedule], key: &SegmentKey) -> Option<PlayWindow> {
    schedules
        .iter()
        .flat_map(|s| s.steps.iter())
        .find_map(|step| match step {
            Step::Play(window) if window.key == *key => Some(window.clone()),
            _ => None,
        })
}

fn log_change(last: &mut PlaybackStatus, status: &PlaybackStatus) {
    if status.current != last.current {
        if let Some(key) = &status.current {
            info!("Playing {} ({}/{})", key, status.done, status.total);
        }
    }
    if status.paused != last.paused {
        info!("{}", if status.paused { "Paused" } else { "Resumed" });
    }
    if status.last_error != last.last_error {
        if let Some(error) = &status.last_error {
            warn!("Run failed: {}", error);
        }
    }
    *last = status.clone();
}

pub async fn run(store: &PlanStore, args: RehearseArgs) -> Result<()> {
    let mut lesson = Lesson::open(store, &args.lesson).await?;
    args.practice.apply(&mut lesson.plan.settings);
    let mode = args.practice.mode(&lesson.plan.settings);

    let duration = lesson.audio_duration();
    let session = PracticeSession::new(&lesson.sentences, &lesson.transcript.words, &lesson.plan)
        .with_audio_duration(duration);
    let profile = TimingProfile::default();
    let schedule = session.schedule(mode, &profile);

    let mut scheduler = Scheduler::new(SimulatedEngine::new(duration));
    let mut status = scheduler.status();

    let expected = match &args.preview {
        Some(key) => {
            let key: SegmentKey = key
                .parse()
                .map_err(|e| anyhow!("Bad segment key {:?}: {}", key, e))?;
            let candidates = [
                schedule,
                session.schedule(PracticeMode::CuedSequence, &profile),
                session.schedule(PracticeMode::word_shadowing(1, 1.0, 1), &profile),
            ];
            let window = find_window(&candidates, &key)
                .ok_or_else(|| anyhow!("No segment {} in this lesson", key))?;
            let expected = window.duration();
            scheduler
                .preview(&lesson.audio, window)
                .await
                .context("Failed to start the preview")?;
            expected
        }
        None => {
            let expected = estimate_duration(&schedule);
            info!("Estimated run length {}", format_duration(expected));
            scheduler
                .start(&lesson.audio, schedule)
                .await
                .context("Failed to start the run")?;
            expected
        }
    };

    let started = Instant::now();
    let mut last = status.borrow_and_update().clone();
    while last.state == RunState::Running {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, cancelling");
                scheduler.cancel().await;
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                log_change(&mut last, &current);
            }
        }
    }

    let outcome = scheduler.wait().await?.unwrap_or(RunOutcome::Cancelled);
    println!(
        "{:?} after {} (estimated {})",
        outcome,
        format_duration(started.elapsed().as_secs_f64()),
        format_duration(expected)
    );
    Ok(())
}

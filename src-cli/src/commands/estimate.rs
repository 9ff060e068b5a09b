//! `estimate`: predict a practice run's length

use anyhow::Result;
use clap::{Args, ValueEnum};
use echodrill_core::{estimate_duration, PlaybackSettings, PracticeMode, Step, TimingProfile};
use echodrill_store::PlanStore;

use crate::state::{Lesson, LessonArgs};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    /// Every segment once with a cue between segments.
    Cued,
    /// Each segment repeated with silence to repeat into.
    Repeat,
    /// Word shadowing over hard words.
    Words,
}

/// Practice mode selection, overriding the saved settings
#[derive(Args, Debug, Clone, Default)]
pub struct ModeArgs {
    /// Practice mode (defaults to the saved settings).
    #[arg(long, value_enum)]
    pub mode: Option<ModeChoice>,

    /// Repetitions per segment (1-5).
    #[arg(long)]
    pub repeats: Option<u8>,

    /// Silence after each repetition as a multiple of its length (0.2-15).
    #[arg(long)]
    pub silence: Option<f64>,

    /// Passes over the word list in word shadowing (1-5).
    #[arg(long)]
    pub loops: Option<u8>,

    /// Practice whole sentences, ignoring pause markers.
    #[arg(long)]
    pub sentence_only: bool,

    /// Only practice flagged sentences.
    #[arg(long)]
    pub flagged_only: bool,

    /// Keep these choices in the saved settings.
    #[arg(long)]
    pub save: bool,
}

impl ModeArgs {
    /// Apply the overrides to a settings record
    pub fn apply(&self, settings: &mut PlaybackSettings) {
        match self.mode {
            Some(ModeChoice::Words) => settings.word_shadowing = true,
            Some(ModeChoice::Repeat) | Some(ModeChoice::Cued) => settings.word_shadowing = false,
            None => {}
        }
        let words = settings.word_shadowing;
        if let Some(repeats) = self.repeats {
            if words {
                settings.set_word_repeat_count(repeats);
            } else {
                settings.set_repeat_count(repeats);
            }
        }
        if let Some(silence) = self.silence {
            if words {
                settings.set_word_silence_multiplier(silence);
            } else {
                settings.set_silence_multiplier(silence);
            }
        }
        if let Some(loops) = self.loops {
            settings.set_word_loops(loops);
        }
        if self.sentence_only {
            settings.sentence_only = true;
        }
        if self.flagged_only {
            settings.flagged_only = true;
        }
    }

    /// Mode selected by the overrides on top of the settings
    pub fn mode(&self, settings: &PlaybackSettings) -> PracticeMode {
        match self.mode {
            Some(ModeChoice::Cued) => PracticeMode::CuedSequence,
            _ => settings.practice_mode(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub lesson: LessonArgs,

    #[command(flatten)]
    pub practice: ModeArgs,

    /// List every step of the schedule.
    #[arg(long)]
    pub steps: bool,
}

/// Render seconds as `1m 05.2s`
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let rest = seconds - minutes * 60.0;
    if minutes > 0.0 {
        format!("{}m {:04.1}s", minutes as u64, rest)
    } else {
        format!("{:.1}s", rest)
    }
}

pub async fn run(store: &PlanStore, args: EstimateArgs) -> Result<()> {
    let mut lesson = Lesson::open(store, &args.lesson).await?;
    args.practice.apply(&mut lesson.plan.settings);
    let mode = args.practice.mode(&lesson.plan.settings);

    let schedule = lesson.session().schedule(mode, &TimingProfile::default());
    let total = estimate_duration(&schedule);

    if args.steps {
        for step in &schedule.steps {
            match step {
                Step::Play(window) => println!(
                    "play     {:>8.3} - {:<8.3} {}",
                    window.start, window.end, window.text
                ),
                Step::Silence { seconds } => println!("silence  {:.3}s", seconds),
                Step::Gap { seconds } => println!("gap      {:.3}s", seconds),
                Step::Cue => println!("cue"),
                Step::Progress { done, total } => println!("progress {}/{}", done, total),
            }
        }
    }

    println!(
        "{}: {} plays over {} segments, about {}",
        mode.name(),
        schedule.play_count(),
        schedule.total_segments,
        format_duration(total)
    );

    if args.practice.save {
        let path = lesson.save(store).await?;
        println!("Settings saved to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_target_the_selected_mode() {
        let mut settings = PlaybackSettings::default();
        let args = ModeArgs {
            mode: Some(ModeChoice::Words),
            repeats: Some(9),
            silence: Some(3.0),
            ..ModeArgs::default()
        };
        args.apply(&mut settings);

        assert!(settings.word_shadowing);
        assert_eq!(settings.word_repeat_count, 5);
        assert_eq!(settings.word_silence_multiplier, 3.0);
        assert_eq!(settings.repeat_count, 2);
        assert!(matches!(args.mode(&settings), PracticeMode::WordShadowing { .. }));
    }

    #[test]
    fn test_cued_mode_ignores_repeat_settings() {
        let settings = PlaybackSettings::default();
        let args = ModeArgs {
            mode: Some(ModeChoice::Cued),
            ..ModeArgs::default()
        };
        assert_eq!(args.mode(&settings), PracticeMode::CuedSequence);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.34), "12.3s");
        assert_eq!(format_duration(65.2), "1m 05.2s");
    }
}

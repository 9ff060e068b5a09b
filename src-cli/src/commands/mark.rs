//! `mark`: edit a sentence's markers

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use echodrill_core::markers::{insert_marker, marker_counts, MAX_HARD_WORD_RUN};
use echodrill_core::Marker;
use echodrill_store::PlanStore;

use crate::state::{Lesson, LessonArgs};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerChoice {
    /// Split playback at this point.
    Pause,
    /// Practice the next word(s) on their own.
    Hard,
}

impl From<MarkerChoice> for Marker {
    fn from(choice: MarkerChoice) -> Self {
        match choice {
            MarkerChoice::Pause => Marker::Pause,
            MarkerChoice::Hard => Marker::HardWord,
        }
    }
}

#[derive(Args, Debug)]
pub struct MarkArgs {
    #[command(flatten)]
    pub lesson: LessonArgs,

    /// Sentence number (1-based) or id.
    pub sentence: String,

    /// Caret position in UTF-16 code units.
    #[arg(long, required_unless_present_any = ["text", "clear"])]
    pub at: Option<usize>,

    /// End of a selection replaced by the marker.
    #[arg(long, requires = "at")]
    pub to: Option<usize>,

    #[arg(long, value_enum, default_value = "pause")]
    pub marker: MarkerChoice,

    /// Consecutive hard-word markers (words in the bundle).
    #[arg(long, default_value = "1")]
    pub count: usize,

    /// Replace the sentence text outright.
    #[arg(long, conflicts_with_all = ["at", "clear"])]
    pub text: Option<String>,

    /// Drop the sentence's edit, cuts and tunes.
    #[arg(long)]
    pub clear: bool,
}

pub async fn run(store: &PlanStore, args: MarkArgs) -> Result<()> {
    let mut lesson = Lesson::open(store, &args.lesson).await?;
    let sentence = lesson.sentence(&args.sentence)?.clone();

    if args.clear {
        lesson.plan.clear_sentence_edit(&sentence.id);
    } else {
        let text = match (&args.text, args.at) {
            (Some(text), _) => text.clone(),
            (None, Some(at)) => {
                let marker = Marker::from(args.marker);
                let count = match marker {
                    Marker::Pause => 1,
                    Marker::HardWord => args.count.clamp(1, MAX_HARD_WORD_RUN),
                };
                let current = lesson.plan.edited_text(&sentence).to_string();
                let mut inserted = insert_marker(&current, at..args.to.unwrap_or(at), marker);
                for _ in 1..count {
                    let caret = inserted.caret_utf16;
                    inserted = insert_marker(&inserted.text, caret..caret, marker);
                }
                println!("caret {}", inserted.caret_utf16);
                inserted.text
            }
            (None, None) => bail!("Nothing to do: pass --at, --text or --clear"),
        };
        lesson
            .plan
            .apply_sentence_edit(&sentence, &text, &lesson.transcript.words);
    }

    let text = lesson.plan.edited_text(&sentence).to_string();
    let (pauses, runs) = marker_counts(&text);
    println!("{}", text);
    println!("{} pause markers, {} hard-word runs", pauses, runs);
    for sub in lesson.plan.sub_segments(&sentence) {
        println!("  {}  {:.3} - {:.3}  {}", sub.key, sub.base_start, sub.base_end, sub.text);
    }
    for span in lesson
        .plan
        .hard_word_spans(&sentence, &lesson.transcript.words)
    {
        println!("  {}  {:.3} - {:.3}  {}", span.key, span.base_start, span.base_end, span.word);
    }

    let path = lesson.save(store).await?;
    println!("Plan saved to {}", path.display());
    Ok(())
}

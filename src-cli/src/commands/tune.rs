//! `tune`: nudge a segment's fine-tune offsets

use anyhow::{anyhow, Result};
use clap::Args;
use echodrill_core::{FineTune, SegmentKey};
use echodrill_store::PlanStore;

use crate::state::{Lesson, LessonArgs};

#[derive(Args, Debug)]
pub struct TuneArgs {
    #[command(flatten)]
    pub lesson: LessonArgs,

    /// Segment key as listed by `segment`.
    pub key: String,

    /// Seconds added to the start offset.
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub start: f64,

    /// Seconds added to the end offset.
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub end: f64,

    /// Reset both offsets to zero.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub reset: bool,
}

pub async fn run(store: &PlanStore, args: TuneArgs) -> Result<()> {
    let mut lesson = Lesson::open(store, &args.lesson).await?;
    let key: SegmentKey = args
        .key
        .parse()
        .map_err(|e| anyhow!("Bad segment key {:?}: {}", args.key, e))?;
    let sentence = lesson
        .sentences
        .iter()
        .find(|s| s.id == key.sentence)
        .ok_or_else(|| anyhow!("No sentence {} in this lesson", key.sentence))?;
    let label = sentence.text.clone();

    let tune = if args.reset {
        lesson.plan.set_tune(key, FineTune::default());
        FineTune::default()
    } else {
        lesson.plan.nudge_tune(key, args.start, args.end)
    };

    println!(
        "{} ({}): start {:+.3}s, end {:+.3}s",
        key,
        label,
        tune.start_offset(),
        tune.end_offset()
    );
    let path = lesson.save(store).await?;
    println!("Plan saved to {}", path.display());
    Ok(())
}

//! `flag`: toggle a sentence's practice flag

use anyhow::Result;
use clap::Args;
use echodrill_store::PlanStore;

use crate::state::{Lesson, LessonArgs};

#[derive(Args, Debug)]
pub struct FlagArgs {
    #[command(flatten)]
    pub lesson: LessonArgs,

    /// Sentence number (1-based) or id.
    pub sentence: String,
}

pub async fn run(store: &PlanStore, args: FlagArgs) -> Result<()> {
    let mut lesson = Lesson::open(store, &args.lesson).await?;
    let id = lesson.sentence(&args.sentence)?.id;
    let flagged = lesson.plan.toggle_flag(id);
    println!("{} {}", id, if flagged { "flagged" } else { "unflagged" });
    lesson.save(store).await?;
    Ok(())
}

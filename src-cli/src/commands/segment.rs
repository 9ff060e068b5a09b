//! `segment`: list sentences with their segments

use anyhow::Result;
use clap::Args;
use echodrill_store::PlanStore;
use serde::Serialize;

use crate::state::{Lesson, LessonArgs};

#[derive(Args, Debug)]
pub struct SegmentArgs {
    #[command(flatten)]
    pub lesson: LessonArgs,

    /// Print JSON instead of a listing.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SentenceRow {
    index: usize,
    id: String,
    start: f64,
    end: f64,
    text: String,
    flagged: bool,
    sub_segments: Vec<String>,
    hard_words: Vec<String>,
}

pub async fn run(store: &PlanStore, args: SegmentArgs) -> Result<()> {
    let lesson = Lesson::open(store, &args.lesson).await?;

    let rows: Vec<SentenceRow> = lesson
        .sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| SentenceRow {
            index: i + 1,
            id: sentence.id.to_string(),
            start: sentence.start,
            end: sentence.end,
            text: lesson.plan.edited_text(sentence).to_string(),
            flagged: lesson.plan.is_flagged(&sentence.id),
            sub_segments: lesson
                .plan
                .sub_segments(sentence)
                .iter()
                .map(|s| s.key.to_string())
                .collect(),
            hard_words: lesson
                .plan
                .hard_word_spans(sentence, &lesson.transcript.words)
                .iter()
                .map(|s| format!("{} {}", s.key, s.word))
                .collect(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        let flag = if row.flagged { '*' } else { ' ' };
        println!(
            "{:>3}{} {:>14}  {:>7.2} - {:<7.2} {}",
            row.index, flag, row.id, row.start, row.end, row.text
        );
        if row.sub_segments.len() > 1 {
            for key in &row.sub_segments {
                println!("{:>20}{}", "", key);
            }
        }
        for word in &row.hard_words {
            println!("{:>20}{}", "", word);
        }
    }
    Ok(())
}

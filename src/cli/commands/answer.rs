//! sohub answer - Top answer for a question

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit, question_url, stored_answer_text};
use crate::error::{HubError, Result};

#[derive(Args, Debug)]
pub struct AnswerArgs {
    /// Question id
    pub id: i64,

    /// Show the answer stored in the corpus instead of asking Stack Overflow
    #[arg(long)]
    pub stored: bool,
}

#[derive(Serialize)]
struct AnswerOutput {
    id: i64,
    source: &'static str,
    answer: String,
}

pub fn run(ctx: &AppContext, args: &AnswerArgs) -> Result<()> {
    let output = if args.stored {
        let corpus = ctx.load_corpus()?;
        let doc = corpus
            .get(args.id)
            .ok_or(HubError::DocumentNotFound(args.id))?;
        AnswerOutput {
            id: args.id,
            source: "corpus",
            answer: stored_answer_text(&doc.answer).to_string(),
        }
    } else {
        AnswerOutput {
            id: args.id,
            source: "stackexchange",
            answer: ctx.answers()?.fetch_top_answer(args.id),
        }
    };

    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Answer for question {}", output.id));
        layout.kv("link", &question_url(output.id));
        layout.blank();
        layout.answer(&output.answer);
        layout
    })
}

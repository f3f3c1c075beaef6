//! sohub path - Learning path for a tag

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit};
use crate::corpus::Document;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Tag to study, e.g. python or sql
    pub tag: String,

    /// Number of questions
    #[arg(long, short)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct PathOutput<'a> {
    tag: &'a str,
    questions: Vec<&'a Document>,
}

pub fn run(ctx: &AppContext, args: &PathArgs) -> Result<()> {
    let recommender = ctx.recommender()?;
    let limit = args.limit.unwrap_or(ctx.config.recommend.learning_path_limit);
    let tag = args.tag.trim();
    let output = PathOutput {
        tag,
        questions: recommender.learning_path(tag, limit)?,
    };

    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Learning path: {}", output.tag));
        if output.questions.is_empty() {
            layout.push_line("No questions carry this tag.");
        }
        for (i, doc) in output.questions.iter().enumerate() {
            layout.question(i + 1, doc, &format!("score {}", doc.score));
        }
        layout
    })
}

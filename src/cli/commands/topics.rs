//! sohub topics - Top interest tags from history

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct TopicsArgs {}

#[derive(Serialize)]
struct TopicsOutput {
    history_len: usize,
    topics: Vec<String>,
}

pub fn run(ctx: &AppContext, _args: &TopicsArgs) -> Result<()> {
    let profile = ctx.profile()?;
    let topics = ctx.recommender()?.rank_topics(&profile.history);
    let output = TopicsOutput {
        history_len: profile.history.len(),
        topics,
    };

    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title("Your top topics");
        if output.topics.is_empty() {
            layout.push_line("No history yet. Run a search to get started.");
        }
        for (i, topic) in output.topics.iter().enumerate() {
            layout.push_line(format!("{:>2}. {topic}", i + 1));
        }
        layout
    })
}

//! sohub recommend - Unseen questions from history and interests

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit};
use crate::corpus::Document;
use crate::error::Result;
use crate::recommend::Recommendation;

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Only recommend questions with this tag
    #[arg(long, short, conflicts_with = "all")]
    pub tag: Option<String>,

    /// Only the aggregate ranking across all topics
    #[arg(long)]
    pub all: bool,

    /// Maximum recommendations per list
    #[arg(long, short)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct TopicGroup<'a> {
    topic: String,
    questions: Vec<&'a Document>,
}

#[derive(Serialize)]
struct RecommendOutput<'a> {
    topics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    by_topic: Vec<TopicGroup<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<Vec<Recommendation<'a>>>,
}

pub fn run(ctx: &AppContext, args: &RecommendArgs) -> Result<()> {
    let profile = ctx.profile()?;
    let recommender = ctx.recommender()?;
    let per_tag = args.limit.unwrap_or(ctx.config.recommend.num_recs_per_tag);
    let aggregate = args.limit.unwrap_or(ctx.config.recommend.num_recs_all);
    let topics = recommender.rank_topics(&profile.history);

    let by_topic = match (&args.tag, args.all) {
        (Some(tag), _) => vec![TopicGroup {
            topic: tag.clone(),
            questions: recommender.recommend_for_tag(tag, &profile.history, per_tag)?,
        }],
        (None, true) => Vec::new(),
        (None, false) => recommender
            .recommend_by_topic(&profile.history, per_tag)?
            .into_iter()
            .map(|(topic, questions)| TopicGroup { topic, questions })
            .collect(),
    };
    let all = if args.tag.is_none() {
        Some(recommender.recommend_all(&profile.history, &profile.tag_set(), aggregate)?)
    } else {
        None
    };

    let output = RecommendOutput {
        topics,
        by_topic,
        all,
    };

    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title("Recommended for you");
        if output.topics.is_empty() && args.tag.is_none() {
            layout.push_line("No history yet. Search for something first.");
            return layout;
        }
        for group in &output.by_topic {
            layout.section(&group.topic);
            if group.questions.is_empty() {
                layout.push_line("Nothing new for this topic.");
            }
            for (i, doc) in group.questions.iter().enumerate() {
                layout.question(i + 1, doc, "");
            }
            layout.blank();
        }
        if let Some(all) = &output.all {
            layout.section("All topics");
            for (i, rec) in all.iter().enumerate() {
                layout.question(i + 1, rec.document, &format!("relevance {}", rec.relevance));
            }
        }
        layout
    })
}

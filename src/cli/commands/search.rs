//! sohub search - Hybrid question search

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit};
use crate::error::Result;
use crate::search::ScoredDocument;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Problem description or question title
    pub query: String,

    /// Maximum number of results
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Fetch the top Stack Overflow answer for each result
    #[arg(long)]
    pub answers: bool,

    /// Do not add the top result to viewing history
    #[arg(long)]
    pub no_record: bool,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    #[serde(flatten)]
    hit: &'a ScoredDocument<'a>,
    saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_answer: Option<String>,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    count: usize,
    /// Id appended to history by this search, if any
    recorded: Option<i64>,
    results: Vec<SearchHit<'a>>,
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let engine = ctx.engine()?;
    let request = ctx.request_context()?;
    let top_k = args.limit.unwrap_or(ctx.config.search.default_top_k);

    let results = engine.find_similar(&args.query, top_k, &request.tags)?;

    let mut recorded = None;
    if !args.no_record {
        if let Some(top) = results.first() {
            if ctx.profiles()?.record_search(&ctx.user_id, top.document.id)? {
                recorded = Some(top.document.id);
            }
        }
    }
    debug!(?recorded, "search history updated");

    let client = if args.answers { Some(ctx.answers()?) } else { None };
    let hits: Vec<SearchHit<'_>> = results
        .iter()
        .map(|hit| SearchHit {
            hit,
            saved: request.is_saved(hit.document.id),
            top_answer: client
                .as_ref()
                .map(|c| c.fetch_top_answer(hit.document.id)),
        })
        .collect();

    let output = SearchOutput {
        query: &args.query,
        count: hits.len(),
        recorded,
        results: hits,
    };

    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Results for \"{}\"", output.query));
        if output.results.is_empty() {
            layout.push_line("No similar questions found.");
        }
        for (i, item) in output.results.iter().enumerate() {
            let mut detail = if item.hit.is_exact_match {
                "exact title match".to_string()
            } else {
                format!("similarity {:.2}", item.hit.similarity)
            };
            if item.hit.personalization_score > 0 {
                detail.push_str(", matches your tags");
            }
            if item.saved {
                detail.push_str(", saved");
            }
            layout.question(i + 1, item.hit.document, &detail);
            if let Some(answer) = &item.top_answer {
                layout.answer(answer);
            }
            layout.blank();
        }
        layout
    })
}

//! sohub profile - Interest tags and saved questions

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit, stored_answer_text};
use crate::corpus::Document;
use crate::error::{HubError, Result};

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: Option<ProfileCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show tags, saved questions and history size
    Show,
    /// Follow a tag
    AddTag { tag: String },
    /// Stop following a tag
    RemoveTag { tag: String },
    /// Bookmark a question
    Save { id: i64 },
    /// Remove a bookmark
    Unsave { id: i64 },
    /// List saved questions
    Saved {
        /// Include each question's stored answer
        #[arg(long)]
        answers: bool,
    },
}

#[derive(Serialize)]
struct ProfileOutput<'a> {
    user_id: &'a str,
    tags: &'a [String],
    saved_ids: &'a [i64],
    history_len: usize,
}

#[derive(Serialize)]
struct ChangeOutput<'a> {
    user_id: &'a str,
    action: &'static str,
    target: String,
    changed: bool,
}

#[derive(Serialize)]
struct SavedQuestion<'a> {
    #[serde(flatten)]
    document: &'a Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_text: Option<&'a str>,
}

pub fn run(ctx: &AppContext, args: &ProfileArgs) -> Result<()> {
    match args.command.as_ref().unwrap_or(&ProfileCommand::Show) {
        ProfileCommand::Show => show(ctx),
        ProfileCommand::AddTag { tag } => {
            let changed = ctx.profiles()?.add_tag(&ctx.user_id, tag)?;
            report(ctx, "add_tag", tag.trim().to_string(), changed)
        }
        ProfileCommand::RemoveTag { tag } => {
            let changed = ctx.profiles()?.remove_tag(&ctx.user_id, tag)?;
            report(ctx, "remove_tag", tag.trim().to_string(), changed)
        }
        ProfileCommand::Save { id } => {
            if !ctx.load_corpus()?.contains_id(*id) {
                return Err(HubError::DocumentNotFound(*id));
            }
            let changed = ctx.profiles()?.save_question(&ctx.user_id, *id)?;
            report(ctx, "save", id.to_string(), changed)
        }
        ProfileCommand::Unsave { id } => {
            let changed = ctx.profiles()?.unsave_question(&ctx.user_id, *id)?;
            report(ctx, "unsave", id.to_string(), changed)
        }
        ProfileCommand::Saved { answers } => saved(ctx, *answers),
    }
}

fn show(ctx: &AppContext) -> Result<()> {
    let profile = ctx.profile()?;
    let output = ProfileOutput {
        user_id: &profile.user_id,
        tags: &profile.tags,
        saved_ids: &profile.saved_ids,
        history_len: profile.history.len(),
    };
    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Profile: {}", output.user_id));
        let tags = if output.tags.is_empty() {
            "(none)".to_string()
        } else {
            output.tags.join(", ")
        };
        layout
            .kv("tags", &tags)
            .kv("saved", &output.saved_ids.len().to_string())
            .kv("history", &output.history_len.to_string());
        layout
    })
}

fn report(ctx: &AppContext, action: &'static str, target: String, changed: bool) -> Result<()> {
    let output = ChangeOutput {
        user_id: &ctx.user_id,
        action,
        target,
        changed,
    };
    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        let verb = action.replace('_', " ");
        if output.changed {
            layout.push_line(format!("{verb}: {}", output.target));
        } else {
            layout.push_line(format!("{verb}: {} (no change)", output.target));
        }
        layout
    })
}

fn saved(ctx: &AppContext, with_answers: bool) -> Result<()> {
    let profile = ctx.profile()?;
    let corpus = ctx.load_corpus()?;
    let questions: Vec<SavedQuestion<'_>> = profile
        .saved_ids
        .iter()
        .filter_map(|id| corpus.get(*id))
        .map(|document| SavedQuestion {
            document,
            answer_text: with_answers.then(|| stored_answer_text(&document.answer)),
        })
        .collect();

    emit(ctx, &questions, || {
        let mut layout = HumanLayout::new();
        layout.title("Saved questions");
        if questions.is_empty() {
            layout.push_line("Nothing saved yet.");
        }
        for (i, item) in questions.iter().enumerate() {
            layout.question(i + 1, item.document, "");
            if let Some(text) = item.answer_text {
                layout.answer(text);
            }
            layout.blank();
        }
        layout
    })
}

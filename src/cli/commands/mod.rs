//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod answer;
pub mod index;
pub mod path;
pub mod profile;
pub mod recommend;
pub mod search;
pub mod topics;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Search(args) => search::run(ctx, args),
        Commands::Topics(args) => topics::run(ctx, args),
        Commands::Recommend(args) => recommend::run(ctx, args),
        Commands::Path(args) => path::run(ctx, args),
        Commands::Answer(args) => answer::run(ctx, args),
        Commands::Profile(args) => profile::run(ctx, args),
        Commands::Index(args) => index::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find answered questions similar to a description of your problem
    Search(search::SearchArgs),

    /// Show your top topics from viewing history
    Topics(topics::TopicsArgs),

    /// Recommend unseen questions from your history and interests
    Recommend(recommend::RecommendArgs),

    /// Highest-scored questions for a tag
    Path(path::PathArgs),

    /// Fetch the top Stack Overflow answer for a question
    Answer(answer::AnswerArgs),

    /// Inspect and edit your profile
    Profile(profile::ProfileArgs),

    /// Build or check the vector index
    Index(index::IndexArgs),
}

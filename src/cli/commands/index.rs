//! sohub index - Build or check the vector index

use std::time::Instant;

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit};
use crate::error::Result;
use crate::search::build_index;

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Embed every corpus title and write the index file
    Build,
    /// Load corpus and index and verify they line up
    Check,
}

#[derive(Serialize)]
struct IndexOutput {
    action: &'static str,
    rows: usize,
    dims: usize,
    path: String,
    elapsed_ms: u128,
}

pub fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    let start = Instant::now();
    let path = ctx.config.data.index_path(&ctx.root);

    let (action, rows, dims) = match args.command {
        IndexCommand::Build => {
            let corpus = ctx.load_corpus()?;
            let embedder = ctx.embedder();
            let index = build_index(&corpus, embedder.as_ref())?;
            index.save(&path)?;
            info!(rows = index.len(), "index build complete");
            ("build", index.len(), index.dims())
        }
        IndexCommand::Check => {
            let engine = ctx.engine()?;
            ("check", engine.corpus().len(), ctx.config.search.embedding_dims)
        }
    };

    let output = IndexOutput {
        action,
        rows,
        dims,
        path: path.display().to_string(),
        elapsed_ms: start.elapsed().as_millis(),
    };
    emit(ctx, &output, || {
        let mut layout = HumanLayout::new();
        layout.title(if output.action == "build" {
            "Index built"
        } else {
            "Index matches corpus"
        });
        layout
            .kv("rows", &output.rows.to_string())
            .kv("dims", &output.dims.to_string())
            .kv("path", &output.path)
            .kv("elapsed", &format!("{} ms", output.elapsed_ms));
        layout
    })
}

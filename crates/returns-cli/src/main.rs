//! Returns desk CLI application.

mod args;
mod cli;
mod renderer;

use std::io;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use returns_core::{Action, ExtractionMode, ReturnsDeskBuilder};
use Commands::*;

fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        json,
        legacy_keywords,
        command,
    } = Args::parse();

    let mode = if legacy_keywords {
        ExtractionMode::Keyword
    } else {
        ExtractionMode::Explicit
    };

    let desk = ReturnsDeskBuilder::new()
        .with_database_path(database_file)
        .with_extraction_mode(mode)
        .build()
        .context("Failed to open the returns store")?;

    let cli = Cli::new(desk, TerminalRenderer::new(!no_color), json);

    info!("Returns desk started");

    match command {
        Some(Load { path }) => cli.run(Action::LoadCsv, Some(&path)),
        Some(Insert { text }) => cli.run(Action::Insert, Some(&text.join(" "))),
        Some(Query) | None => cli.run(Action::Query, None),
        Some(Report { output }) => cli.run(Action::Report, output.as_deref()),
        Some(Extract { text }) => cli.extract(&text.join(" ")),
        Some(Session) => cli.session(io::stdin().lock()),
    }
}

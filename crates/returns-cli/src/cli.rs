//! Command handlers.
//!
//! Every command goes through the desk's dispatch entry point so the CLI
//! sees exactly the responses any other front end would.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use returns_core::{Action, Extracted, Response, ReturnsDesk};

use crate::renderer::TerminalRenderer;

/// Session input that ends the loop.
const QUIT: &str = "quit";

pub struct Cli {
    desk: ReturnsDesk,
    renderer: TerminalRenderer,
    json: bool,
}

impl Cli {
    pub fn new(desk: ReturnsDesk, renderer: TerminalRenderer, json: bool) -> Self {
        Self {
            desk,
            renderer,
            json,
        }
    }

    /// Runs one action and fails when the response is an error.
    pub fn run(&self, action: Action, payload: Option<&str>) -> Result<()> {
        let response = self.desk.dispatch(action, payload);
        match response.error_message() {
            Some(message) => {
                if self.json {
                    self.show(&response)?;
                }
                bail!("{action} failed: {message}")
            }
            None => self.show(&response),
        }
    }

    /// Dry run of the extractor.
    pub fn extract(&self, text: &str) -> Result<()> {
        let extraction = self
            .desk
            .extract_preview(text)
            .context("Failed to read the table layout")?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&extraction.record)?);
        } else {
            self.renderer.render(&Extracted(&extraction).to_string())?;
        }
        Ok(())
    }

    /// Inserts one description per input line.
    ///
    /// Failed lines are reported and skipped; the session ends at EOF or on
    /// a line reading `quit`.
    pub fn session<R: BufRead>(&self, input: R) -> Result<()> {
        info!("Session started");
        let mut inserted = 0usize;
        for line in input.lines() {
            let line = line.context("Failed to read input")?;
            let text = line.trim();
            if text.eq_ignore_ascii_case(QUIT) {
                break;
            }
            if text.is_empty() {
                continue;
            }
            let response = self.desk.dispatch(Action::Insert, Some(text));
            if !response.is_error() {
                inserted += 1;
            }
            self.show(&response)?;
        }
        debug!("Session inserted {inserted} record(s)");
        self.desk.close();
        Ok(())
    }

    fn show(&self, response: &Response) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(response)?);
            return Ok(());
        }
        match response.error_message() {
            Some(message) => self.renderer.render_error(message),
            None => self.renderer.render(&response.to_string())?,
        }
        Ok(())
    }
}

// UI layer: terminal prompts through `dialoguer` and small `indicatif`
// helpers. Everything that reads from the user goes through `Prompter` so
// the metadata and upload flows can be driven by a script in tests.

use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Source of interactive answers.
pub trait Prompter {
    /// Ask for a line of text. Empty answers are allowed and returned as-is.
    fn input(&mut self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompter backed by the real terminal.
#[derive(Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str) -> Result<String> {
        // `allow_empty` lets optional fields be skipped with a bare Enter;
        // required fields are re-asked by the caller.
        let value: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(value)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}

/// Spinner with a message, used around the single blocking metadata lookup.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Bar counting files as they are sent; the message shows the current file.
pub fn file_progress(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

pub fn print_error(message: &str) {
    println!("{}", message.red());
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::audio::format_clock;
use crate::domain::comment::{Comment, CommentBody};
use crate::domain::playback::Transport;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output text to stdout without newline
    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Format the live recording line
    pub fn recording_status(elapsed_secs: u64, ceiling_secs: u64) -> String {
        format!(
            "{} {} / {}  (Enter to stop)",
            "● REC".red().bold(),
            format_clock(elapsed_secs as f64),
            format_clock(ceiling_secs as f64)
        )
    }

    /// Format the live playback line
    pub fn playback_status(transport: &Transport) -> String {
        let position = format_clock(transport.position());
        let duration = match transport.duration().seconds() {
            Some(secs) => format_clock(secs),
            None => "?:??".to_string(),
        };
        format!(
            "{} {} / {}  ({:.0}%)",
            "▶".cyan(),
            position,
            duration,
            transport.progress_percent()
        )
    }

    /// Format one comment for the list view
    pub fn comment_line(comment: &Comment) -> String {
        let mut line = format!("{}", comment.author.bold());
        if let Some(ts) = comment.timestamp_reference {
            line.push_str(&format!(" {}", format!("@ {}", ts).yellow()));
        }
        if comment.likes > 0 {
            line.push_str(&format!(" ({} likes)", comment.likes));
        }
        match &comment.body {
            CommentBody::Text(text) => line.push_str(&format!(": {}", text)),
            CommentBody::Audio { url } => {
                line.push_str(&format!(": {} {}", "[audio]".cyan(), url))
            }
        }
        line
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

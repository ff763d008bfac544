//! Terminal styling for CLI output

use remyxai::JobState;
use std::fmt::Display;

const RESET: &str = "\x1b[0m";

/// ANSI tone a piece of output is painted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Gray,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Bold => "\x1b[1m",
            Tone::Dim => "\x1b[2m",
            Tone::Red => "\x1b[31m",
            Tone::Green => "\x1b[32m",
            Tone::Yellow => "\x1b[33m",
            Tone::Blue => "\x1b[34m",
            Tone::Cyan => "\x1b[36m",
            Tone::Gray => "\x1b[90m",
        }
    }

    /// Tone a job status is shown in
    pub fn for_status(status: JobState) -> Self {
        match status {
            JobState::Pending => Tone::Yellow,
            JobState::Running => Tone::Cyan,
            JobState::Completed => Tone::Green,
            JobState::Failed | JobState::Error => Tone::Red,
            JobState::Unknown => Tone::Gray,
        }
    }
}

pub fn paint(tone: Tone, text: impl Display) -> String {
    format!("{}{}{}", tone.code(), text, RESET)
}

/// Job status in its tone, e.g. a green `completed`
pub fn status_label(status: JobState) -> String {
    paint(Tone::for_status(status), status)
}

pub fn print_success(msg: &str) {
    println!("{} {}", paint(Tone::Green, "✓"), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", paint(Tone::Red, "✗"), paint(Tone::Red, msg));
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", paint(Tone::Yellow, "⚠"), paint(Tone::Yellow, msg));
}

pub fn print_info(msg: &str) {
    println!("{} {}", paint(Tone::Blue, "ℹ"), msg);
}

pub fn print_header(title: &str) {
    let rule = "─".repeat(50usize.saturating_sub(title.chars().count()));
    println!();
    println!("{}", paint(Tone::Bold, paint(Tone::Cyan, format!("{} {}", title, rule))));
    println!();
}

pub fn print_section(title: &str) {
    println!();
    println!("  {}", paint(Tone::Bold, title));
    println!("  {}", paint(Tone::Dim, "─".repeat(40)));
}

pub fn print_key_value(key: &str, value: impl Display) {
    println!("  {} {}", paint(Tone::Gray, format!("{}:", key)), value);
}

/// Numbered model list, best ranked first once a match has finished
pub fn print_models(models: &[String]) {
    for (i, model) in models.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, paint(Tone::Cyan, model));
    }
}

/// Pretty-print a JSON response body
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

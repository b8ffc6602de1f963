// src/output.rs
//! User-facing console messages.
//!
//! Everything the user is meant to read goes through a [`Reporter`]; diagnostics
//! for later go through `tracing` into the log file.

use std::io::{self, Write};

use crossterm::{
    style::{Attribute, Color, Stylize},
    terminal,
    tty::IsTty,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// A change was applied or a value is being shown.
    Success,
    /// Nothing changed because a limit was reached, or a default was assumed.
    Notice,
    /// An operation was refused or failed.
    Failure,
    Heading,
    /// Raw input echo in debug mode.
    Debug,
}

pub trait Reporter {
    fn emit(&mut self, tone: Tone, message: &str);

    fn success(&mut self, message: &str) {
        self.emit(Tone::Success, message);
    }

    fn notice(&mut self, message: &str) {
        self.emit(Tone::Notice, message);
    }

    fn failure(&mut self, message: &str) {
        self.emit(Tone::Failure, message);
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn emit(&mut self, tone: Tone, message: &str) {
        (**self).emit(tone, message);
    }
}

// --- Console ---

pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    /// Colors are used only if requested and stdout is a terminal.
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_tty(),
        }
    }

    fn render(&self, tone: Tone, message: &str) -> String {
        if !self.color {
            return message.to_string();
        }
        let styled = match tone {
            Tone::Success => message.with(Color::Green),
            Tone::Notice => message.with(Color::Yellow),
            Tone::Failure => message.with(Color::Red),
            Tone::Heading => message.with(Color::Blue).attribute(Attribute::Bold),
            Tone::Debug => message.with(Color::Cyan).attribute(Attribute::Dim),
        };
        styled.to_string()
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&mut self, tone: Tone, message: &str) {
        // Raw mode disables output post-processing, so every line needs its own CR.
        let raw = terminal::is_raw_mode_enabled().unwrap_or(false);
        let rendered = self.render(tone, message);
        let mut stdout = io::stdout().lock();
        let result = if raw {
            write!(stdout, "{}\r\n", rendered.replace('\n', "\r\n"))
        } else {
            writeln!(stdout, "{}", rendered)
        };
        if let Err(e) = result.and_then(|_| stdout.flush()) {
            tracing::warn!(error = %e, "failed to write to stdout");
        }
    }
}

// --- Recording ---

/// Keeps every message in memory instead of printing it.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub messages: Vec<(Tone, String)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(|(_, message)| message.as_str())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, message)| message.contains(needle))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Reporter for RecordingReporter {
    fn emit(&mut self, tone: Tone, message: &str) {
        self.messages.push((tone, message.to_string()));
    }
}

/// Renders a boolean device flag the way the status block shows it.
pub fn on_off(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

//! Error type for clause parsing.

use crate::span::{offset_to_line_col, Span};
use std::fmt::Write as _;
use thiserror::Error;

/// Error during lexing or parsing of clause text.
///
/// `Display` prints only the message; [`format_with_source`](Self::format_with_source)
/// renders a caret diagnostic against the offending clause.
#[derive(Debug, Error)]
pub struct ClauseError {
    pub message: String,
    /// Where in the clause text the error occurred.
    pub span: Span,
    /// Optional suggestion appended to the rendered diagnostic.
    pub hint: Option<String>,
}

impl std::fmt::Display for ClauseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ClauseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ClauseError {
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Render a rustc-style diagnostic: message, location, the clause line,
    /// and a caret (with tildes for multi-byte spans) under the offender.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        let mut out = String::new();
        let _ = writeln!(out, "error: {}", self.message);
        let _ = writeln!(out, "  --> line {}:{}", line, col);

        if let Some(text) = source.lines().nth(line - 1) {
            let _ = writeln!(out, "   |");
            let _ = writeln!(out, "{line:3}| {text}");
            // Clamp the marker so a span at or past the line end still renders.
            let room = text.len().saturating_sub(col - 1).max(1);
            let width = self.span.len().max(1).min(room);
            let _ = writeln!(out, "   |{}^{}", " ".repeat(col), "~".repeat(width - 1));
        }

        if let Some(hint) = &self.hint {
            let _ = writeln!(out, "   = hint: {}", hint);
        }
        out
    }
}

//! Turning a console transcript into a normalized result.

use super::envelope::{NormalizedResult, Output};
use super::error::ErrorCode;
use super::runner::ExecutionResult;

/// Parses a console transcript. Swappable so framed protocols can replace echo matching.
pub trait TranscriptStrategy: Send + Sync {
    fn parse(&self, execution: &ExecutionResult, command_text: &str) -> NormalizedResult;
}

/// Default strategy: drop the trailing `quit` echo, then everything up to and including the
/// first line that echoes the command. When no line echoes it, the whole remainder is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoStrip;

impl TranscriptStrategy for EchoStrip {
    fn parse(&self, execution: &ExecutionResult, command_text: &str) -> NormalizedResult {
        if !execution.success() {
            return NormalizedResult::failure(ErrorCode::ConnectionProblem);
        }
        NormalizedResult::ok(Output::collapse(strip_echo(
            execution.lines(),
            command_text,
        )))
    }
}

fn strip_echo(lines: &[String], command_text: &str) -> Vec<String> {
    let body = match lines.split_last() {
        Some((_, rest)) => rest,
        None => return Vec::new(),
    };
    match body.iter().position(|l| l.contains(command_text)) {
        Some(echo) => body[echo + 1..].to_vec(),
        None => body.to_vec(),
    }
}

//! Pull structured content out of free-text model replies.
//!
//! Replies may wrap their payload in a fenced code block, surround it with
//! prose, or put raw line breaks inside JSON strings. JSON extraction tries a
//! strict parse first and then exactly one repair pass; nothing more lenient.

use serde_json::Value;
use tracing::debug;

use crate::error::{CoachError, Result};

const FENCE: &str = "```";

/// Which parse attempt produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Strict,
    Repaired,
}

/// Extract the JSON object embedded in `raw`.
pub fn extract_json(raw: &str) -> Result<Value> {
    extract_json_tagged(raw).map(|(value, _)| value)
}

pub fn extract_json_tagged(raw: &str) -> Result<(Value, ParseStrategy)> {
    if raw.trim().is_empty() {
        return Err(parse_failure("empty response", raw));
    }

    let text = strip_outer_fence(raw.trim());
    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(parse_failure("no JSON object found", raw)),
    };

    if let Ok(value) = serde_json::from_str(candidate) {
        return Ok((value, ParseStrategy::Strict));
    }

    let repaired = escape_raw_newlines(candidate);
    match serde_json::from_str(&repaired) {
        Ok(value) => {
            debug!(len = candidate.len(), "model JSON needed newline repair");
            Ok((value, ParseStrategy::Repaired))
        }
        Err(e) => Err(parse_failure(&format!("invalid JSON: {e}"), raw)),
    }
}

/// Drop the opening and closing fence lines of a code-only reply when both
/// are present.
pub fn strip_code_fences(raw: &str) -> String {
    let text = raw.trim();
    let lines: Vec<&str> = text.lines().collect();
    match (lines.first(), lines.last()) {
        (Some(first), Some(last))
            if lines.len() >= 2 && first.starts_with(FENCE) && last.trim() == FENCE =>
        {
            lines[1..lines.len() - 1].join("\n").trim().to_string()
        }
        _ => text.to_string(),
    }
}

/// Remove a leading fence line (with optional language tag) and, if present,
/// the matching trailing fence line.
fn strip_outer_fence(text: &str) -> String {
    if !text.starts_with(FENCE) {
        return text.to_string();
    }
    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    if lines.last().map(|l| l.trim() == FENCE).unwrap_or(false) {
        lines.pop();
    }
    lines.join("\n")
}

/// Escape line breaks that sit inside string literals and drop carriage
/// returns. Structural whitespace between tokens is left alone.
fn escape_raw_newlines(json: &str) -> String {
    let mut out = String::with_capacity(json.len() + 16);
    let mut in_string = false;
    let mut escaped = false;

    for ch in json.chars() {
        if ch == '\r' {
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                _ => out.push(ch),
            }
        } else {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
        }
    }
    out
}

fn parse_failure(reason: &str, text: &str) -> CoachError {
    CoachError::ParseFailure {
        reason: reason.to_string(),
        text: text.to_string(),
    }
}

//! The textual protocol spoken by text-only agents.
//!
//! A model turn is free text that may contain these markers:
//!
//! ```text
//! THOUGHT: I need to compute this.
//! ACTION: calculator("23 * 17 + 156")
//! ```
//!
//! The loop answers an action with an `OBSERVATION:` message, and the model
//! ends the task with `ANSWER: ...`. Markers are case-sensitive.

use std::sync::LazyLock;

use regex::Regex;

/// Marker that introduces a tool call.
pub const ACTION_MARKER: &str = "ACTION:";
/// Marker that introduces the final answer.
pub const ANSWER_MARKER: &str = "ANSWER:";
/// Prefix of the message carrying a tool result back to the model.
pub const OBSERVATION_MARKER: &str = "OBSERVATION:";
/// Marker that introduces the model's reasoning.
pub const THOUGHT_MARKER: &str = "THOUGHT:";

static QUOTED_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ACTION:\s*(\w+)\s*\(\s*["']([^"']*)["']?\s*\)"#)
        .expect("action pattern is valid")
});

static BARE_ACTION_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ACTION:\s*(\w+)\s*\(")
        .expect("action pattern is valid")
});

/// A tool call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActionRequest {
    /// Name of the requested tool.
    pub tool: String,
    /// The single free-text argument, unquoted and trimmed.
    pub argument: String,
}

/// Finds the first tool call in a model turn.
///
/// The quoted form `tool("arg")` (or with single quotes) is looked for
/// first, anywhere in the text. Only if it is absent, the bare form
/// `tool(arg)` is tried, where the argument runs to the matching closing
/// parenthesis on the same line. Returns `None` when the turn requests no
/// tool.
pub fn parse_action(response: &str) -> Option<ActionRequest> {
    if let Some(caps) = QUOTED_ACTION.captures(response) {
        return Some(ActionRequest {
            tool: caps[1].to_owned(),
            argument: clean_argument(&caps[2]),
        });
    }

    for caps in BARE_ACTION_HEAD.captures_iter(response) {
        let Some(head) = caps.get(0) else {
            continue;
        };
        let rest = &response[head.end()..];
        if let Some(inner) = balanced_argument(rest) {
            return Some(ActionRequest {
                tool: caps[1].to_owned(),
                argument: clean_argument(inner),
            });
        }
    }
    None
}

/// Returns the trimmed text after the last `ANSWER:` marker.
///
/// A marker followed only by whitespace does not count as an answer.
pub fn extract_answer(response: &str) -> Option<String> {
    let idx = response.rfind(ANSWER_MARKER)?;
    let answer = response[idx + ANSWER_MARKER.len()..].trim();
    if answer.is_empty() {
        return None;
    }
    Some(answer.to_owned())
}

/// Returns the text up to the parenthesis closing an already opened one,
/// without crossing a line break.
fn balanced_argument(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..idx]);
                }
            }
            '\n' => return None,
            _ => {}
        }
    }
    None
}

#[inline]
fn clean_argument(raw: &str) -> String {
    raw.trim().trim_matches(['"', '\'']).trim().to_owned()
}

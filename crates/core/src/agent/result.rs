use serde::Serialize;

/// Maximum number of characters of a tool result kept in the actions log.
pub const RECORD_RESULT_LIMIT: usize = 500;

/// Answer reported when the text protocol runs out of iterations.
pub const NO_ANSWER_SENTINEL: &str = "Failed to find an answer";

/// Answer reported when structured tool calls run out of rounds.
pub const TOOL_CALLS_EXCEEDED_SENTINEL: &str = "Exceeded the number of tool calls";

/// One tool call made during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IterationRecord {
    /// The 1-based iteration in which the call was made.
    pub index: usize,
    /// Name of the called tool.
    pub tool: String,
    /// The argument passed to the tool, as text.
    pub argument: String,
    /// The tool result, truncated to [`RECORD_RESULT_LIMIT`] characters.
    pub result: String,
}

impl IterationRecord {
    pub(crate) fn new(
        index: usize,
        tool: &str,
        argument: &str,
        result: &str,
    ) -> Self {
        Self {
            index,
            tool: tool.to_owned(),
            argument: argument.to_owned(),
            result: truncate_chars(result, RECORD_RESULT_LIMIT).to_owned(),
        }
    }
}

/// The outcome of a run that reached an answer or used up its budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// The final answer, or a sentinel text when `success` is `false`.
    pub answer: String,
    /// Number of model turns used, or the budget when it was exhausted.
    pub iterations: usize,
    /// Every tool call in order.
    pub actions: Vec<IterationRecord>,
    /// Whether the model produced an answer.
    pub success: bool,
}

/// Returns the longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("привет", 3), "при");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_record_truncates_result() {
        let long = "é".repeat(RECORD_RESULT_LIMIT + 20);
        let record = IterationRecord::new(1, "wikipedia", "Rust", &long);
        assert_eq!(record.result.chars().count(), RECORD_RESULT_LIMIT);
        let record = IterationRecord::new(2, "calculator", "1+1", "2.0");
        assert_eq!(record.result, "2.0");
    }
}

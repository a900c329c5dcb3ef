//! Small helpers shared by the parser and its tests.

use serde_json::Value;

/// Check if `fragment` is a proper prefix of `token`.
///
/// Used to hold a tool call open when the text so far ends with the
/// beginning of a closing delimiter (`</tool_` for `</tool_use>`): the
/// delimiter may still complete on the next chunk.
pub fn is_partial_token_prefix(fragment: &str, token: &str) -> bool {
    !fragment.is_empty() && fragment.len() < token.len() && token.starts_with(fragment)
}

/// Check if a string contains complete, valid JSON
pub fn is_complete_json(input: &str) -> bool {
    serde_json::from_str::<Value>(input).is_ok()
}

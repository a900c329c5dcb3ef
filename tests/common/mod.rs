// Shared builders and assertions for the parser integration tests
#![allow(dead_code)]

use tool_stream::{Segment, ToolUseSegment};

/// Collect the tool-use segments of a parse, in order
pub fn tool_segments(segments: &[Segment]) -> Vec<&ToolUseSegment> {
    segments.iter().filter_map(Segment::as_tool_use).collect()
}

/// Concatenate each segment's backing source substring
pub fn concat_raw(segments: &[Segment]) -> String {
    segments.iter().map(Segment::raw).collect()
}

/// Wrap a payload in the default delimiters
pub fn wrap(payload: &str) -> String {
    format!("<tool_use>{payload}</tool_use>")
}

/// A well-formed call with one string argument
pub fn call(name: &str, key: &str, value: &str) -> String {
    wrap(&format!(
        r#"{{"name": "{name}", "input": {{"{key}": "{value}"}}}}"#
    ))
}

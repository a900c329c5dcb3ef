use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One atomic unit of a parsed response.
///
/// Concatenating the source substrings backing each segment, in order,
/// reproduces the parsed input exactly: parsing is a lossless partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Literal prose run. Never partial.
    Text { text: String },
    /// A tool invocation, possibly still arriving.
    ToolUse(ToolUseSegment),
}

impl Segment {
    /// The source substring that produced this segment.
    pub fn raw(&self) -> &str {
        match self {
            Segment::Text { text } => text,
            Segment::ToolUse(call) => &call.raw,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUseSegment> {
        match self {
            Segment::ToolUse(call) => Some(call),
            Segment::Text { .. } => None,
        }
    }
}

/// Parsed tool invocation from model output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolUseSegment {
    /// Name of the invoked tool. `None` while the name has not arrived yet.
    pub name: Option<String>,
    /// Decoded argument mapping (best-effort while partial)
    #[serde(default)]
    pub input: Map<String, Value>,
    /// Whether the closing delimiter has not yet appeared in the input
    pub partial: bool,
    /// The exact source substring backing this segment, delimiters included
    pub raw: String,
}

/// Aggregate over one parse result, derived entirely from the segment list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseMetadata {
    /// Total tool-use segments, partial and complete
    pub tool_count: usize,
    /// Tool-use segments whose closing delimiter has not arrived
    pub partial_tool_count: usize,
    /// True iff at least one tool call exists and none are partial.
    /// Tool-free text reports `false`: there is no completed tool work.
    pub all_tools_complete: bool,
}

impl ParseMetadata {
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut tool_count = 0;
        let mut partial_tool_count = 0;
        for segment in segments {
            if let Segment::ToolUse(call) = segment {
                tool_count += 1;
                if call.partial {
                    partial_tool_count += 1;
                }
            }
        }
        Self {
            tool_count,
            partial_tool_count,
            all_tools_complete: tool_count > 0 && partial_tool_count == 0,
        }
    }
}

/// Delimiter configuration for tool invocations
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Opening delimiter preceding the JSON payload
    pub start_token: String,
    /// Closing delimiter following the JSON payload
    pub end_token: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            start_token: "<tool_use>".to_string(),
            end_token: "</tool_use>".to_string(),
        }
    }
}

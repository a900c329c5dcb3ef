use serde_json::{Map, Value};

use crate::{
    helpers::{is_complete_json, is_partial_token_prefix},
    partial_json::PartialJson,
    types::{ParseMetadata, Segment, TokenConfig, ToolUseSegment},
};

/// ReAct-style response parser
///
/// Splits a model response that interleaves prose with tagged tool calls:
/// `<tool_use>{"name": "func", "input": {...}}</tool_use>`
///
/// Features:
/// - XML-style tags with a JSON payload
/// - Support for multiple sequential tool calls
/// - Complete vs still-arriving detection for each call
/// - JSON-aware search for the closing tag (a delimiter inside a string
///   value is payload, not a delimiter)
/// - Malformed payloads inside closed tags degrade to plain text
///
/// `parse` is a pure function of the full cumulative text: the provider
/// appends chunks to one buffer and re-parses the whole thing every time,
/// so the parser itself holds no per-stream state and a call completed in
/// one parse can never revert to partial in the next.
pub struct ReactParser {
    /// Delimiter configuration
    tokens: TokenConfig,

    /// Decoder for payloads that are still arriving
    partial_json: PartialJson,
}

/// Outcome of consuming one payload that follows a start token.
enum PayloadScan {
    /// Payload decoded and the closing delimiter was found.
    /// `consumed` counts bytes from the payload start through the end token.
    Complete {
        name: String,
        input: Map<String, Value>,
        consumed: usize,
    },
    /// Closing delimiter found but the payload is not a valid call;
    /// the whole delimited span becomes literal text.
    Degraded { consumed: usize },
    /// No closing delimiter yet; the call is still arriving and the
    /// rest of the input belongs to it.
    Partial {
        name: Option<String>,
        input: Map<String, Value>,
    },
}

impl ReactParser {
    pub fn new() -> Self {
        Self::with_tokens(TokenConfig::default())
    }

    /// Create a parser with non-default delimiters
    pub fn with_tokens(tokens: TokenConfig) -> Self {
        Self {
            tokens,
            partial_json: PartialJson::default(),
        }
    }

    /// Check if text contains tool markers in this parser's format
    pub fn has_tool_markers(&self, text: &str) -> bool {
        text.contains(self.tokens.start_token.as_str())
    }

    /// Parse the full cumulative response text into segments plus metadata.
    ///
    /// Total over all inputs: malformed payloads degrade to text segments
    /// rather than erroring the parse. Concatenating each segment's source
    /// substring in order reproduces `text` exactly.
    pub fn parse(&self, text: &str) -> (Vec<Segment>, ParseMetadata) {
        let start = self.tokens.start_token.as_str();
        let mut segments = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let Some(found) = text[pos..].find(start) else {
                segments.push(Segment::Text {
                    text: text[pos..].to_string(),
                });
                break;
            };

            let open = pos + found;
            if open > pos {
                segments.push(Segment::Text {
                    text: text[pos..open].to_string(),
                });
            }

            let payload_start = open + start.len();
            match self.scan_payload(&text[payload_start..]) {
                PayloadScan::Complete {
                    name,
                    input,
                    consumed,
                } => {
                    segments.push(Segment::ToolUse(ToolUseSegment {
                        name: Some(name),
                        input,
                        partial: false,
                        raw: text[open..payload_start + consumed].to_string(),
                    }));
                    pos = payload_start + consumed;
                }
                PayloadScan::Degraded { consumed } => {
                    tracing::warn!(
                        "tool payload inside closed delimiters is not a valid call, degrading to text"
                    );
                    segments.push(Segment::Text {
                        text: text[open..payload_start + consumed].to_string(),
                    });
                    pos = payload_start + consumed;
                }
                PayloadScan::Partial { name, input } => {
                    segments.push(Segment::ToolUse(ToolUseSegment {
                        name,
                        input,
                        partial: true,
                        raw: text[open..].to_string(),
                    }));
                    pos = text.len();
                }
            }
        }

        let metadata = ParseMetadata::from_segments(&segments);
        (segments, metadata)
    }

    /// Consume one payload starting right after a start token.
    ///
    /// The payload is consumed with the partial-JSON decoder first, so an
    /// end token swallowed inside a JSON string value is never mistaken for
    /// the closing delimiter. Naive substring search is only the fallback
    /// for payloads that are not JSON at all.
    fn scan_payload(&self, rest: &str) -> PayloadScan {
        let end = self.tokens.end_token.as_str();

        let (value, json_len) = match self.partial_json.parse_value(rest) {
            Ok(parsed) => parsed,
            Err(_) => (Value::Null, 0),
        };

        let after = &rest[json_len..];
        let whitespace = after.len() - after.trim_start().len();
        let after_ws = &after[whitespace..];

        if after_ws.starts_with(end) {
            let payload = &rest[..json_len + whitespace];
            let consumed = json_len + whitespace + end.len();
            if json_len > 0 && is_complete_json(payload) {
                if let Some((name, input)) = decode_call(&value) {
                    return PayloadScan::Complete {
                        name,
                        input,
                        consumed,
                    };
                }
            }
            return PayloadScan::Degraded { consumed };
        }

        if after_ws.is_empty() || is_partial_token_prefix(after_ws, end) {
            let (name, input) = partial_call_fields(&value);
            return PayloadScan::Partial { name, input };
        }

        // The decoder stopped short of the remaining text, so the payload is
        // not JSON. If the end token shows up anyway the whole span is prose;
        // until then the call counts as still arriving.
        match after.find(end) {
            Some(found) => PayloadScan::Degraded {
                consumed: json_len + found + end.len(),
            },
            None => {
                let (name, input) = partial_call_fields(&value);
                PayloadScan::Partial { name, input }
            }
        }
    }
}

impl Default for ReactParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a fully-arrived payload into a call.
///
/// Requires a JSON object with a string `name`; the argument mapping is
/// taken from `input` (or its `arguments` alias) and must be an object when
/// present. Anything else is a decode failure and the span degrades.
fn decode_call(value: &Value) -> Option<(String, Map<String, Value>)> {
    let object = value.as_object()?;
    let name = object.get("name")?.as_str()?.to_string();
    let input = match object.get("input").or_else(|| object.get("arguments")) {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return None,
    };
    Some((name, input))
}

/// Best-effort fields for a call that is still arriving. The name may be
/// absent and the input mapping covers only what has parsed so far.
fn partial_call_fields(value: &Value) -> (Option<String>, Map<String, Value>) {
    let Some(object) = value.as_object() else {
        return (None, Map::new());
    };
    let name = object
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let input = match object.get("input").or_else(|| object.get("arguments")) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    (name, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_tool_markers() {
        let parser = ReactParser::new();
        assert!(parser.has_tool_markers("hi <tool_use>"));
        assert!(!parser.has_tool_markers("hi </tool_use>... no opener"));
        assert!(!parser.has_tool_markers("plain prose"));
    }

    #[test]
    fn test_prose_then_complete_call() {
        let parser = ReactParser::new();
        let input = r#"Hi <tool_use>{"name":"write","input":{"path":"f.txt","content":"x"}}</tool_use>"#;
        let (segments, metadata) = parser.parse(input);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].raw(), "Hi ");
        let call = segments[1].as_tool_use().unwrap();
        assert_eq!(call.name.as_deref(), Some("write"));
        assert_eq!(call.input["path"], "f.txt");
        assert_eq!(call.input["content"], "x");
        assert!(!call.partial);

        assert_eq!(metadata.tool_count, 1);
        assert_eq!(metadata.partial_tool_count, 0);
        assert!(metadata.all_tools_complete);
    }

    #[test]
    fn test_decode_call_requires_object_input() {
        assert!(decode_call(&serde_json::json!({"name": "x", "input": 3})).is_none());
        assert!(decode_call(&serde_json::json!({"name": 42})).is_none());
        assert!(decode_call(&serde_json::json!("just a string")).is_none());
        assert!(decode_call(&serde_json::json!({"input": {}})).is_none());

        let (name, input) =
            decode_call(&serde_json::json!({"name": "x", "arguments": {"a": 1}})).unwrap();
        assert_eq!(name, "x");
        assert_eq!(input["a"], 1);
    }
}

//! Streaming tool-call extraction for ReAct-style model responses.
//!
//! A ReAct-style response interleaves prose with tagged tool invocations in
//! one continuous text stream:
//!
//! ```text
//! Let me check that file. <tool_use>{"name": "read", "input": {"path": "f.txt"}}</tool_use>
//! ```
//!
//! Providers deliver the response as ever-growing cumulative text, so the
//! parser must distinguish calls that are syntactically closed from calls
//! that are still arriving, and it must be safe to re-run on every chunk
//! without drift. [`ReactParser::parse`] takes the full text seen so far and
//! returns the ordered segment list plus aggregate metadata;
//! [`CompletionTracker`] sits above it and decides, exactly once per turn,
//! when every tool call is complete.

// Core modules
pub mod completion;
pub mod errors;
pub mod helpers;
pub mod partial_json;
pub mod parser;
pub mod summarizer;
pub mod types;

// Re-export types used outside this crate
pub use completion::{CompletionTracker, TurnPhase};
pub use parser::ReactParser;
pub use partial_json::PartialJson;
pub use summarizer::extract_first_sentence;
pub use types::{ParseMetadata, Segment, TokenConfig, ToolUseSegment};

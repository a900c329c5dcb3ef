//! Completion Tracker Integration Tests
//!
//! Drives the tracker with real parser metadata the way a provider adapter
//! does, including the duplicate stop-signal sequences some providers send.

use std::{cell::Cell, rc::Rc};

use tool_stream::{CompletionTracker, ReactParser, TurnPhase};

mod common;
use common::call;

#[test]
fn test_turn_with_streaming_tool_call() {
    let parser = ReactParser::new();
    let mut tracker = CompletionTracker::new(true);

    // Chunk 1: tool call still arriving
    let (_, metadata) = parser.parse(r#"Hi <tool_use>{"name":"write","input":{"path":"f.txt""#);
    tracker.observe(&metadata);
    assert_eq!(tracker.phase(), TurnPhase::ToolsPending);
    assert!(!tracker.should_suppress_duplicate_callback());

    // Chunk 2: call closed
    let full = format!("Hi {}", call("write", "path", "f.txt"));
    let (_, metadata) = parser.parse(&full);
    tracker.observe(&metadata);
    assert_eq!(tracker.phase(), TurnPhase::ToolsComplete);

    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    assert!(tracker.notify_once(move || counter.set(counter.get() + 1)));
    assert_eq!(fired.get(), 1);

    // The provider signals completion again for the same turn
    assert!(tracker.should_suppress_duplicate_callback());
    let counter = fired.clone();
    assert!(!tracker.notify_once(move || counter.set(counter.get() + 1)));
    assert_eq!(fired.get(), 1, "callback must fire exactly once per turn");
}

#[test]
fn test_suppression_during_tool_execution() {
    let mut tracker = CompletionTracker::new(true);
    let parser = ReactParser::new();

    let (_, metadata) = parser.parse(&call("bash", "command", "ls"));
    tracker.observe(&metadata);

    // Executor picks the tools up; a second stop signal arrives mid-run
    tracker.set_processing_tools(true);
    assert!(tracker.should_suppress_duplicate_callback());

    tracker.set_processing_tools(false);
    assert!(!tracker.should_suppress_duplicate_callback());
    assert!(tracker.notify_once(|| {}));
}

#[test]
fn test_text_only_turn_never_notifies() {
    let parser = ReactParser::new();
    let mut tracker = CompletionTracker::new(true);

    let (_, metadata) = parser.parse("Just a prose answer, no tools.");
    tracker.observe(&metadata);

    assert_eq!(tracker.phase(), TurnPhase::Active);
    assert!(!tracker.notify_once(|| panic!("no tool work to notify about")));
    assert!(!tracker.should_suppress_duplicate_callback());
}

#[test]
fn test_disabled_protocol_suppresses_nothing() {
    let parser = ReactParser::new();
    let mut tracker = CompletionTracker::new(false);

    let (_, metadata) = parser.parse(&call("read", "path", "f.txt"));
    tracker.observe(&metadata);
    tracker.set_processing_tools(true);

    assert_eq!(tracker.phase(), TurnPhase::Idle);
    assert!(!tracker.should_suppress_duplicate_callback());
    assert!(!tracker.notify_once(|| panic!("inert tracker must not fire")));
}

#[test]
fn test_second_call_reopens_before_notification() {
    let parser = ReactParser::new();
    let mut tracker = CompletionTracker::new(true);

    let first = call("read", "path", "a.txt");
    let (_, metadata) = parser.parse(&first);
    tracker.observe(&metadata);
    assert_eq!(tracker.phase(), TurnPhase::ToolsComplete);

    // More of the stream arrives before the adapter got around to notifying
    let grown = format!("{first}<tool_use>{{\"name\":\"read\",\"input\":{{\"pa");
    let (_, metadata) = parser.parse(&grown);
    tracker.observe(&metadata);
    assert_eq!(tracker.phase(), TurnPhase::ToolsPending);
    assert!(!tracker.notify_once(|| panic!("second call still arriving")));

    let done = format!("{first}{}", call("read", "path", "b.txt"));
    let (_, metadata) = parser.parse(&done);
    tracker.observe(&metadata);
    assert!(tracker.notify_once(|| {}));
}

#[test]
fn test_observation_after_notify_is_ignored() {
    let parser = ReactParser::new();
    let mut tracker = CompletionTracker::new(true);

    let (_, metadata) = parser.parse(&call("read", "path", "f.txt"));
    tracker.observe(&metadata);
    assert!(tracker.notify_once(|| {}));

    // Late re-parse of the same turn must not leave the terminal state
    tracker.observe(&metadata);
    assert_eq!(tracker.phase(), TurnPhase::Notified);
    assert!(tracker.should_suppress_duplicate_callback());
}

#[test]
fn test_reset_starts_a_fresh_turn() {
    let parser = ReactParser::new();
    let mut tracker = CompletionTracker::new(true);

    let (_, metadata) = parser.parse(&call("read", "path", "f.txt"));
    tracker.observe(&metadata);
    tracker.notify_once(|| {});
    assert!(tracker.should_suppress_duplicate_callback());

    tracker.reset();
    assert_eq!(tracker.phase(), TurnPhase::Active);
    assert!(!tracker.should_suppress_duplicate_callback());

    // The next turn completes and notifies independently
    tracker.observe(&metadata);
    assert!(tracker.notify_once(|| {}));
}

//! Turn-level completion tracking.
//!
//! Some providers signal "stop for tool use" more than once for the same
//! turn. The tracker owns the per-turn state needed to fire the
//! all-tools-complete callback exactly once and to tell adapters when a
//! late duplicate signal must be ignored.

use crate::types::ParseMetadata;

/// Current phase of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Turn does not use the structured-tag protocol; tracker is inert
    Idle,
    /// Protocol enabled, no tool calls observed yet
    Active,
    /// At least one partial tool call observed and not yet resolved
    ToolsPending,
    /// Every observed tool call is complete; callback not fired yet
    ToolsComplete,
    /// Callback fired; terminal
    Notified,
}

/// Per-turn completion state machine.
///
/// One instance per in-flight model turn, owned by the turn and never
/// shared across turns. The host's event loop serializes all calls; a
/// genuinely concurrent host must wrap each tracker in its own mutex.
#[derive(Debug)]
pub struct CompletionTracker {
    /// Whether this turn uses the structured-tag response protocol
    mode_enabled: bool,
    phase: TurnPhase,
    /// True while the external tool executor is running this turn's tools
    processing_tools: bool,
}

impl CompletionTracker {
    pub fn new(mode_enabled: bool) -> Self {
        Self {
            mode_enabled,
            phase: Self::initial_phase(mode_enabled),
            processing_tools: false,
        }
    }

    fn initial_phase(mode_enabled: bool) -> TurnPhase {
        if mode_enabled {
            TurnPhase::Active
        } else {
            TurnPhase::Idle
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn tools_pending(&self) -> bool {
        self.phase == TurnPhase::ToolsPending
    }

    pub fn completion_notified(&self) -> bool {
        self.phase == TurnPhase::Notified
    }

    pub fn processing_tools(&self) -> bool {
        self.processing_tools
    }

    /// Set by the external tool executor while the turn's tool-execution
    /// phase is underway.
    pub fn set_processing_tools(&mut self, processing: bool) {
        self.processing_tools = processing;
    }

    /// Feed the metadata of the latest parse of the turn's cumulative text.
    ///
    /// No-op once notified, and inert when the protocol is disabled.
    pub fn observe(&mut self, metadata: &ParseMetadata) {
        if !self.mode_enabled || self.phase == TurnPhase::Notified {
            return;
        }

        let next = if metadata.partial_tool_count > 0 {
            TurnPhase::ToolsPending
        } else if metadata.all_tools_complete {
            TurnPhase::ToolsComplete
        } else {
            self.phase
        };

        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, "turn phase transition");
            self.phase = next;
        }
    }

    /// Whether an incoming completion signal is a duplicate that must not
    /// re-trigger tool execution or a follow-up request: the callback has
    /// already fired, or the tool-execution phase is still underway.
    pub fn should_suppress_duplicate_callback(&self) -> bool {
        self.mode_enabled && (self.phase == TurnPhase::Notified || self.processing_tools)
    }

    /// Fire `callback` if every observed tool call is complete and the
    /// callback has not fired yet. Returns whether it fired. Calling again
    /// after it fired is a silent no-op: providers are known to signal
    /// completion more than once.
    pub fn notify_once(&mut self, callback: impl FnOnce()) -> bool {
        if self.phase != TurnPhase::ToolsComplete {
            return false;
        }
        self.phase = TurnPhase::Notified;
        tracing::debug!("all tool calls complete, notifying");
        callback();
        true
    }

    /// Return to the initial state; used at turn teardown.
    pub fn reset(&mut self) {
        self.phase = Self::initial_phase(self.mode_enabled);
        self.processing_tools = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(tool_count: usize, partial_tool_count: usize) -> ParseMetadata {
        ParseMetadata {
            tool_count,
            partial_tool_count,
            all_tools_complete: tool_count > 0 && partial_tool_count == 0,
        }
    }

    #[test]
    fn test_phases_through_a_turn() {
        let mut tracker = CompletionTracker::new(true);
        assert_eq!(tracker.phase(), TurnPhase::Active);

        tracker.observe(&metadata(1, 1));
        assert_eq!(tracker.phase(), TurnPhase::ToolsPending);
        assert!(tracker.tools_pending());

        tracker.observe(&metadata(1, 0));
        assert_eq!(tracker.phase(), TurnPhase::ToolsComplete);

        assert!(tracker.notify_once(|| {}));
        assert_eq!(tracker.phase(), TurnPhase::Notified);
        assert!(tracker.completion_notified());
    }

    #[test]
    fn test_text_only_metadata_never_completes() {
        let mut tracker = CompletionTracker::new(true);
        tracker.observe(&metadata(0, 0));
        assert_eq!(tracker.phase(), TurnPhase::Active);
        assert!(!tracker.notify_once(|| panic!("must not fire")));
    }

    #[test]
    fn test_new_partial_call_reopens_pending() {
        let mut tracker = CompletionTracker::new(true);
        tracker.observe(&metadata(1, 0));
        assert_eq!(tracker.phase(), TurnPhase::ToolsComplete);

        // A second call starts streaming before anyone notified
        tracker.observe(&metadata(2, 1));
        assert_eq!(tracker.phase(), TurnPhase::ToolsPending);
    }

    #[test]
    fn test_disabled_tracker_is_inert() {
        let mut tracker = CompletionTracker::new(false);
        assert_eq!(tracker.phase(), TurnPhase::Idle);

        tracker.observe(&metadata(1, 0));
        assert_eq!(tracker.phase(), TurnPhase::Idle);
        assert!(!tracker.should_suppress_duplicate_callback());
        assert!(!tracker.notify_once(|| panic!("must not fire")));
    }

    #[test]
    fn test_reset() {
        let mut tracker = CompletionTracker::new(true);
        tracker.observe(&metadata(1, 0));
        tracker.set_processing_tools(true);
        tracker.notify_once(|| {});

        tracker.reset();
        assert_eq!(tracker.phase(), TurnPhase::Active);
        assert!(!tracker.processing_tools());
        assert!(!tracker.should_suppress_duplicate_callback());
    }
}

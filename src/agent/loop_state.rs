//! Agent loop state management
//!
//! Tracks where the conversation loop is and how it ended.

use crate::core::{DriverError, Result};

/// Phase of the conversation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Start,
    AwaitResponse,
    DispatchTool,
    AppendResult,
    Terminal,
    Failed,
}

impl LoopPhase {
    /// Whether the loop can leave this phase
    pub fn is_final(self) -> bool {
        matches!(self, LoopPhase::Terminal | LoopPhase::Failed)
    }

    fn can_move_to(self, next: LoopPhase) -> bool {
        use LoopPhase::*;
        match (self, next) {
            (Terminal | Failed, _) => false,
            (_, Failed) => true,
            (Start, AwaitResponse)
            | (AwaitResponse, DispatchTool | Terminal)
            | (DispatchTool, AppendResult)
            | (AppendResult, AwaitResponse | Terminal) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopPhase::Start => "start",
            LoopPhase::AwaitResponse => "await_response",
            LoopPhase::DispatchTool => "dispatch_tool",
            LoopPhase::AppendResult => "append_result",
            LoopPhase::Terminal => "terminal",
            LoopPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// State of the agent loop
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    phase: LoopPhase,
    /// Model responses received so far
    pub turn: usize,
    /// Maximum allowed turns, unbounded when `None`
    pub max_turns: Option<usize>,
}

impl AgentLoopState {
    /// Create a new loop state with an optional turn cap
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            phase: LoopPhase::Start,
            turn: 0,
            max_turns,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Move to `next`, rejecting transitions the loop never makes
    pub fn advance(&mut self, next: LoopPhase) -> Result<()> {
        if !self.phase.can_move_to(next) {
            return Err(DriverError::Other(format!(
                "Invalid loop transition {} -> {}",
                self.phase, next
            )));
        }
        self.phase = next;
        Ok(())
    }

    /// Enter `Failed` from wherever the loop stopped
    pub fn fail(&mut self) {
        if !self.phase.is_final() {
            self.phase = LoopPhase::Failed;
        }
    }

    /// Check if another model request is allowed
    pub fn should_continue(&self) -> bool {
        !self.phase.is_final() && self.max_turns.map_or(true, |max| self.turn < max)
    }

    /// Increment the turn counter
    pub fn next_turn(&mut self) {
        self.turn += 1;
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model stopped without requesting tools
    Completed { text: String },
    /// A tool reported an error and the loop halted
    HaltedOnToolError { tool_use_id: String, error: String },
    /// The configured turn cap was reached
    TurnLimit { turns: usize },
}

impl Outcome {
    /// Text to print for the user, if any
    pub fn final_text(&self) -> Option<&str> {
        match self {
            Outcome::Completed { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_new() {
        let state = AgentLoopState::new(Some(10));
        assert_eq!(state.turn, 0);
        assert_eq!(state.max_turns, Some(10));
        assert_eq!(state.phase(), LoopPhase::Start);
    }

    #[test]
    fn test_should_continue_with_cap() {
        let mut state = AgentLoopState::new(Some(2));
        assert!(state.should_continue());

        state.next_turn();
        assert!(state.should_continue());

        state.next_turn();
        assert!(!state.should_continue());
    }

    #[test]
    fn test_unbounded_runs_until_final() {
        let mut state = AgentLoopState::new(None);
        for _ in 0..1000 {
            state.next_turn();
        }
        assert!(state.should_continue());

        state.advance(LoopPhase::AwaitResponse).unwrap();
        state.advance(LoopPhase::Terminal).unwrap();
        assert!(!state.should_continue());
    }

    #[test]
    fn test_tool_round_trip_transitions() {
        let mut state = AgentLoopState::new(None);
        for phase in [
            LoopPhase::AwaitResponse,
            LoopPhase::DispatchTool,
            LoopPhase::AppendResult,
            LoopPhase::AwaitResponse,
            LoopPhase::DispatchTool,
            LoopPhase::AppendResult,
            LoopPhase::Terminal,
        ] {
            state.advance(phase).unwrap();
        }
        assert_eq!(state.phase(), LoopPhase::Terminal);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut state = AgentLoopState::new(None);
        assert!(state.advance(LoopPhase::DispatchTool).is_err());
        assert!(state.advance(LoopPhase::Terminal).is_err());

        state.advance(LoopPhase::AwaitResponse).unwrap();
        state.advance(LoopPhase::Terminal).unwrap();
        assert!(state.advance(LoopPhase::AwaitResponse).is_err());
        assert!(state.advance(LoopPhase::Failed).is_err());
    }

    #[test]
    fn test_fail_from_any_open_phase() {
        let mut state = AgentLoopState::new(None);
        state.advance(LoopPhase::AwaitResponse).unwrap();
        state.fail();
        assert_eq!(state.phase(), LoopPhase::Failed);

        let mut done = AgentLoopState::new(None);
        done.advance(LoopPhase::AwaitResponse).unwrap();
        done.advance(LoopPhase::Terminal).unwrap();
        done.fail();
        assert_eq!(done.phase(), LoopPhase::Terminal);
    }

    #[test]
    fn test_final_text() {
        let done = Outcome::Completed {
            text: "bye".to_string(),
        };
        assert_eq!(done.final_text(), Some("bye"));
        let halted = Outcome::HaltedOnToolError {
            tool_use_id: "t".to_string(),
            error: "boom".to_string(),
        };
        assert_eq!(halted.final_text(), None);
    }
}

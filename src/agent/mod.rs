//! Agent module - orchestration, session state, and accounting
//!
//! Contains the conversation loop that coordinates model calls and tool execution.

pub mod accounting;
pub mod loop_state;
pub mod orchestrator;
pub mod session;

pub use accounting::{Cost, SessionAccountant, TokenUsage};
pub use loop_state::{AgentLoopState, LoopPhase, Outcome};
pub use orchestrator::Agent;
pub use session::Session;

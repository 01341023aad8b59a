//! LLM module - the model service boundary
//!
//! Provides the client abstraction the orchestrator talks to, with the
//! Anthropic Messages API as the production implementation.

pub mod anthropic;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use traits::{MessageRequest, ModelClient, ModelResponse, Usage};

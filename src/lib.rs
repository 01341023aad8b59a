//! Tooldriver - a tool-using agent loop
//!
//! Sends a prompt to a model service, executes the file-editor and shell
//! tool calls the model requests, and feeds the results back until the model
//! produces a final answer. Token usage and cost are tracked per session.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Model client abstraction with an Anthropic implementation
//! - **Tools**: Path resolver, file editor, shell, and the dispatcher over them
//! - **Agent**: Session state, accounting, and the conversation loop
//! - **Logging**: Per-session structured logs
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tooldriver::{Agent, AnthropicClient, Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> tooldriver::Result<()> {
//!     let config = Config::load();
//!     let client = Arc::new(AnthropicClient::from_config(&config)?);
//!     let mut agent = Agent::new(config, client, Session::new());
//!
//!     let outcome = agent.run("Create hello.txt containing hi").await?;
//!     if let Some(text) = outcome.final_text() {
//!         println!("{}", text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod core;
pub mod llm;
pub mod logging;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, Outcome, Session};
pub use core::{Config, DriverError, Result};
pub use llm::AnthropicClient;

//! Tools module - Tool implementations for the agent
//!
//! Contains the sandboxed file editor, the persistent shell, and the dispatcher
//! that routes model tool calls to them.

pub mod dispatcher;
pub mod editor;
pub mod path;
pub mod shell;

pub use dispatcher::{ToolDispatcher, ToolKind};
pub use editor::EditorTool;
pub use path::PathResolver;
pub use shell::ShellTool;

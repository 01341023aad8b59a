//! Tool dispatcher - routes tool calls to their implementations
//!
//! Maps each tool-use request onto the editor or the shell and wraps the
//! outcome in a tool-result envelope keyed by the call's correlation id.

use crate::core::{Config, ToolCall, ToolDefinition, ToolResult, ToolResultBlock};
use crate::logging::SessionLogger;
use crate::tools::editor::{self, EditorTool};
use crate::tools::path::PathResolver;
use crate::tools::shell::{self, ShellTool};

/// The closed set of tools this crate implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Editor,
    Shell,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::Editor, ToolKind::Shell];

    /// Look up a tool by the name the model used
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            editor::NAME => Some(Self::Editor),
            shell::NAME => Some(Self::Shell),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Editor => editor::NAME,
            Self::Shell => shell::NAME,
        }
    }

    pub fn definition(self) -> ToolDefinition {
        match self {
            Self::Editor => editor::definition(),
            Self::Shell => shell::definition(),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Owns the session's tools and dispatches calls to them
pub struct ToolDispatcher {
    editor: EditorTool,
    shell: ShellTool,
    log: SessionLogger,
}

impl ToolDispatcher {
    /// Build the tools from configuration, each with its own log component
    pub fn new(config: &Config, log: &SessionLogger) -> Self {
        let resolver = PathResolver::new(&config.editor.root, &config.editor.sandbox_prefix);
        Self {
            editor: EditorTool::new(resolver, log.component("editor")),
            shell: ShellTool::new(&config.shell.program, config.shell.mock, log.component("shell")),
            log: log.component("dispatcher"),
        }
    }

    /// Declarations for every tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.iter().map(|kind| kind.definition()).collect()
    }

    pub fn editor(&self) -> &EditorTool {
        &self.editor
    }

    pub fn shell(&self) -> &ShellTool {
        &self.shell
    }

    /// Execute one tool call and wrap its result
    pub async fn dispatch(&mut self, tool_call: &ToolCall) -> ToolResultBlock {
        let result = match ToolKind::from_name(&tool_call.name) {
            Some(ToolKind::Editor) => self.editor.execute(tool_call),
            Some(ToolKind::Shell) => self.shell.execute(tool_call).await,
            None => {
                self.log
                    .warn(format!("Model requested unsupported tool '{}'", tool_call.name));
                ToolResult::failure(
                    &tool_call.name,
                    format!("Unsupported tool: {}", tool_call.name),
                )
            }
        };

        self.log.debug(format!(
            "{} ({}) -> {}",
            tool_call.name,
            tool_call.id,
            if result.success { "ok" } else { "error" }
        ));

        ToolResultBlock::from_result(&tool_call.id, result)
    }

    /// Execute a turn's tool calls in order.
    ///
    /// With `stop_on_error`, calls after the first failing one are not run.
    pub async fn dispatch_all(
        &mut self,
        tool_calls: &[ToolCall],
        stop_on_error: bool,
    ) -> Vec<ToolResultBlock> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for (i, tool_call) in tool_calls.iter().enumerate() {
            let result = self.dispatch(tool_call).await;
            let failed = result.is_error;
            results.push(result);

            if failed && stop_on_error {
                let skipped = tool_calls.len() - i - 1;
                if skipped > 0 {
                    self.log
                        .warn(format!("Skipping {} remaining tool call(s) after error", skipped));
                }
                break;
            }
        }

        results
    }
}

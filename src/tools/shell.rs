//! Shell tool
//!
//! Runs commands through a shell against a session-scoped environment.
//! Exported variables and the working directory carry over between commands
//! until the tool is restarted.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use uuid::Uuid;

use crate::core::{DriverError, Result, ToolCall, ToolDefinition, ToolResult};
use crate::logging::SessionLogger;

/// Name the model uses for this tool
pub const NAME: &str = "bash";
/// Built-in tool type this tool implements
pub const TOOL_TYPE: &str = "bash_20241022";

/// Variable pointing the wrapper script at its environment capture file
const CAPTURE_VAR: &str = "TOOLDRIVER_ENV_CAPTURE";

/// Declaration sent to the model service
pub fn definition() -> ToolDefinition {
    ToolDefinition::builtin(TOOL_TYPE, NAME)
}

/// Raw output of one command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Apply the exit-code policy: stdout on success, stderr on failure
    pub fn into_tool_result(self) -> ToolResult {
        if self.exit_code == Some(0) {
            return ToolResult::success(NAME, self.stdout.trim());
        }

        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            let code = self
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            ToolResult::failure(NAME, format!("Command failed with exit code {}", code))
        } else {
            ToolResult::failure(NAME, stderr)
        }
    }
}

/// Shell with a persistent environment
pub struct ShellTool {
    program: String,
    environment: HashMap<String, String>,
    mock: bool,
    log: SessionLogger,
}

impl ShellTool {
    /// Create a shell seeded from the process environment
    pub fn new(program: impl Into<String>, mock: bool, log: SessionLogger) -> Self {
        Self {
            program: program.into(),
            environment: process_environment(),
            mock,
            log,
        }
    }

    /// Current value of a variable in the session environment
    pub fn var(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// Reset the environment to a fresh copy of the process environment
    pub fn restart(&mut self) {
        self.environment = process_environment();
        self.log.info("Shell environment restarted");
    }

    /// Execute one shell call; failures come back as error results
    pub async fn execute(&mut self, tool_call: &ToolCall) -> ToolResult {
        if tool_call.get_bool("restart").unwrap_or(false) {
            self.restart();
            return ToolResult::success(NAME, "tool has been restarted.");
        }

        let Some(command) = tool_call.get_string("command") else {
            self.log.error(format!("Shell call {} has no command", tool_call.id));
            return ToolResult::failure(NAME, "Missing required field 'command'");
        };

        if self.mock {
            self.log.info(format!("Mock mode, not running: {}", command));
            return ToolResult::success(
                NAME,
                format!("[mock] command did not run: {}", command),
            );
        }

        self.log.info(format!("Running: {}", command));
        match self.run(&command).await {
            Ok(output) => {
                if !output.stderr.trim().is_empty() {
                    self.log.warn(format!("stderr: {}", output.stderr.trim()));
                }
                let result = output.into_tool_result();
                if !result.success {
                    self.log.error(format!("Command failed: {}", result.output));
                }
                result
            }
            Err(e) => {
                self.log.error(format!("Failed to run command: {}", e));
                ToolResult::failure(NAME, e.to_string())
            }
        }
    }

    /// Run `command`, then fold the shell's final environment back in
    pub async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let capture = env::temp_dir().join(format!("tooldriver-env-{}", Uuid::new_v4()));
        // The command travels as $1 so its text never merges with the wrapper
        let script = format!(
            "__tooldriver_cmd=$1\nshift\neval \"$__tooldriver_cmd\"\n__tooldriver_status=$?\n\
             env -0 > \"${}\" 2>/dev/null\nexit $__tooldriver_status\n",
            CAPTURE_VAR
        );

        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg(script)
            .arg(&self.program)
            .arg(command)
            .env_clear()
            .envs(&self.environment)
            .env(CAPTURE_VAR, &capture)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = self.working_dir() {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| {
            DriverError::with_context(format!("Failed to spawn '{}'", self.program), e)
        })?;

        self.absorb_capture(&capture);

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    fn working_dir(&self) -> Option<PathBuf> {
        self.environment
            .get("PWD")
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir())
    }

    fn absorb_capture(&mut self, capture: &Path) {
        // Missing when the command exited the shell early
        let Ok(bytes) = fs::read(capture) else {
            return;
        };
        let _ = fs::remove_file(capture);

        let mut environment = parse_env(&bytes);
        environment.remove(CAPTURE_VAR);
        if !environment.is_empty() {
            self.environment = environment;
        }
    }
}

/// Process environment, skipping entries that are not valid UTF-8
fn process_environment() -> HashMap<String, String> {
    env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Parse NUL-separated `KEY=VALUE` entries
fn parse_env(bytes: &[u8]) -> HashMap<String, String> {
    bytes
        .split(|b| *b == 0)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let entry = String::from_utf8_lossy(entry);
            let (key, value) = entry.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

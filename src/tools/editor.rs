//! File editor tool
//!
//! Implements the `view`, `create`, `str_replace`, `insert` and `undo_edit`
//! commands of the text editor tool. Every path goes through [`PathResolver`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::{DriverError, Result, ToolCall, ToolDefinition, ToolResult};
use crate::logging::SessionLogger;
use crate::tools::path::PathResolver;

/// Name the model uses for this tool
pub const NAME: &str = "str_replace_editor";
/// Built-in tool type this tool implements
pub const TOOL_TYPE: &str = "text_editor_20241022";

/// Declaration sent to the model service
pub fn definition() -> ToolDefinition {
    ToolDefinition::builtin(TOOL_TYPE, NAME)
}

/// A file editor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    View,
    Create,
    StrReplace,
    Insert,
    UndoEdit,
}

impl FromStr for EditorCommand {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "str_replace" => Ok(Self::StrReplace),
            "insert" => Ok(Self::Insert),
            "undo_edit" => Ok(Self::UndoEdit),
            other => Err(DriverError::tool(format!(
                "Unknown command '{}'. Allowed commands: {}",
                other, "view, create, str_replace, insert, undo_edit"
            ))),
        }
    }
}

/// Text editor confined to one root directory
pub struct EditorTool {
    resolver: PathResolver,
    /// Prior contents per file, newest last; `None` means the file did not exist
    history: HashMap<PathBuf, Vec<Option<String>>>,
    log: SessionLogger,
}

fn required(call: &ToolCall, key: &str) -> Result<String> {
    call.get_string(key)
        .ok_or_else(|| DriverError::tool(format!("Missing required field '{}'", key)))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        DriverError::with_context(format!("Failed to read '{}'", path.display()), e)
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| {
        DriverError::with_context(format!("Failed to write '{}'", path.display()), e)
    })
}

impl EditorTool {
    /// Create an editor over the resolver's root
    pub fn new(resolver: PathResolver, log: SessionLogger) -> Self {
        Self {
            resolver,
            history: HashMap::new(),
            log,
        }
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Execute one editor call; failures come back as error results
    pub fn execute(&mut self, tool_call: &ToolCall) -> ToolResult {
        match self.run(tool_call) {
            Ok(output) => ToolResult::success(NAME, output),
            Err(e) => {
                self.log.error(format!("Editor call {} failed: {}", tool_call.id, e));
                ToolResult::failure(NAME, e.to_string())
            }
        }
    }

    fn run(&mut self, tool_call: &ToolCall) -> Result<String> {
        let command: EditorCommand = required(tool_call, "command")?.parse()?;
        let path = required(tool_call, "path")?;

        self.log.info(format!("{:?} {}", command, path));

        match command {
            EditorCommand::View => {
                let range = tool_call.get_i64_list("view_range");
                self.view(&path, range.as_deref())
            }
            EditorCommand::Create => {
                let file_text = required(tool_call, "file_text")?;
                self.create(&path, &file_text)
            }
            EditorCommand::StrReplace => {
                let old_str = required(tool_call, "old_str")?;
                let new_str = tool_call.get_string("new_str");
                self.str_replace(&path, &old_str, new_str.as_deref())
            }
            EditorCommand::Insert => {
                let insert_line = tool_call.get_u64("insert_line").ok_or_else(|| {
                    DriverError::tool("Missing required field 'insert_line'")
                })?;
                let new_str = required(tool_call, "new_str")?;
                self.insert(&path, insert_line as usize, &new_str)
            }
            EditorCommand::UndoEdit => self.undo_edit(&path),
        }
    }

    fn existing(&self, path: &str) -> Result<PathBuf> {
        let resolved = self.resolver.resolve(path)?;
        if !resolved.exists() {
            return Err(DriverError::tool(format!(
                "The path {} does not exist",
                path
            )));
        }
        Ok(resolved)
    }

    /// Return a file's content, a line range of it, or a directory listing
    pub fn view(&self, path: &str, view_range: Option<&[i64]>) -> Result<String> {
        let resolved = self.existing(path)?;

        if resolved.is_dir() {
            if view_range.is_some() {
                return Err(DriverError::tool(
                    "The view_range parameter is not allowed when path points to a directory",
                ));
            }
            return list_dir(&resolved);
        }

        let content = read_file(&resolved)?;
        match view_range {
            None => Ok(content),
            Some(range) => slice_lines(&content, range),
        }
    }

    /// Write `file_text` to `path`, replacing any existing file
    pub fn create(&mut self, path: &str, file_text: &str) -> Result<String> {
        let resolved = self.resolver.resolve_for_write(path)?;
        if resolved.is_dir() {
            return Err(DriverError::tool(format!("The path {} is a directory", path)));
        }

        let previous = if resolved.exists() {
            Some(read_file(&resolved)?)
        } else {
            None
        };
        write_file(&resolved, file_text)?;
        self.remember(resolved.clone(), previous);

        Ok(format!(
            "File created successfully at: {}",
            self.resolver.display_path(&resolved)
        ))
    }

    /// Replace the first occurrence of `old_str`; a missing `new_str` deletes it
    pub fn str_replace(
        &mut self,
        path: &str,
        old_str: &str,
        new_str: Option<&str>,
    ) -> Result<String> {
        if old_str.is_empty() {
            return Err(DriverError::tool("old_str must not be empty"));
        }

        let resolved = self.existing(path)?;
        let content = read_file(&resolved)?;

        let occurrences = content.matches(old_str).count();
        if occurrences == 0 {
            return Err(DriverError::tool(format!(
                "No replacement was performed, old_str `{}` did not appear verbatim in {}",
                old_str, path
            )));
        }
        if occurrences > 1 {
            self.log.warn(format!(
                "old_str occurs {} times in {}; replacing the first",
                occurrences, path
            ));
        }

        let updated = content.replacen(old_str, new_str.unwrap_or(""), 1);
        write_file(&resolved, &updated)?;
        self.remember(resolved, Some(content));

        Ok(format!("The file {} has been edited.", path))
    }

    /// Insert `new_str` as a line before 0-based line index `insert_line`
    pub fn insert(&mut self, path: &str, insert_line: usize, new_str: &str) -> Result<String> {
        let resolved = self.existing(path)?;
        let content = read_file(&resolved)?;

        let updated = insert_at_line(&content, insert_line, new_str)?;
        write_file(&resolved, &updated)?;
        self.remember(resolved, Some(content));

        Ok(format!("The file {} has been edited.", path))
    }

    /// Revert the most recent edit to `path`
    pub fn undo_edit(&mut self, path: &str) -> Result<String> {
        let resolved = self.resolver.resolve(path)?;
        let previous = self
            .history
            .get_mut(&resolved)
            .and_then(|versions| versions.pop())
            .ok_or_else(|| DriverError::tool(format!("No edit history found for {}", path)))?;

        match previous {
            Some(text) => write_file(&resolved, &text)?,
            None => fs::remove_file(&resolved).map_err(|e| {
                DriverError::with_context(format!("Failed to remove '{}'", resolved.display()), e)
            })?,
        }

        Ok(format!("Last edit to {} undone successfully.", path))
    }

    fn remember(&mut self, path: PathBuf, previous: Option<String>) {
        self.history.entry(path).or_default().push(previous);
    }
}

/// Split into lines, remembering whether the text ended with a newline
fn split_lines(content: &str) -> (Vec<&str>, bool) {
    if content.is_empty() {
        return (Vec::new(), false);
    }
    match content.strip_suffix('\n') {
        Some(body) => (body.split('\n').collect(), true),
        None => (content.split('\n').collect(), false),
    }
}

fn insert_at_line(content: &str, insert_line: usize, new_str: &str) -> Result<String> {
    let (mut lines, trailing_newline) = split_lines(content);
    if insert_line > lines.len() {
        return Err(DriverError::tool(format!(
            "Invalid insert_line {}: the file has {} lines",
            insert_line,
            lines.len()
        )));
    }

    lines.insert(insert_line, new_str);
    let mut updated = lines.join("\n");
    if trailing_newline {
        updated.push('\n');
    }
    Ok(updated)
}

fn slice_lines(content: &str, range: &[i64]) -> Result<String> {
    let [start, end] = range else {
        return Err(DriverError::tool("view_range must contain exactly two integers"));
    };
    let (lines, _) = split_lines(content);
    let count = lines.len() as i64;

    if *start < 1 || *start > count {
        return Err(DriverError::tool(format!(
            "Invalid view_range start {}: must be within [1, {}]",
            start, count
        )));
    }
    let end = if *end == -1 { count } else { *end };
    if end < *start || end > count {
        return Err(DriverError::tool(format!(
            "Invalid view_range end {}: must be -1 or within [{}, {}]",
            end, start, count
        )));
    }

    Ok(lines[(*start - 1) as usize..end as usize].join("\n"))
}

fn list_dir(dir: &Path) -> Result<String> {
    let entries = fs::read_dir(dir).map_err(|e| {
        DriverError::with_context(format!("Failed to list '{}'", dir.display()), e)
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();
    Ok(names.join("\n"))
}

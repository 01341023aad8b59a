//! Session logging
//!
//! Wraps `tracing` with a console layer and a per-session JSON file, and
//! provides [`SessionLogger`], the sink each component receives at construction.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::{DriverError, Result};

/// File name of the JSON log for a session
pub fn session_log_file(session_id: impl Display) -> String {
    format!("session-{}.log", session_id)
}

/// Initialize the global subscriber for one session.
///
/// Console output goes to stderr so stdout stays reserved for the final answer.
/// Returns the path of the session's JSON log file.
pub fn init_logger(log_dir: &Path, level: &str, session_id: impl Display) -> Result<PathBuf> {
    fs::create_dir_all(log_dir).map_err(|e| {
        DriverError::with_context(format!("Failed to create log dir '{}'", log_dir.display()), e)
    })?;

    let file_name = session_log_file(session_id);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, &file_name);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(log_dir.join(file_name))
}

/// Log sink tagged with a session id and a component prefix
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: Arc<str>,
    component: &'static str,
}

impl SessionLogger {
    /// Create the root logger for a session
    pub fn new(session_id: impl Display) -> Self {
        Self {
            session_id: Arc::from(session_id.to_string()),
            component: "session",
        }
    }

    /// Derive a logger for another component of the same session
    pub fn component(&self, component: &'static str) -> Self {
        Self {
            session_id: Arc::clone(&self.session_id),
            component,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn component_name(&self) -> &'static str {
        self.component
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(session = %self.session_id, component = self.component, "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(session = %self.session_id, component = self.component, "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(session = %self.session_id, component = self.component, "{}", message);
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(session = %self.session_id, component = self.component, "{}", message);
    }
}

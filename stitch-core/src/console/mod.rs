//! Structured console output channels.
//!
//! The engine reports user-visible status through three channels; nothing in
//! the core branches on what a sink does with them.

use std::sync::Mutex;

pub trait ConsoleSink: Send + Sync {
    fn tool_output(&self, message: &str);
    fn tool_error(&self, message: &str);
    fn system_output(&self, message: &str);
}

/// Default sink mapping the channels onto tracing.
#[derive(Debug, Clone, Default)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn tool_output(&self, message: &str) {
        tracing::info!(target: "stitch::console", "{message}");
    }

    fn tool_error(&self, message: &str) {
        tracing::warn!(target: "stitch::console", "{message}");
    }

    fn system_output(&self, message: &str) {
        tracing::info!(target: "stitch::console", "{message}");
    }
}

/// Which channel a recorded line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    ToolOutput,
    ToolError,
    SystemOutput,
}

/// Captures console lines for assertions in tests and host previews.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<(Channel, String)>>,
}

impl RecordingConsole {
    pub fn lines(&self) -> Vec<(Channel, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(channel, _)| *channel == Channel::ToolError)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl ConsoleSink for RecordingConsole {
    fn tool_output(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((Channel::ToolOutput, message.to_string()));
    }

    fn tool_error(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((Channel::ToolError, message.to_string()));
    }

    fn system_output(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((Channel::SystemOutput, message.to_string()));
    }
}

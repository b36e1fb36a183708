//! The context shared by every filter of an application.
//!
//! A filter reaches its context through [`crate::FilterConfig::context`]. The context is where
//! log lines end up and where filters can leave string attributes for each other.

use dashmap::DashMap;
use parking_lot::Mutex;

/// The shared context a filter's configuration points at.
#[cfg_attr(test, mockall::automock)]
pub trait Context: Send + Sync {
    /// Write a message to the context's log.
    fn log(&self, message: &str);

    /// Look up a context attribute. Returns `None` if it was never set or has been removed.
    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&self, name: &str, value: String);

    fn remove_attribute(&self, name: &str);
}

/// A [`Context`] that forwards log lines to `tracing`.
#[derive(Debug, Default)]
pub struct TracingContext {
    attributes: DashMap<String, String>,
}

impl TracingContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Context for TracingContext {
    fn log(&self, message: &str) {
        tracing::info!(target: "filter_api::context", "{message}");
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).map(|value| value.clone())
    }

    fn set_attribute(&self, name: &str, value: String) {
        self.attributes.insert(name.to_string(), value);
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes.remove(name);
    }
}

/// A [`Context`] that keeps every logged line in memory.
#[derive(Debug, Default)]
pub struct RecordingContext {
    lines: Mutex<Vec<String>>,
    attributes: DashMap<String, String>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the lines logged so far, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Drains the recorded lines.
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl Context for RecordingContext {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).map(|value| value.clone())
    }

    fn set_attribute(&self, name: &str, value: String) {
        self.attributes.insert(name.to_string(), value);
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes.remove(name);
    }
}

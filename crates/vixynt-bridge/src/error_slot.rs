use std::fmt::Display;

use tracing::error;

/// The single user-visible "last error" message. Each operation either
/// replaces it with its own failure or clears it on success.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorSlot {
    message: Option<String>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(%message, "operation failed");
        self.message = Some(message);
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn get(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Store the outcome of an operation and pass the success value through.
    pub fn record<T, E: Display>(&mut self, result: Result<T, E>) -> Option<T> {
        self.record_as("", result)
    }

    /// Like [`record`](Self::record) but prefixes failures, e.g.
    /// `"Generation failed"`.
    pub fn record_as<T, E: Display>(&mut self, context: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                self.clear();
                Some(value)
            }
            Err(err) if context.is_empty() => {
                self.set(err.to_string());
                None
            }
            Err(err) => {
                self.set(format!("{context}: {err}"));
                None
            }
        }
    }
}

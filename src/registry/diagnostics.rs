//! Bounded diagnostic message queue.

use std::collections::VecDeque;

use tracing::debug;

/// Default number of messages kept before truncation.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// Message appended once when the queue is full.
pub const TRUNCATED_MESSAGE: &str = "Additional Messages Truncated.";

/// FIFO of human-readable diagnostics for one loaded file.
///
/// Holds at most `capacity` messages followed by a single truncation
/// sentinel. Further messages are dropped until the queue is drained.
#[derive(Debug, Clone)]
pub struct DiagnosticQueue {
    messages: VecDeque<String>,
    capacity: usize,
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_MESSAGES)
    }
}

impl DiagnosticQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity,
        }
    }

    /// Queues a message. Empty messages are ignored since an empty string
    /// marks a drained queue.
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }

        debug!(diagnostic = %message, "Config diagnostic queued");

        if self.messages.len() < self.capacity {
            self.messages.push_back(message);
        } else if self.messages.len() == self.capacity {
            self.messages.push_back(TRUNCATED_MESSAGE.to_string());
        }
    }

    /// Removes and returns the oldest message, or an empty string if none.
    pub fn poll(&mut self) -> String {
        self.messages.pop_front().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

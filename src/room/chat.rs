use std::collections::VecDeque;

use crate::config::room::CHAT_HISTORY_LEN;
use super::types::ChatMessage;

/// Bounded lobby chat history of one room. Oldest messages are evicted first.
#[derive(Debug, Clone)]
pub struct ChatRing {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl ChatRing {
    pub fn new() -> Self {
        Self::with_capacity(CHAT_HISTORY_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a message, dropping the oldest one once the ring is over capacity.
    pub fn post(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Current contents, oldest first.
    pub fn replay(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatRing {
    fn default() -> Self {
        Self::new()
    }
}

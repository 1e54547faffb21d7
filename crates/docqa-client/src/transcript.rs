//! Ordered chat transcript.
//!
//! Messages are only ever appended or mutated in place; nothing is removed.
//! Every mutation snaps the view back to the bottom.

use crate::types::{ChatMessage, MessageId, Sender};

/// The running list of chat messages.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
    /// Lines scrolled up from the bottom. 0 = pinned to the newest message.
    scroll: usize,
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, or overwrite the last one.
    ///
    /// With `replace_last` set and the newest message from the same sender,
    /// that message's content is replaced and its id returned. Otherwise a new
    /// message is pushed.
    pub fn append(
        &mut self,
        sender: Sender,
        content: impl Into<String>,
        replace_last: bool,
    ) -> MessageId {
        let content = content.into();

        if replace_last {
            if let Some(last) = self.messages.last_mut() {
                if last.sender == sender {
                    let id = last.id;
                    set_content(last, content);
                    self.scroll = 0;
                    return id;
                }
            }
        }

        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage::new(id, sender, content));
        self.scroll = 0;
        id
    }

    /// Add a visual block to an existing message.
    ///
    /// Returns `false` if the id is unknown.
    pub fn append_block(&mut self, id: MessageId, block: impl Into<String>) -> bool {
        let Some(msg) = self.get_mut(id) else {
            return false;
        };
        msg.blocks.push(block.into());
        self.scroll = 0;
        true
    }

    /// Replace a message's content wholesale.
    ///
    /// Returns `false` if the id is unknown.
    pub fn replace(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        let Some(msg) = self.get_mut(id) else {
            return false;
        };
        set_content(msg, content.into());
        self.scroll = 0;
        true
    }

    /// Look up a message by id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        // Ids are assigned in push order, so the vec is sorted by id.
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|i| &self.messages[i])
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|i| &mut self.messages[i])
    }

    /// The newest message.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate messages in append order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Current scroll offset, in lines from the bottom.
    #[must_use]
    pub const fn scroll(&self) -> usize {
        self.scroll
    }

    /// Scroll up (view older messages).
    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll = self.scroll.saturating_add(amount);
    }

    /// Scroll down (view newer messages).
    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll = self.scroll.saturating_sub(amount);
    }
}

fn set_content(msg: &mut ChatMessage, content: String) {
    msg.blocks.clear();
    if !content.is_empty() {
        msg.blocks.push(content);
    }
}

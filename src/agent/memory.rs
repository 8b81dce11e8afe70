use tracing::info;

use crate::llm::Message;

/// Full audit history plus the active window actually sent to the model.
///
/// The window always starts with the single system preamble; resets shrink it
/// back to that message while the history keeps every message of the run.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    history: Vec<Message>,
    window: Vec<Message>,
}

impl ConversationMemory {
    pub fn new(system_preamble: impl Into<String>) -> Self {
        let preamble = Message::system(system_preamble);
        Self {
            history: vec![preamble.clone()],
            window: vec![preamble],
        }
    }

    pub fn add_message(&mut self, message: Message) {
        self.window.push(message.clone());
        self.history.push(message);
    }

    pub fn window(&self) -> &[Message] {
        &self.window
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Truncate the window to the preamble. Returns how many messages were dropped.
    pub fn reset_window(&mut self, echo: bool) -> usize {
        let dropped = self.window.len().saturating_sub(1);
        if echo {
            for m in self.discardable() {
                info!(target: "conversation", role = %m.role, "{}", m.content);
            }
        }
        self.window.truncate(1);
        dropped
    }

    /// Window messages a reset drops; everything after the preamble.
    fn discardable(&self) -> &[Message] {
        self.window.get(1..).unwrap_or_default()
    }

    pub fn into_history(self) -> Vec<Message> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_single_preamble() {
        let memory = ConversationMemory::new("Du bist ein Rechtsassistent.");
        assert_eq!(memory.window().len(), 1);
        assert_eq!(memory.window()[0].role, "system");
        assert_eq!(memory.history(), memory.window());
    }

    #[test]
    fn reset_keeps_preamble_and_history() {
        let mut memory = ConversationMemory::new("system");
        memory.add_message(Message::user("frage"));
        memory.add_message(Message::assistant("{}"));
        assert_eq!(memory.window().len(), 3);

        assert_eq!(memory.reset_window(true), 2);
        assert_eq!(memory.window(), &[Message::system("system")]);
        assert_eq!(memory.history().len(), 3);

        // resetting an already reset window is a no-op
        assert_eq!(memory.reset_window(false), 0);
        assert_eq!(memory.window().len(), 1);
        assert_eq!(memory.history().len(), 3);
    }

    #[test]
    fn history_grows_across_resets() {
        let mut memory = ConversationMemory::new("system");
        for round in 0..3 {
            memory.add_message(Message::user(format!("runde {round}")));
            memory.reset_window(false);
        }
        assert_eq!(memory.history().len(), 4);
        assert_eq!(memory.window().len(), 1);
        assert_eq!(memory.into_history()[3].content, "runde 2");
    }

    #[test]
    fn reset_discards_only_messages_after_preamble() {
        let mut memory = ConversationMemory::new("system");
        assert!(memory.discardable().is_empty());
        memory.add_message(Message::user("frage"));
        memory.add_message(Message::assistant("{}"));

        let discarded: Vec<&str> = memory
            .discardable()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(discarded, vec!["frage", "{}"]);
        let discarded_len = discarded.len();
        assert_eq!(memory.reset_window(false), discarded_len);
    }
}

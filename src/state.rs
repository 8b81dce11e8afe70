use std::time::Duration;

/// Bounds and knobs for one agent run (and every nested run it spawns).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Navigation rounds before a run gives up with `NoAnswerFound`.
    pub max_iterations: u32,
    /// Corrective prompts sent after a malformed or off-schema reply.
    pub max_schema_retries: u32,
    /// Runs at this depth or deeper do not resolve jargon terms.
    pub max_term_depth: u32,
    /// Statutes whose text exceeds this many characters are narrowed by section.
    pub long_statute_threshold: usize,
    /// Courtesy pause after every model call.
    pub call_delay: Duration,
    /// Log discarded messages whenever the active window is reset.
    pub echo_resets: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_schema_retries: 3,
            max_term_depth: 2,
            long_statute_threshold: 1000,
            call_delay: Duration::from_millis(500),
            echo_resets: true,
        }
    }
}

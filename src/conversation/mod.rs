// Conversation module
// Per-session transcript of question/answer turns


use std::fmt::Write as _;

/// One question and the answer shown for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub query: String,
    pub answer: String,
}

/// Ordered, append-only history of one session.
///
/// Nothing is ever removed. Bounding the context sent to a provider is done at render
/// time with [`render_window`](Self::render_window).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn append(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            query: query.into(),
            answer: answer.into(),
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The full transcript as `User:`/`Bot:` lines, oldest first. Empty history renders as `""`.
    #[inline]
    pub fn render(&self) -> String {
        render_turns(&self.turns)
    }

    /// Like [`render`](Self::render) but limited to the most recent `window` turns
    /// when a window is given
    #[inline]
    pub fn render_window(&self, window: Option<usize>) -> String {
        match window {
            Some(n) => render_turns(&self.turns[self.turns.len().saturating_sub(n)..]),
            None => self.render(),
        }
    }
}

fn render_turns(turns: &[Turn]) -> String {
    let mut transcript = String::new();
    for (i, turn) in turns.iter().enumerate() {
        if i > 0 {
            transcript.push('\n');
        }
        // Writing to a String cannot fail
        let _ = write!(transcript, "User: {}\nBot: {}", turn.query, turn.answer);
    }
    transcript
}

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const GREETING: &str =
    "안녕하세요! 신발 색상을 변경해드릴게요. \"밑창을 빨간색으로\", \"전체를 검정색으로\" 같은 자연어로 말씀해주세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-session transcript, seeded with the assistant greeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl Default for ChatHistory {
    fn default() -> Self {
        let mut history = Self {
            messages: Vec::new(),
        };
        history.push(ChatRole::Assistant, GREETING);
        history
    }
}

impl ChatHistory {
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

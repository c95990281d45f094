// SPDX-License-Identifier: MIT

//! Conversation messages

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// One turn of the conversation, either authored by the agent or supplied
/// from outside the run (the user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    Agent(String),
    User(String),
}

impl Message {
    pub fn agent(content: impl Into<String>) -> Self {
        Message::Agent(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User(content.into())
    }

    pub fn content(&self) -> &str {
        match self {
            Message::Agent(c) | Message::User(c) => c,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        match message {
            Message::Agent(content) => json!({ "role": "agent", "content": content }),
            Message::User(content) => json!({ "role": "user", "content": content }),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Agent(c) => write!(f, "Agent: {}", c),
            Message::User(c) => write!(f, "You: {}", c),
        }
    }
}

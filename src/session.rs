use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::Message;

/// One conversation. The message list is append-only: entries are never
/// edited or removed once pushed, so a failed turn must stage its messages
/// elsewhere and only commit here on success.
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: Option<String>,
    pub model: Option<String>,
}

impl Session {
    pub fn new(title: Option<&str>, model: Option<&str>) -> Session {
        Session {
            id: Uuid::new_v4().to_string(),
            messages: Vec::<Message>::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            title: title.map(|s| s.to_string()),
            model: model.map(|s| s.to_string()),
        }
    }

    /// Start a session already carrying the persona preamble.
    pub fn with_system_instruction(instruction: &str, model: Option<&str>) -> Session {
        let mut session = Session::new(None, model);
        session.add_message(Message::system(instruction));
        session
    }

    // Append one message
    pub fn add_message(&mut self, msg: Message) {
        self.messages.push(msg);
        self.updated_at = Utc::now();
    }
}

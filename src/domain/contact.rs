use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checkout::is_email;
use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a visitor submits through the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [&self.name, &self.email, &self.subject, &self.message];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(DomainError::InvalidInput("All fields are required.".to_string()));
        }
        if !is_email(self.email.trim()) {
            return Err(DomainError::InvalidInput("email is invalid".to_string()));
        }
        Ok(())
    }
}

/// A contact message as the admin inbox lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    #[serde(rename = "_id")]
    pub id: MessageId,
    #[serde(flatten)]
    pub content: ContactMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Case-insensitive search over sender name, email and subject.
pub fn filter_messages<'a>(messages: &'a [StoredMessage], term: &str) -> Vec<&'a StoredMessage> {
    let term = term.trim().to_lowercase();
    messages
        .iter()
        .filter(|m| {
            let c = &m.content;
            c.name.to_lowercase().contains(&term)
                || c.email.to_lowercase().contains(&term)
                || c.subject.to_lowercase().contains(&term)
        })
        .collect()
}

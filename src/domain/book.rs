use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Server-assigned book identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub price: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Picture attached to a book draft. Sent as the `image` part of the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Admin form for creating a book or rewriting an existing one. Without an
/// image the server keeps the current picture.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub price: BigDecimal,
    pub image: Option<ImageUpload>,
}

impl BookDraft {
    /// Prefills the form from an existing record.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            description: book.description.clone().unwrap_or_default(),
            price: book.price.clone(),
            image: None,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidInput(format!("{} is required", name)));
            }
        }
        if self.price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput("price cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Text fields of the upload, in form order.
    pub fn text_fields(&self) -> [(&'static str, String); 5] {
        [
            ("title", self.title.trim().to_string()),
            ("author", self.author.trim().to_string()),
            ("category", self.category.trim().to_string()),
            ("description", self.description.trim().to_string()),
            ("price", self.price.normalized().to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedUpdate {
    pub featured: bool,
}

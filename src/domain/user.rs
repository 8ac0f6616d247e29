use std::fmt;

use serde::{Deserialize, Serialize};

use super::checkout::is_email;
use super::errors::DomainError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Admin edit of another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// A bearer token and the account it was issued for. Login and
/// registration answer with one, and the server re-issues one when the
/// profile changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), DomainError> {
        require_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::InvalidInput("password is required".to_string()));
        }
        require_password_len(&self.password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// `confirm` is the repeated password; it is checked here and never sent.
    pub fn validate(&self, confirm: &str) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("name is required".to_string()));
        }
        require_email(&self.email)?;
        require_password_len(&self.password)?;
        if self.password != confirm {
            return Err(DomainError::InvalidInput("passwords do not match".to_string()));
        }
        Ok(())
    }
}

fn require_email(email: &str) -> Result<(), DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::InvalidInput("email is required".to_string()));
    }
    if !is_email(email) {
        return Err(DomainError::InvalidInput("email is invalid".to_string()));
    }
    Ok(())
}

fn require_password_len(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// Case-insensitive search over name and email.
pub fn filter_users<'a>(users: &'a [User], term: &str) -> Vec<&'a User> {
    let term = term.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            u.name.to_lowercase().contains(&term) || u.email.to_lowercase().contains(&term)
        })
        .collect()
}

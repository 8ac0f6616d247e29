use tokio::sync::watch;

use crate::domain::errors::DomainError;
use crate::domain::ports::UserStore;
use crate::domain::session::SessionContext;
use crate::domain::user::{filter_users, PasswordChange, ProfileUpdate, User, UserId, UserUpdate};

/// User administration for admins, profile and password for everyone else.
pub struct UserService<U> {
    remote: U,
    session: SessionContext,
    users: watch::Sender<Vec<User>>,
}

impl<U: UserStore> UserService<U> {
    pub fn new(remote: U, session: SessionContext) -> Self {
        let (users, _) = watch::channel(Vec::new());
        Self {
            remote,
            session,
            users,
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.users.borrow().clone()
    }

    pub fn search(&self, term: &str) -> Vec<User> {
        filter_users(&self.users.borrow(), term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn load(&self) -> Result<Vec<User>, DomainError> {
        self.require_admin()?;
        let users = self.remote.list_users().await?;
        self.users.send_replace(users.clone());
        Ok(users)
    }

    pub async fn update(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError> {
        self.require_admin()?;
        require_contact(&update.name, &update.email)?;
        let user = self.remote.update_user(id, update).await.inspect_err(|e| {
            log::error!("update of user {} failed: {}", id, e);
        })?;
        self.users.send_modify(|users| {
            if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
                *slot = user.clone();
            }
        });
        Ok(user)
    }

    pub async fn delete(&self, id: &UserId) -> Result<(), DomainError> {
        self.require_admin()?;
        if self.session.current_user().is_some_and(|me| &me.id == id) {
            return Err(DomainError::Forbidden("cannot delete your own account".to_string()));
        }
        self.remote.delete_user(id).await.inspect_err(|e| {
            log::error!("delete of user {} failed: {}", id, e);
        })?;
        self.users.send_if_modified(|users| {
            let before = users.len();
            users.retain(|u| &u.id != id);
            users.len() != before
        });
        Ok(())
    }

    /// Updates the signed-in user's name and email. The session is signed in
    /// again with the token the server returns.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, DomainError> {
        self.require_session()?;
        require_contact(&update.name, &update.email)?;
        let updated = self.remote.update_own_profile(update).await.inspect_err(|e| {
            log::error!("profile update failed: {}", e);
        })?;
        self.session.sign_in(updated.token, updated.user.clone());
        Ok(updated.user)
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), DomainError> {
        self.require_session()?;
        if old_password.is_empty() || new_password.is_empty() {
            return Err(DomainError::InvalidInput("password is required".to_string()));
        }
        if new_password != confirm {
            return Err(DomainError::InvalidInput("passwords do not match".to_string()));
        }
        let change = PasswordChange {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.remote.change_password(&change).await.inspect_err(|e| {
            log::error!("password change failed: {}", e);
        })
    }

    fn require_session(&self) -> Result<(), DomainError> {
        if self.session.is_logged_in() {
            Ok(())
        } else {
            Err(DomainError::NotAuthenticated)
        }
    }

    fn require_admin(&self) -> Result<(), DomainError> {
        self.require_session()?;
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden("admin only".to_string()))
        }
    }
}

fn require_contact(name: &str, email: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidInput("name is required".to_string()));
    }
    if email.trim().is_empty() {
        return Err(DomainError::InvalidInput("email is required".to_string()));
    }
    Ok(())
}

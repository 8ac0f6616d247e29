use std::sync::Arc;

use tokio::sync::watch;

use super::user::{Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Shared authentication state, injected into every service that needs to
/// know who is acting.
///
/// Cloning yields another handle onto the same session. The state only
/// changes through [`SessionContext::sign_in`] and [`SessionContext::sign_out`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    state: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SessionContext {
    pub fn anonymous() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Called after a successful login, registration or profile update.
    pub fn sign_in(&self, token: impl Into<String>, user: User) {
        let session = Session {
            token: token.into(),
            user,
        };
        log::info!("signed in as {}", session.user.email);
        self.state.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if self.state.send_replace(None).is_some() {
            log::info!("signed out");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.state
            .borrow()
            .as_ref()
            .is_some_and(|s| s.user.role == Role::Admin)
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.token.clone())
    }

    /// Notified on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }
}

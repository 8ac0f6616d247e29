use crate::domain::errors::DomainError;
use crate::domain::ports::AuthStore;
use crate::domain::session::SessionContext;
use crate::domain::user::{Credentials, Registration, User};

/// Login, registration and logout. A successful login or registration signs
/// the shared session in with the token the server issued.
///
/// Logging out only ends the session; services holding per-user state are
/// told separately (see `WishlistReconciler::on_signed_out`).
pub struct AuthService<A> {
    remote: A,
    session: SessionContext,
}

impl<A: AuthStore> AuthService<A> {
    pub fn new(remote: A, session: SessionContext) -> Self {
        Self { remote, session }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, DomainError> {
        credentials.validate()?;
        let grant = match self.remote.login(credentials).await {
            Ok(grant) => grant,
            Err(DomainError::NotAuthenticated) => {
                log::warn!("login refused for {}", credentials.email);
                return Err(DomainError::InvalidInput(
                    "invalid email or password".to_string(),
                ));
            }
            Err(e) => {
                log::error!("login failed: {}", e);
                return Err(e);
            }
        };
        self.session.sign_in(grant.token, grant.user.clone());
        Ok(grant.user)
    }

    pub async fn register(
        &self,
        registration: &Registration,
        confirm: &str,
    ) -> Result<User, DomainError> {
        registration.validate(confirm)?;
        let grant = self.remote.register(registration).await.inspect_err(|e| {
            log::error!("registration of {} failed: {}", registration.email, e);
        })?;
        self.session.sign_in(grant.token, grant.user.clone());
        Ok(grant.user)
    }

    pub fn logout(&self) {
        self.session.sign_out();
    }
}

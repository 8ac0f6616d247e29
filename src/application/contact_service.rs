use tokio::sync::watch;

use crate::domain::contact::{filter_messages, ContactMessage, MessageId, StoredMessage};
use crate::domain::errors::DomainError;
use crate::domain::ports::ContactStore;
use crate::domain::session::SessionContext;

/// Contact form for visitors and the message inbox for admins.
pub struct ContactService<M> {
    remote: M,
    session: SessionContext,
    inbox: watch::Sender<Vec<StoredMessage>>,
}

impl<M: ContactStore> ContactService<M> {
    pub fn new(remote: M, session: SessionContext) -> Self {
        let (inbox, _) = watch::channel(Vec::new());
        Self {
            remote,
            session,
            inbox,
        }
    }

    /// Sends a message. No session is needed.
    pub async fn send(&self, message: &ContactMessage) -> Result<(), DomainError> {
        message.validate()?;
        self.remote.send_message(message).await.inspect_err(|e| {
            log::error!("sending contact message failed: {}", e);
        })?;
        log::info!("contact message from {} sent", message.email);
        Ok(())
    }

    pub fn messages(&self) -> Vec<StoredMessage> {
        self.inbox.borrow().clone()
    }

    pub fn search(&self, term: &str) -> Vec<StoredMessage> {
        filter_messages(&self.inbox.borrow(), term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn load(&self) -> Result<Vec<StoredMessage>, DomainError> {
        self.require_admin()?;
        let messages = self.remote.list_messages().await?;
        self.inbox.send_replace(messages.clone());
        Ok(messages)
    }

    pub async fn delete(&self, id: &MessageId) -> Result<(), DomainError> {
        self.require_admin()?;
        self.remote.delete_message(id).await.inspect_err(|e| {
            log::error!("delete of message {} failed: {}", id, e);
        })?;
        self.inbox.send_if_modified(|inbox| {
            let before = inbox.len();
            inbox.retain(|m| &m.id != id);
            inbox.len() != before
        });
        Ok(())
    }

    fn require_admin(&self) -> Result<(), DomainError> {
        if !self.session.is_logged_in() {
            Err(DomainError::NotAuthenticated)
        } else if !self.session.is_admin() {
            Err(DomainError::Forbidden("admin only".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeRemote;
    use crate::domain::contact::tests::stored;
    use crate::domain::session::tests::{admin, shopper};

    fn session_for(user: crate::domain::user::User) -> SessionContext {
        let session = SessionContext::anonymous();
        session.sign_in("token", user);
        session
    }

    #[tokio::test]
    async fn anonymous_visitors_can_send() {
        let remote = FakeRemote::default();
        let contact = ContactService::new(remote.clone(), SessionContext::anonymous());
        let message = ContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Gift wrap".to_string(),
            message: "Do you offer it?".to_string(),
        };

        contact.send(&message).await.unwrap();
        assert_eq!(remote.sent_messages(), vec![message]);
    }

    #[tokio::test]
    async fn incomplete_message_is_not_sent() {
        let remote = FakeRemote::default();
        let contact = ContactService::new(remote.clone(), SessionContext::anonymous());

        let err = contact.send(&ContactMessage::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: All fields are required.");
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn admin_loads_searches_and_deletes() {
        let remote = FakeRemote::default();
        remote.seed_messages(vec![stored("m-1", "Ada", "Refund"), stored("m-2", "Grace", "Hi")]);
        let contact = ContactService::new(remote.clone(), session_for(admin()));

        contact.load().await.unwrap();
        assert_eq!(contact.search("refund").len(), 1);

        contact.delete(&MessageId::new("m-1")).await.unwrap();
        assert_eq!(contact.messages().len(), 1);
        assert_eq!(remote.stored_messages().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_message() {
        let remote = FakeRemote::default();
        remote.seed_messages(vec![stored("m-1", "Ada", "Refund")]);
        let contact = ContactService::new(remote.clone(), session_for(admin()));
        contact.load().await.unwrap();

        remote.fail_next_call();
        assert!(contact.delete(&MessageId::new("m-1")).await.is_err());
        assert_eq!(contact.messages().len(), 1);
    }

    #[tokio::test]
    async fn inbox_is_admin_only() {
        let remote = FakeRemote::default();
        let contact = ContactService::new(remote.clone(), session_for(shopper()));
        assert!(matches!(contact.load().await, Err(DomainError::Forbidden(_))));
        assert!(matches!(
            contact.delete(&MessageId::new("m-1")).await,
            Err(DomainError::Forbidden(_))
        ));
        assert_eq!(remote.calls(), 0);
    }
}

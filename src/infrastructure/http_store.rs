//! JSON-over-HTTP adapter for the bookstore backend.
//!
//! Every request carries a fresh `x-request-id` and, while somebody is
//! signed in, the session's bearer token. Non-2xx answers are mapped onto
//! [`DomainError`]; 404 on a single-book lookup becomes `Ok(None)`. Book
//! drafts are uploaded as multipart forms, everything else is JSON.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::book::{Book, BookDraft, BookId, FeaturedUpdate};
use crate::domain::contact::{ContactMessage, MessageId, StoredMessage};
use crate::domain::dashboard::DashboardReport;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderId, OrderStatus, OrderUpdate, StatusUpdate};
use crate::domain::ports::{
    AuthStore, BookAdmin, BookCatalog, ContactStore, DashboardSource, OrderStore, UserStore,
    WishlistStore,
};
use crate::domain::session::SessionContext;
use crate::domain::user::{
    Credentials, PasswordChange, ProfileUpdate, Registration, SessionGrant, User, UserId,
    UserUpdate,
};

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        DomainError::Remote {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl HttpRemoteStore {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: SessionContext,
    ) -> Result<Self, DomainError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        log::debug!("{} {} [x-request-id {}]", method, path, request_id);
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-request-id", request_id);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, DomainError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, DomainError> {
        let response = self.send(builder).await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode(status, &body)
    }
}

/// A 2xx answer whose body does not have the expected shape keeps its
/// status, so it is not mistaken for a transport failure.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, DomainError> {
    serde_json::from_slice(body).map_err(|e| DomainError::Remote {
        status: Some(status.as_u16()),
        message: format!("unexpected response body: {}", e),
    })
}

fn draft_form(draft: &BookDraft) -> Result<Form, DomainError> {
    let mut form = Form::new();
    for (name, value) in draft.text_fields() {
        form = form.text(name, value);
    }
    if let Some(image) = &draft.image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| DomainError::InvalidInput(format!("image type: {}", e)))?;
        form = form.part("image", part);
    }
    Ok(form)
}

fn status_error(status: StatusCode, body: &str) -> DomainError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body.trim().to_string()
            }
        });
    match status {
        StatusCode::UNAUTHORIZED => DomainError::NotAuthenticated,
        StatusCode::FORBIDDEN => DomainError::Forbidden(message),
        StatusCode::NOT_FOUND => DomainError::NotFound,
        other => DomainError::Remote {
            status: Some(other.as_u16()),
            message,
        },
    }
}

impl BookCatalog for HttpRemoteStore {
    async fn list_books(&self) -> Result<Vec<Book>, DomainError> {
        self.fetch(self.request(Method::GET, "/books")).await
    }

    async fn get_book(&self, id: &BookId) -> Result<Option<Book>, DomainError> {
        match self.fetch(self.request(Method::GET, &format!("/books/{}", id))).await {
            Ok(book) => Ok(Some(book)),
            Err(DomainError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_featured(&self) -> Result<Vec<Book>, DomainError> {
        self.fetch(self.request(Method::GET, "/books/featured")).await
    }

    async fn list_newest(&self) -> Result<Vec<Book>, DomainError> {
        self.fetch(self.request(Method::GET, "/books/newest")).await
    }

    async fn list_latest(&self, limit: u32) -> Result<Vec<Book>, DomainError> {
        let builder = self.request(Method::GET, "/books").query(&[("limit", limit)]);
        self.fetch(builder).await
    }
}

impl BookAdmin for HttpRemoteStore {
    async fn create_book(&self, draft: &BookDraft) -> Result<Book, DomainError> {
        let builder = self.request(Method::POST, "/books").multipart(draft_form(draft)?);
        self.fetch(builder).await
    }

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<Book, DomainError> {
        let builder = self
            .request(Method::PUT, &format!("/books/{}", id))
            .multipart(draft_form(draft)?);
        self.fetch(builder).await
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), DomainError> {
        self.send(self.request(Method::DELETE, &format!("/books/{}", id)))
            .await
            .map(|_| ())
    }

    async fn set_featured(&self, id: &BookId, featured: bool) -> Result<Book, DomainError> {
        let builder = self
            .request(Method::PATCH, &format!("/books/{}/featured", id))
            .json(&FeaturedUpdate { featured });
        self.fetch(builder).await
    }
}

impl AuthStore for HttpRemoteStore {
    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, DomainError> {
        self.fetch(self.request(Method::POST, "/auth/login").json(credentials)).await
    }

    async fn register(&self, registration: &Registration) -> Result<SessionGrant, DomainError> {
        self.fetch(self.request(Method::POST, "/auth/register").json(registration)).await
    }
}

impl OrderStore for HttpRemoteStore {
    async fn create(&self, order: &NewOrder) -> Result<Order, DomainError> {
        self.fetch(self.request(Method::POST, "/orders").json(order)).await
    }

    async fn list_mine(&self) -> Result<Vec<Order>, DomainError> {
        self.fetch(self.request(Method::GET, "/orders/my")).await
    }

    async fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        self.fetch(self.request(Method::GET, "/orders")).await
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let builder = self
            .request(Method::PUT, &format!("/orders/{}", id))
            .json(&StatusUpdate { status });
        self.fetch(builder).await
    }

    async fn update_full(
        &self,
        id: &OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, DomainError> {
        let builder = self
            .request(Method::PUT, &format!("/orders/{}", id))
            .json(update);
        self.fetch(builder).await
    }

    async fn cancel(&self, id: &OrderId) -> Result<Order, DomainError> {
        let builder = self
            .request(Method::PUT, &format!("/orders/cancel/{}", id))
            .json(&json!({}));
        self.fetch(builder).await
    }

    async fn delete(&self, id: &OrderId) -> Result<(), DomainError> {
        self.send(self.request(Method::DELETE, &format!("/orders/{}", id)))
            .await
            .map(|_| ())
    }
}

impl WishlistStore for HttpRemoteStore {
    async fn list_items(&self) -> Result<Vec<Book>, DomainError> {
        self.fetch(self.request(Method::GET, "/wishlist")).await
    }

    async fn add_item(&self, id: &BookId) -> Result<(), DomainError> {
        let builder = self
            .request(Method::POST, "/wishlist/add")
            .json(&json!({ "bookId": id }));
        self.send(builder).await.map(|_| ())
    }

    async fn remove_item(&self, id: &BookId) -> Result<(), DomainError> {
        self.send(self.request(Method::DELETE, &format!("/wishlist/remove/{}", id)))
            .await
            .map(|_| ())
    }
}

impl UserStore for HttpRemoteStore {
    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        self.fetch(self.request(Method::GET, "/users")).await
    }

    async fn update_user(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError> {
        let builder = self
            .request(Method::PUT, &format!("/users/{}", id))
            .json(update);
        self.fetch(builder).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError> {
        self.send(self.request(Method::DELETE, &format!("/users/{}", id)))
            .await
            .map(|_| ())
    }

    async fn update_own_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<SessionGrant, DomainError> {
        self.fetch(self.request(Method::PUT, "/users/me").json(update)).await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError> {
        self.send(self.request(Method::PUT, "/users/me/password").json(change))
            .await
            .map(|_| ())
    }
}

impl ContactStore for HttpRemoteStore {
    async fn send_message(&self, message: &ContactMessage) -> Result<(), DomainError> {
        self.send(self.request(Method::POST, "/contact").json(message))
            .await
            .map(|_| ())
    }

    async fn list_messages(&self) -> Result<Vec<StoredMessage>, DomainError> {
        self.fetch(self.request(Method::GET, "/contact")).await
    }

    async fn delete_message(&self, id: &MessageId) -> Result<(), DomainError> {
        self.send(self.request(Method::DELETE, &format!("/contact/{}", id)))
            .await
            .map(|_| ())
    }
}

impl DashboardSource for HttpRemoteStore {
    async fn fetch_dashboard(&self) -> Result<DashboardReport, DomainError> {
        self.fetch(self.request(Method::GET, "/api/admin/dashboard")).await
    }
}

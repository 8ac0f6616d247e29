//! Collaborators the client depends on. The remote stores are async; the
//! key-value store is synchronous so that a cart write completes before the
//! mutating call returns.
//!
//! Services are generic over these traits and are driven from a single
//! task, so the futures are not required to be `Send`.
#![allow(async_fn_in_trait)]

use super::book::{Book, BookDraft, BookId};
use super::contact::{ContactMessage, MessageId, StoredMessage};
use super::dashboard::DashboardReport;
use super::errors::DomainError;
use super::order::{NewOrder, Order, OrderId, OrderStatus, OrderUpdate};
use super::user::{
    Credentials, PasswordChange, ProfileUpdate, Registration, SessionGrant, User, UserId,
    UserUpdate,
};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), DomainError>;
}

pub trait BookCatalog {
    async fn list_books(&self) -> Result<Vec<Book>, DomainError>;
    async fn get_book(&self, id: &BookId) -> Result<Option<Book>, DomainError>;
    async fn list_featured(&self) -> Result<Vec<Book>, DomainError>;
    async fn list_newest(&self) -> Result<Vec<Book>, DomainError>;
    async fn list_latest(&self, limit: u32) -> Result<Vec<Book>, DomainError>;
}

/// Catalog maintenance. Every call requires an admin session server-side.
pub trait BookAdmin {
    async fn create_book(&self, draft: &BookDraft) -> Result<Book, DomainError>;
    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<Book, DomainError>;
    async fn delete_book(&self, id: &BookId) -> Result<(), DomainError>;
    async fn set_featured(&self, id: &BookId, featured: bool) -> Result<Book, DomainError>;
}

pub trait AuthStore {
    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, DomainError>;
    async fn register(&self, registration: &Registration) -> Result<SessionGrant, DomainError>;
}

pub trait OrderStore {
    async fn create(&self, order: &NewOrder) -> Result<Order, DomainError>;
    async fn list_mine(&self) -> Result<Vec<Order>, DomainError>;
    async fn list_all(&self) -> Result<Vec<Order>, DomainError>;
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError>;
    async fn update_full(
        &self,
        id: &OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, DomainError>;
    async fn cancel(&self, id: &OrderId) -> Result<Order, DomainError>;
    async fn delete(&self, id: &OrderId) -> Result<(), DomainError>;
}

pub trait WishlistStore {
    /// Full book records of the signed-in user's wishlist.
    async fn list_items(&self) -> Result<Vec<Book>, DomainError>;
    async fn add_item(&self, id: &BookId) -> Result<(), DomainError>;
    async fn remove_item(&self, id: &BookId) -> Result<(), DomainError>;
}

pub trait UserStore {
    async fn list_users(&self) -> Result<Vec<User>, DomainError>;
    async fn update_user(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError>;
    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError>;
    async fn update_own_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<SessionGrant, DomainError>;
    async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError>;
}

pub trait DashboardSource {
    async fn fetch_dashboard(&self) -> Result<DashboardReport, DomainError>;
}

pub trait ContactStore {
    async fn send_message(&self, message: &ContactMessage) -> Result<(), DomainError>;
    async fn list_messages(&self) -> Result<Vec<StoredMessage>, DomainError>;
    async fn delete_message(&self, id: &MessageId) -> Result<(), DomainError>;
}

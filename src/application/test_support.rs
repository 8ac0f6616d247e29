//! In-process stand-in for the remote store, shared by the service tests.

use std::sync::{Arc, Mutex, PoisonError};

use bigdecimal::BigDecimal;
use chrono::Utc;
use tokio::sync::oneshot;

use crate::domain::book::{Book, BookDraft, BookId};
use crate::domain::contact::{ContactMessage, MessageId, StoredMessage};
use crate::domain::dashboard::DashboardReport;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderId, OrderLine, OrderStatus, OrderUpdate};
use crate::domain::ports::{
    AuthStore, BookAdmin, BookCatalog, ContactStore, DashboardSource, OrderStore, UserStore,
    WishlistStore,
};
use crate::domain::user::{
    Credentials, PasswordChange, ProfileUpdate, Registration, Role, SessionGrant, User, UserId,
    UserUpdate,
};

#[derive(Default)]
struct State {
    calls: usize,
    fail_next: Option<u16>,
    wishlist: Vec<Book>,
    add_gate: Option<oneshot::Receiver<()>>,
    list_gate: Option<oneshot::Receiver<()>>,
    orders: Vec<Order>,
    orders_gate: Option<oneshot::Receiver<()>>,
    created: Vec<NewOrder>,
    next_order: u32,
    users: Vec<User>,
    passwords: Vec<PasswordChange>,
    dashboard: Option<DashboardReport>,
    books: Vec<Book>,
    next_book: u32,
    featured_gate: Option<oneshot::Receiver<()>>,
    messages: Vec<StoredMessage>,
    sent: Vec<ContactMessage>,
    accounts: Vec<(User, String)>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeRemote {
    state: Arc<Mutex<State>>,
}

impl FakeRemote {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Counts the call and returns the armed failure, if any.
    fn enter(&self) -> Result<(), DomainError> {
        self.with(|s| {
            s.calls += 1;
            match s.fail_next.take() {
                Some(status) => Err(DomainError::Remote {
                    status: Some(status),
                    message: "injected failure".to_string(),
                }),
                None => Ok(()),
            }
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.with(|s| s.calls)
    }

    pub(crate) fn fail_next_call(&self) {
        self.fail_next_with_status(500);
    }

    pub(crate) fn fail_next_with_status(&self, status: u16) {
        self.with(|s| s.fail_next = Some(status));
    }

    pub(crate) fn seed_wishlist(&self, books: Vec<Book>) {
        self.with(|s| s.wishlist = books);
    }

    /// The next `add_item` waits until `gate` resolves.
    pub(crate) fn hold_next_wishlist_add(&self, gate: oneshot::Receiver<()>) {
        self.with(|s| s.add_gate = Some(gate));
    }

    /// The next `list_items` takes its snapshot, then waits until `gate`
    /// resolves before answering with it.
    pub(crate) fn hold_next_wishlist_list(&self, gate: oneshot::Receiver<()>) {
        self.with(|s| s.list_gate = Some(gate));
    }

    /// Same as [`hold_next_wishlist_list`](Self::hold_next_wishlist_list)
    /// for the next order listing.
    pub(crate) fn hold_next_order_list(&self, gate: oneshot::Receiver<()>) {
        self.with(|s| s.orders_gate = Some(gate));
    }

    pub(crate) fn seed_orders(&self, orders: Vec<Order>) {
        self.with(|s| s.orders = orders);
    }

    pub(crate) fn set_order_status(&self, id: &OrderId, status: OrderStatus) {
        self.with(|s| {
            if let Some(o) = s.orders.iter_mut().find(|o| &o.id == id) {
                o.status = status;
            }
        });
    }

    pub(crate) fn orders(&self) -> Vec<Order> {
        self.with(|s| s.orders.clone())
    }

    pub(crate) fn created(&self) -> Vec<NewOrder> {
        self.with(|s| s.created.clone())
    }

    pub(crate) fn seed_users(&self, users: Vec<User>) {
        self.with(|s| s.users = users);
    }

    pub(crate) fn password_changes(&self) -> Vec<PasswordChange> {
        self.with(|s| s.passwords.clone())
    }

    pub(crate) fn seed_dashboard(&self, report: DashboardReport) {
        self.with(|s| s.dashboard = Some(report));
    }

    async fn listed_orders(&self) -> Result<Vec<Order>, DomainError> {
        let (orders, gate) = self.with(|s| (s.orders.clone(), s.orders_gate.take()));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(orders)
    }

    pub(crate) fn seed_books(&self, books: Vec<Book>) {
        self.with(|s| s.books = books);
    }

    pub(crate) fn books(&self) -> Vec<Book> {
        self.with(|s| s.books.clone())
    }

    /// The next `set_featured` is applied at once but answered only after
    /// `gate` resolves.
    pub(crate) fn hold_next_featured(&self, gate: oneshot::Receiver<()>) {
        self.with(|s| s.featured_gate = Some(gate));
    }

    pub(crate) fn seed_messages(&self, messages: Vec<StoredMessage>) {
        self.with(|s| s.messages = messages);
    }

    pub(crate) fn stored_messages(&self) -> Vec<StoredMessage> {
        self.with(|s| s.messages.clone())
    }

    pub(crate) fn sent_messages(&self) -> Vec<ContactMessage> {
        self.with(|s| s.sent.clone())
    }

    fn find_book(&self, id: &BookId, f: impl FnOnce(&mut Book)) -> Result<Book, DomainError> {
        self.with(|s| {
            let book = s
                .books
                .iter_mut()
                .find(|b| &b.id == id)
                .ok_or(DomainError::NotFound)?;
            f(book);
            Ok(book.clone())
        })
    }

    fn find_order(&self, id: &OrderId, f: impl FnOnce(&mut Order)) -> Result<Order, DomainError> {
        self.with(|s| {
            let order = s
                .orders
                .iter_mut()
                .find(|o| &o.id == id)
                .ok_or(DomainError::NotFound)?;
            f(order);
            Ok(order.clone())
        })
    }
}

fn placeholder_book(id: &BookId) -> Book {
    Book {
        id: id.clone(),
        title: id.to_string(),
        author: String::new(),
        category: String::new(),
        price: BigDecimal::from(0),
        description: None,
        image_url: None,
        featured: false,
        created_at: None,
    }
}

impl WishlistStore for FakeRemote {
    async fn list_items(&self) -> Result<Vec<Book>, DomainError> {
        self.enter()?;
        let (books, gate) = self.with(|s| (s.wishlist.clone(), s.list_gate.take()));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(books)
    }

    async fn add_item(&self, id: &BookId) -> Result<(), DomainError> {
        self.enter()?;
        let gate = self.with(|s| s.add_gate.take());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.with(|s| {
            if !s.wishlist.iter().any(|b| &b.id == id) {
                s.wishlist.push(placeholder_book(id));
            }
        });
        Ok(())
    }

    async fn remove_item(&self, id: &BookId) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| s.wishlist.retain(|b| &b.id != id));
        Ok(())
    }
}

impl OrderStore for FakeRemote {
    async fn create(&self, order: &NewOrder) -> Result<Order, DomainError> {
        self.enter()?;
        Ok(self.with(|s| {
            s.next_order += 1;
            s.created.push(order.clone());
            let created = Order {
                id: OrderId::new(format!("order-{}", s.next_order)),
                items: order
                    .items
                    .iter()
                    .map(|l| OrderLine {
                        title: l.title.clone(),
                        unit_price: l.price.clone(),
                        quantity: l.quantity,
                    })
                    .collect(),
                status: OrderStatus::Pending,
                payment_method: order.payment_method,
                total_price: order.total_price.clone(),
                billing: order.billing.clone(),
                user: None,
                card_last4: order.card_last4.clone(),
                created_at: Some(Utc::now()),
                updated_at: None,
            };
            s.orders.push(created.clone());
            created
        }))
    }

    async fn list_mine(&self) -> Result<Vec<Order>, DomainError> {
        self.enter()?;
        self.listed_orders().await
    }

    async fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        self.enter()?;
        self.listed_orders().await
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        self.enter()?;
        self.find_order(id, |o| o.status = status)
    }

    async fn update_full(
        &self,
        id: &OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, DomainError> {
        self.enter()?;
        self.find_order(id, |o| {
            o.billing = update.billing.clone();
            o.items = update.items.clone();
            o.payment_method = update.payment_method;
            o.status = update.status;
            o.total_price = update.total_price.clone();
        })
    }

    async fn cancel(&self, id: &OrderId) -> Result<Order, DomainError> {
        self.enter()?;
        let current = self.find_order(id, |_| {})?;
        if current.status.is_terminal() {
            return Err(DomainError::Remote {
                status: Some(409),
                message: format!("order is already {}", current.status),
            });
        }
        self.find_order(id, |o| o.status = OrderStatus::Canceled)
    }

    async fn delete(&self, id: &OrderId) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| {
            let before = s.orders.len();
            s.orders.retain(|o| &o.id != id);
            if s.orders.len() == before {
                Err(DomainError::NotFound)
            } else {
                Ok(())
            }
        })
    }
}

impl UserStore for FakeRemote {
    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        self.enter()?;
        Ok(self.with(|s| s.users.clone()))
    }

    async fn update_user(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError> {
        self.enter()?;
        self.with(|s| {
            let user = s
                .users
                .iter_mut()
                .find(|u| &u.id == id)
                .ok_or(DomainError::NotFound)?;
            user.name = update.name.clone();
            user.email = update.email.clone();
            user.role = update.role;
            Ok(user.clone())
        })
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| s.users.retain(|u| &u.id != id));
        Ok(())
    }

    async fn update_own_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<SessionGrant, DomainError> {
        self.enter()?;
        Ok(SessionGrant {
            token: "refreshed-token".to_string(),
            user: User {
                id: UserId::new("u-1"),
                name: update.name.clone(),
                email: update.email.clone(),
                role: Default::default(),
            },
        })
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| s.passwords.push(change.clone()));
        Ok(())
    }
}

impl DashboardSource for FakeRemote {
    async fn fetch_dashboard(&self) -> Result<DashboardReport, DomainError> {
        self.enter()?;
        self.with(|s| s.dashboard.clone()).ok_or(DomainError::NotFound)
    }
}

fn apply_draft(book: &mut Book, draft: &BookDraft) {
    book.title = draft.title.clone();
    book.author = draft.author.clone();
    book.category = draft.category.clone();
    book.description = Some(draft.description.clone());
    book.price = draft.price.clone();
    if let Some(image) = &draft.image {
        book.image_url = Some(format!("/uploads/{}", image.file_name));
    }
}

impl BookCatalog for FakeRemote {
    async fn list_books(&self) -> Result<Vec<Book>, DomainError> {
        self.enter()?;
        Ok(self.books())
    }

    async fn get_book(&self, id: &BookId) -> Result<Option<Book>, DomainError> {
        self.enter()?;
        Ok(self.with(|s| s.books.iter().find(|b| &b.id == id).cloned()))
    }

    async fn list_featured(&self) -> Result<Vec<Book>, DomainError> {
        self.enter()?;
        Ok(self.with(|s| s.books.iter().filter(|b| b.featured).cloned().collect()))
    }

    async fn list_newest(&self) -> Result<Vec<Book>, DomainError> {
        self.enter()?;
        Ok(self.books())
    }

    async fn list_latest(&self, limit: u32) -> Result<Vec<Book>, DomainError> {
        self.enter()?;
        Ok(self.with(|s| s.books.iter().take(limit as usize).cloned().collect()))
    }
}

impl BookAdmin for FakeRemote {
    async fn create_book(&self, draft: &BookDraft) -> Result<Book, DomainError> {
        self.enter()?;
        Ok(self.with(|s| {
            s.next_book += 1;
            let mut book = placeholder_book(&BookId::new(format!("book-{}", s.next_book)));
            apply_draft(&mut book, draft);
            book.created_at = Some(Utc::now());
            s.books.push(book.clone());
            book
        }))
    }

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<Book, DomainError> {
        self.enter()?;
        self.find_book(id, |b| apply_draft(b, draft))
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| s.books.retain(|b| &b.id != id));
        Ok(())
    }

    async fn set_featured(&self, id: &BookId, featured: bool) -> Result<Book, DomainError> {
        self.enter()?;
        let book = self.find_book(id, |b| b.featured = featured)?;
        let gate = self.with(|s| s.featured_gate.take());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(book)
    }
}

impl AuthStore for FakeRemote {
    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, DomainError> {
        self.enter()?;
        self.with(|s| {
            s.accounts
                .iter()
                .find(|(u, pw)| u.email == credentials.email && *pw == credentials.password)
                .map(|(u, _)| SessionGrant {
                    token: format!("token-{}", u.id),
                    user: u.clone(),
                })
                .ok_or(DomainError::NotAuthenticated)
        })
    }

    async fn register(&self, registration: &Registration) -> Result<SessionGrant, DomainError> {
        self.enter()?;
        self.with(|s| {
            if s.accounts.iter().any(|(u, _)| u.email == registration.email) {
                return Err(DomainError::Remote {
                    status: Some(400),
                    message: "User already exists".to_string(),
                });
            }
            let user = User {
                id: UserId::new(format!("u-{}", s.accounts.len() + 100)),
                name: registration.name.clone(),
                email: registration.email.clone(),
                role: Role::User,
            };
            s.accounts.push((user.clone(), registration.password.clone()));
            Ok(SessionGrant {
                token: format!("token-{}", user.id),
                user,
            })
        })
    }
}

impl ContactStore for FakeRemote {
    async fn send_message(&self, message: &ContactMessage) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| {
            s.sent.push(message.clone());
            s.messages.push(StoredMessage {
                id: MessageId::new(format!("m-{}", s.sent.len())),
                content: message.clone(),
                created_at: Some(Utc::now()),
            });
        });
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<StoredMessage>, DomainError> {
        self.enter()?;
        Ok(self.stored_messages())
    }

    async fn delete_message(&self, id: &MessageId) -> Result<(), DomainError> {
        self.enter()?;
        self.with(|s| s.messages.retain(|m| &m.id != id));
        Ok(())
    }
}

use bigdecimal::BigDecimal;
use tokio::sync::watch;

use crate::domain::book::{Book, BookId};
use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::ports::KeyValueStore;

pub const DEFAULT_CART_KEY: &str = "bookstore_cart";

/// The shopper's cart, persisted under one storage key.
///
/// Every mutation is a read-modify-persist step executed while holding the
/// channel's write lock; subscribers are only notified once the new cart has
/// been written. If the write fails, the published cart stays as it was.
pub struct CartStore<S> {
    storage: S,
    key: String,
    cart: watch::Sender<Cart>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Loads the cart stored under `key`. Missing, unreadable or corrupt
    /// content yields an empty cart.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = match storage.get(&key) {
            Ok(Some(bytes)) => Cart::from_json(&bytes).unwrap_or_else(|| {
                log::warn!("discarding corrupt cart stored under '{}'", key);
                Cart::default()
            }),
            Ok(None) => Cart::default(),
            Err(e) => {
                log::warn!("could not load cart '{}', starting empty: {}", key, e);
                Cart::default()
            }
        };
        let (cart, _) = watch::channel(cart);
        Self { storage, key, cart }
    }

    pub fn snapshot(&self) -> Cart {
        self.cart.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.cart.subscribe()
    }

    pub fn add_or_increment(&self, book: &Book, quantity: u32) -> Result<(), DomainError> {
        self.mutate(|cart| {
            cart.add_or_increment(book, quantity);
            true
        })
    }

    pub fn set_quantity(&self, id: &BookId, quantity: i64) -> Result<(), DomainError> {
        self.mutate(|cart| cart.set_quantity(id, quantity))
    }

    pub fn remove(&self, id: &BookId) -> Result<(), DomainError> {
        self.mutate(|cart| cart.remove(id))
    }

    pub fn clear(&self) -> Result<(), DomainError> {
        self.mutate(|cart| {
            cart.clear();
            true
        })
    }

    pub fn total_items(&self) -> u64 {
        self.cart.borrow().total_items()
    }

    pub fn total_price(&self) -> BigDecimal {
        self.cart.borrow().total_price()
    }

    /// Applies `edit` to a copy of the cart and publishes the copy only after
    /// it was persisted. `edit` returns whether it changed anything.
    fn mutate(&self, edit: impl FnOnce(&mut Cart) -> bool) -> Result<(), DomainError> {
        let mut outcome = Ok(());
        self.cart.send_if_modified(|current| {
            let mut next = current.clone();
            if !edit(&mut next) {
                return false;
            }
            let written = next
                .to_json()
                .map_err(|e| DomainError::Storage(e.to_string()))
                .and_then(|bytes| self.storage.put(&self.key, &bytes));
            match written {
                Ok(()) => {
                    *current = next;
                    true
                }
                Err(e) => {
                    log::error!("failed to persist cart '{}': {}", self.key, e);
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }
}

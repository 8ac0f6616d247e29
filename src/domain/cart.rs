use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::book::{Book, BookId};

/// One purchasable book in the local cart.
///
/// `quantity` is always at least 1; a line leaves the cart only through
/// [`Cart::remove`] or [`Cart::clear`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub price: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    fn from_book(book: &Book, quantity: u32) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            price: book.price.clone(),
            image_url: book.image_url.clone(),
            quantity,
        }
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, id: &BookId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    /// Adds `quantity` copies of `book`, merging into an existing line.
    /// A zero quantity counts as one.
    pub fn add_or_increment(&mut self, book: &Book, quantity: u32) {
        let quantity = quantity.max(1);
        match self.lines.iter_mut().find(|l| l.id == book.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine::from_book(book, quantity)),
        }
    }

    /// Overwrites a line's quantity, clamped to at least 1. Returns whether a
    /// line with `id` exists.
    pub fn set_quantity(&mut self, id: &BookId, quantity: i64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| &l.id == id) else {
            return false;
        };
        line.quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        true
    }

    pub fn remove(&mut self, id: &BookId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Badge count: sum of quantities.
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn total_price(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, l| acc + l.line_total())
    }

    /// Parses a persisted cart, treating anything that does not parse or that
    /// breaks the one-line-per-book / positive-quantity rules as unusable.
    pub fn from_json(bytes: &[u8]) -> Option<Self> {
        let cart: Cart = serde_json::from_slice(bytes).ok()?;
        let mut seen = std::collections::HashSet::new();
        let well_formed = cart
            .lines
            .iter()
            .all(|l| l.quantity >= 1 && seen.insert(l.id.clone()));
        well_formed.then_some(cart)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

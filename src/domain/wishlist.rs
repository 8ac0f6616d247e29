use std::collections::HashSet;

use super::book::{Book, BookId};

/// Identifiers of the books a signed-in user has saved for later.
///
/// Only ids are kept; the full records the server returns are projected away
/// on [`WishlistSet::from_books`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistSet {
    ids: HashSet<BookId>,
}

impl WishlistSet {
    pub fn from_books(books: &[Book]) -> Self {
        Self {
            ids: books.iter().map(|b| b.id.clone()).collect(),
        }
    }

    pub fn contains(&self, id: &BookId) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: BookId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &BookId) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookId> {
        self.ids.iter()
    }
}

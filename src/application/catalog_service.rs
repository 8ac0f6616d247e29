use tokio::sync::watch;

use crate::domain::book::{Book, BookDraft, BookId};
use crate::domain::errors::DomainError;
use crate::domain::ports::{BookAdmin, BookCatalog};
use crate::domain::sequence::{RequestSequencer, Ticket};
use crate::domain::session::SessionContext;

/// The admin book list. Anyone may load it; changes need an admin session.
///
/// Responses to edits of a book are ignored when a newer request for the
/// same book was issued in the meantime, so flipping the featured flag
/// twice in a row ends in the state of the second flip.
pub struct CatalogService<C> {
    remote: C,
    session: SessionContext,
    books: watch::Sender<Vec<Book>>,
    sequencer: RequestSequencer<BookId>,
}

impl<C: BookCatalog + BookAdmin> CatalogService<C> {
    pub fn new(remote: C, session: SessionContext) -> Self {
        let (books, _) = watch::channel(Vec::new());
        Self {
            remote,
            session,
            books,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Book>> {
        self.books.subscribe()
    }

    pub fn books(&self) -> Vec<Book> {
        self.books.borrow().clone()
    }

    pub fn find(&self, id: &BookId) -> Option<Book> {
        self.books.borrow().iter().find(|b| &b.id == id).cloned()
    }

    /// Books created, edited or deleted after the load was issued keep their
    /// local state.
    pub async fn load(&self) -> Result<Vec<Book>, DomainError> {
        let reload = self.sequencer.begin_reload();
        let listed = self.remote.list_books().await?;
        let Some(newer) = self.sequencer.finish_reload(&reload) else {
            return Ok(self.books());
        };
        let mut merged = Vec::with_capacity(listed.len());
        self.books.send_modify(|books| {
            for book in listed {
                if !newer.contains(&book.id) {
                    merged.push(book);
                } else if let Some(local) = books.iter().find(|b| b.id == book.id) {
                    merged.push(local.clone());
                }
            }
            for local in books.iter() {
                if newer.contains(&local.id) && !merged.iter().any(|b| b.id == local.id) {
                    merged.insert(0, local.clone());
                }
            }
            *books = merged.clone();
        });
        Ok(merged)
    }

    /// New books go to the top of the list.
    pub async fn create(&self, draft: &BookDraft) -> Result<Book, DomainError> {
        self.require_admin()?;
        draft.validate()?;
        let book = self.remote.create_book(draft).await.inspect_err(|e| {
            log::error!("creating book {:?} failed: {}", draft.title, e);
        })?;
        log::info!("book {} created", book.id);
        self.sequencer.issue(&book.id);
        self.books.send_modify(|books| books.insert(0, book.clone()));
        Ok(book)
    }

    pub async fn update(&self, id: &BookId, draft: &BookDraft) -> Result<Book, DomainError> {
        self.require_admin()?;
        draft.validate()?;
        let ticket = self.sequencer.issue(id);
        let book = self.remote.update_book(id, draft).await.inspect_err(|e| {
            log::error!("update of book {} failed: {}", id, e);
        })?;
        self.apply(&ticket, &book);
        Ok(book)
    }

    pub async fn set_featured(&self, id: &BookId, featured: bool) -> Result<Book, DomainError> {
        self.require_admin()?;
        let ticket = self.sequencer.issue(id);
        let book = self.remote.set_featured(id, featured).await.inspect_err(|e| {
            log::error!("featuring book {} failed: {}", id, e);
        })?;
        self.apply(&ticket, &book);
        Ok(book)
    }

    pub async fn delete(&self, id: &BookId) -> Result<(), DomainError> {
        self.require_admin()?;
        self.sequencer.issue(id);
        self.remote.delete_book(id).await.inspect_err(|e| {
            log::error!("delete of book {} failed: {}", id, e);
        })?;
        self.books.send_if_modified(|books| {
            let before = books.len();
            books.retain(|b| &b.id != id);
            books.len() != before
        });
        Ok(())
    }

    fn apply(&self, ticket: &Ticket<BookId>, book: &Book) {
        if !self.sequencer.is_current(ticket) {
            log::debug!("dropping stale response for book {}", book.id);
            return;
        }
        self.books.send_modify(|books| {
            if let Some(slot) = books.iter_mut().find(|b| b.id == book.id) {
                *slot = book.clone();
            }
        });
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

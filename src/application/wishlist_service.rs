use tokio::sync::watch;

use crate::domain::book::{Book, BookId};
use crate::domain::errors::DomainError;
use crate::domain::ports::WishlistStore;
use crate::domain::sequence::RequestSequencer;
use crate::domain::session::SessionContext;
use crate::domain::wishlist::WishlistSet;

/// Keeps a local set of wishlisted book ids mirrored against the server.
///
/// While nobody is signed in the set is empty and mutations are rejected.
/// Local changes are applied only after the remote call succeeds, and only
/// if no newer request for the same book was issued in the meantime.
pub struct WishlistReconciler<W> {
    remote: W,
    session: SessionContext,
    set: watch::Sender<WishlistSet>,
    sequencer: RequestSequencer<BookId>,
}

impl<W: WishlistStore> WishlistReconciler<W> {
    pub fn new(remote: W, session: SessionContext) -> Self {
        let (set, _) = watch::channel(WishlistSet::default());
        Self {
            remote,
            session,
            set,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WishlistSet> {
        self.set.subscribe()
    }

    pub fn snapshot(&self) -> WishlistSet {
        self.set.borrow().clone()
    }

    pub fn is_member(&self, id: &BookId) -> bool {
        self.session.is_logged_in() && self.set.borrow().contains(id)
    }

    /// Pairs each book with its wishlist membership, for catalog listings.
    pub fn annotate<'a>(&self, books: &'a [Book]) -> Vec<(&'a Book, bool)> {
        books.iter().map(|b| (b, self.is_member(&b.id))).collect()
    }

    /// Replaces the local set with the server's. Anonymous sessions get an
    /// empty set without a remote call.
    ///
    /// Books added or removed after the reload was issued keep their local
    /// membership. A reload overtaken by a later reload or a sign-out is
    /// dropped and the current set is returned.
    pub async fn reload(&self) -> Result<WishlistSet, DomainError> {
        if !self.session.is_logged_in() {
            self.clear_local();
            return Ok(WishlistSet::default());
        }
        let reload = self.sequencer.begin_reload();
        let books = self.remote.list_items().await?;
        let Some(newer) = self.sequencer.finish_reload(&reload) else {
            log::debug!("dropping superseded wishlist reload");
            return Ok(self.snapshot());
        };
        let mut fresh = WishlistSet::from_books(&books);
        self.set.send_modify(|set| {
            for id in &newer {
                if set.contains(id) {
                    fresh.insert(id.clone());
                } else {
                    fresh.remove(id);
                }
            }
            *set = fresh.clone();
        });
        log::info!("wishlist reloaded with {} item(s)", fresh.len());
        Ok(fresh)
    }

    pub async fn add(&self, id: &BookId) -> Result<(), DomainError> {
        self.require_session()?;
        let ticket = self.sequencer.issue(id);
        self.remote.add_item(id).await.inspect_err(|e| {
            log::error!("adding {} to the wishlist failed: {}", id, e);
        })?;
        if self.sequencer.is_current(&ticket) {
            self.set.send_if_modified(|set| set.insert(id.clone()));
        } else {
            log::debug!("dropping stale wishlist add for {}", id);
        }
        Ok(())
    }

    pub async fn remove(&self, id: &BookId) -> Result<(), DomainError> {
        self.require_session()?;
        let ticket = self.sequencer.issue(id);
        self.remote.remove_item(id).await.inspect_err(|e| {
            log::error!("removing {} from the wishlist failed: {}", id, e);
        })?;
        if self.sequencer.is_current(&ticket) {
            self.set.send_if_modified(|set| set.remove(id));
        } else {
            log::debug!("dropping stale wishlist remove for {}", id);
        }
        Ok(())
    }

    /// Adds when absent, removes when present.
    pub async fn toggle(&self, id: &BookId) -> Result<(), DomainError> {
        if self.is_member(id) {
            self.remove(id).await
        } else {
            self.add(id).await
        }
    }

    /// Session ended: forget the set locally. No remote call.
    pub fn on_signed_out(&self) {
        self.clear_local();
    }

    fn clear_local(&self) {
        self.sequencer.reset();
        self.set.send_if_modified(|set| {
            let had_items = !set.is_empty();
            set.clear();
            had_items
        });
    }

    fn require_session(&self) -> Result<(), DomainError> {
        if self.session.is_logged_in() {
            Ok(())
        } else {
            Err(DomainError::NotAuthenticated)
        }
    }
}

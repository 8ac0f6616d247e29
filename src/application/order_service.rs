use tokio::sync::watch;

use crate::application::cart_store::CartStore;
use crate::domain::checkout::{validate, CheckoutForm};
use crate::domain::errors::DomainError;
use crate::domain::line_items::OrderEditor;
use crate::domain::order::{
    filter_orders, Actor, CancelDecision, NewOrder, NewOrderLine, Order, OrderId, OrderStatus,
    PaymentMethod, ShippedCancel,
};
use crate::domain::ports::{KeyValueStore, OrderStore};
use crate::domain::sequence::{Reload, RequestSequencer, Ticket};
use crate::domain::session::SessionContext;

/// Order submission, shopper cancellation and admin edits.
///
/// Keeps the most recently loaded list of orders and patches it from the
/// responses of its own mutations. A response is ignored for that list when
/// a newer request for the same order was issued after it.
pub struct OrderService<R> {
    remote: R,
    session: SessionContext,
    policy: ShippedCancel,
    orders: watch::Sender<Vec<Order>>,
    sequencer: RequestSequencer<OrderId>,
}

impl<R: OrderStore> OrderService<R> {
    pub fn new(remote: R, session: SessionContext, policy: ShippedCancel) -> Self {
        let (orders, _) = watch::channel(Vec::new());
        Self {
            remote,
            session,
            policy,
            orders,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Order>> {
        self.orders.subscribe()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.borrow().clone()
    }

    pub fn find(&self, id: &OrderId) -> Option<Order> {
        self.orders.borrow().iter().find(|o| &o.id == id).cloned()
    }

    pub fn search(&self, term: &str) -> Vec<Order> {
        filter_orders(&self.orders.borrow(), term)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Loads the signed-in shopper's orders.
    pub async fn load_mine(&self) -> Result<Vec<Order>, DomainError> {
        self.actor()?;
        let reload = self.sequencer.begin_reload();
        let orders = self.remote.list_mine().await?;
        Ok(self.settle_reload(&reload, orders))
    }

    /// Loads every order (admin).
    pub async fn load_all(&self) -> Result<Vec<Order>, DomainError> {
        self.require_admin()?;
        let reload = self.sequencer.begin_reload();
        let orders = self.remote.list_all().await?;
        Ok(self.settle_reload(&reload, orders))
    }

    /// Places an order for everything in `cart`. The cart is cleared only
    /// once the remote store has accepted the order.
    pub async fn submit<S: KeyValueStore>(
        &self,
        cart: &CartStore<S>,
        form: &CheckoutForm,
    ) -> Result<Order, DomainError> {
        self.actor()?;
        let snapshot = cart.snapshot();
        if snapshot.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        let report = validate(form);
        if !report.is_valid() {
            log::warn!("checkout rejected: {:?}", report);
            return Err(DomainError::CheckoutRejected(report));
        }

        let new_order = NewOrder {
            items: snapshot
                .lines()
                .iter()
                .map(|l| NewOrderLine {
                    book_id: l.id.clone(),
                    title: l.title.clone(),
                    price: l.price.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            payment_method: form.payment_method,
            total_price: snapshot.total_price(),
            billing: form.billing.clone(),
            card_last4: match form.payment_method {
                PaymentMethod::Card => form.card.last4(),
                PaymentMethod::CashOnDelivery | PaymentMethod::PayPal => None,
            },
        };

        let order = self.remote.create(&new_order).await.inspect_err(|e| {
            log::error!("order submission failed: {}", e);
        })?;
        log::info!("order {} placed ({} line(s))", order.id, order.items.len());

        if let Err(e) = cart.clear() {
            log::warn!("order {} placed but the cart could not be cleared: {}", order.id, e);
        }
        let ticket = self.sequencer.issue(&order.id);
        self.apply(&ticket, &order);
        Ok(order)
    }

    /// Cancels an order. Cancelling an order that is already canceled is a
    /// no-op, including when only the server knows it is.
    pub async fn cancel(&self, id: &OrderId) -> Result<Order, DomainError> {
        let actor = self.actor()?;
        let known = self.find(id);

        if let Some(order) = &known {
            self.check_owner(order, actor)?;
            match order.status.check_cancel(actor, self.policy) {
                Ok(CancelDecision::AlreadyCanceled) => return Ok(order.clone()),
                Ok(CancelDecision::Proceed) => {}
                Err(e) => {
                    log::warn!("refusing to cancel order {}: {}", id, e);
                    return Err(e);
                }
            }
        }

        let ticket = self.sequencer.issue(id);
        match self.remote.cancel(id).await {
            Ok(order) => {
                self.apply(&ticket, &order);
                Ok(order)
            }
            Err(e) if e.is_conflict() => self.resolve_cancel_conflict(id, actor, e).await,
            Err(e) => {
                log::error!("cancel of order {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    async fn resolve_cancel_conflict(
        &self,
        id: &OrderId,
        actor: Actor,
        conflict: DomainError,
    ) -> Result<Order, DomainError> {
        let fresh = match actor {
            Actor::Admin => self.remote.list_all().await?,
            Actor::Shopper => self.remote.list_mine().await?,
        };
        match fresh.into_iter().find(|o| &o.id == id) {
            Some(order) if order.status == OrderStatus::Canceled => {
                log::debug!("order {} was already canceled remotely", id);
                let ticket = self.sequencer.issue(id);
                self.apply(&ticket, &order);
                Ok(order)
            }
            _ => Err(conflict),
        }
    }

    /// Rewrites billing, line items, payment method, status and total in
    /// one call. The total sent is recomputed from the editor's rows.
    pub async fn admin_update(&self, editor: &OrderEditor) -> Result<Order, DomainError> {
        self.require_admin()?;
        let update = editor.to_update()?;
        let id = editor.order_id();

        let ticket = self.sequencer.issue(id);
        let order = self.remote.update_full(id, &update).await.inspect_err(|e| {
            log::error!("update of order {} failed: {}", id, e);
        })?;
        self.apply(&ticket, &order);
        Ok(order)
    }

    pub async fn admin_set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        self.require_admin()?;
        if let Some(order) = self.find(id) {
            if !order.status.check_transition(status, self.policy)? {
                return Ok(order);
            }
        }

        let ticket = self.sequencer.issue(id);
        let order = self.remote.update_status(id, status).await.inspect_err(|e| {
            log::error!("status change of order {} failed: {}", id, e);
        })?;
        self.apply(&ticket, &order);
        Ok(order)
    }

    pub async fn delete(&self, id: &OrderId) -> Result<(), DomainError> {
        self.require_admin()?;
        // Outstanding responses for this order must not resurrect it.
        self.sequencer.issue(id);
        self.remote.delete(id).await.inspect_err(|e| {
            log::error!("delete of order {} failed: {}", id, e);
        })?;
        self.orders.send_if_modified(|orders| {
            let before = orders.len();
            orders.retain(|o| &o.id != id);
            orders.len() != before
        });
        Ok(())
    }

    fn actor(&self) -> Result<Actor, DomainError> {
        if self.session.is_admin() {
            Ok(Actor::Admin)
        } else if self.session.is_logged_in() {
            Ok(Actor::Shopper)
        } else {
            Err(DomainError::NotAuthenticated)
        }
    }

    fn require_admin(&self) -> Result<(), DomainError> {
        match self.actor()? {
            Actor::Admin => Ok(()),
            Actor::Shopper => Err(DomainError::Forbidden("admin only".to_string())),
        }
    }

    fn check_owner(&self, order: &Order, actor: Actor) -> Result<(), DomainError> {
        if actor == Actor::Admin {
            return Ok(());
        }
        let me = self.session.current_user().map(|u| u.id);
        match (&order.user, me) {
            (Some(owner), Some(me)) if *owner != me => Err(DomainError::Forbidden(format!(
                "order {} belongs to another account",
                order.id
            ))),
            _ => Ok(()),
        }
    }

    /// Installs a freshly listed set of orders. Orders with a request issued
    /// after the listing keep their local copy; one that is gone locally was
    /// deleted meanwhile and stays gone. A superseded listing is dropped.
    fn settle_reload(&self, reload: &Reload, listed: Vec<Order>) -> Vec<Order> {
        let Some(newer) = self.sequencer.finish_reload(reload) else {
            log::debug!("dropping superseded order listing");
            return self.orders();
        };
        let mut merged = Vec::with_capacity(listed.len());
        self.orders.send_modify(|orders| {
            for order in listed {
                if !newer.contains(&order.id) {
                    merged.push(order);
                } else if let Some(local) = orders.iter().find(|o| o.id == order.id) {
                    merged.push(local.clone());
                }
            }
            for local in orders.iter() {
                if newer.contains(&local.id) && !merged.iter().any(|o| o.id == local.id) {
                    merged.push(local.clone());
                }
            }
            *orders = merged.clone();
        });
        merged
    }

    /// Upserts `order` unless a newer request for it was issued meanwhile.
    fn apply(&self, ticket: &Ticket<OrderId>, order: &Order) {
        if !self.sequencer.is_current(ticket) {
            log::debug!("dropping stale response for order {}", order.id);
            return;
        }
        self.orders.send_modify(|orders| {
            match orders.iter_mut().find(|o| o.id == order.id) {
                Some(slot) => *slot = order.clone(),
                None => orders.push(order.clone()),
            }
        });
    }
}

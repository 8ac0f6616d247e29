use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::BookId;
use super::errors::DomainError;
use super::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order lifecycle.
///
/// ```text
/// pending -> shipped -> completed
/// pending -> canceled
/// shipped -> canceled   (only if ShippedCancel allows it)
/// ```
/// `completed` and `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }

    /// Position along the forward path; canceled sits outside it.
    fn progress(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Shipped => Some(1),
            OrderStatus::Completed => Some(2),
            OrderStatus::Canceled => None,
        }
    }

    /// Decides whether `actor` may cancel an order currently in `self`.
    pub fn check_cancel(
        self,
        actor: Actor,
        policy: ShippedCancel,
    ) -> Result<CancelDecision, DomainError> {
        match self {
            OrderStatus::Canceled => Ok(CancelDecision::AlreadyCanceled),
            OrderStatus::Pending => Ok(CancelDecision::Proceed),
            OrderStatus::Shipped if policy.permits(actor) => Ok(CancelDecision::Proceed),
            OrderStatus::Shipped | OrderStatus::Completed => Err(DomainError::InvalidTransition {
                from: self,
                to: OrderStatus::Canceled,
            }),
        }
    }

    /// Validates an admin status change. Returns `false` when `next` equals
    /// the current status (nothing to do).
    pub fn check_transition(
        self,
        next: OrderStatus,
        policy: ShippedCancel,
    ) -> Result<bool, DomainError> {
        if self == next {
            return Ok(false);
        }
        if next == OrderStatus::Canceled {
            return self
                .check_cancel(Actor::Admin, policy)
                .map(|d| d == CancelDecision::Proceed);
        }
        match (self.progress(), next.progress()) {
            (Some(from), Some(to)) if to > from => Ok(true),
            _ => Err(DomainError::InvalidTransition { from: self, to: next }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDecision {
    Proceed,
    AlreadyCanceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Shopper,
    Admin,
}

/// Who may cancel an order that has already shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShippedCancel {
    #[default]
    Forbidden,
    AdminOnly,
    Anyone,
}

impl ShippedCancel {
    pub fn permits(self, actor: Actor) -> bool {
        match self {
            ShippedCancel::Forbidden => false,
            ShippedCancel::AdminOnly => actor == Actor::Admin,
            ShippedCancel::Anyone => true,
        }
    }
}

impl FromStr for ShippedCancel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forbidden" => Ok(ShippedCancel::Forbidden),
            "admin" => Ok(ShippedCancel::AdminOnly),
            "anyone" => Ok(ShippedCancel::Anyone),
            other => Err(format!("expected forbidden, admin or anyone, got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "cod")]
    CashOnDelivery,
    #[serde(rename = "paypal")]
    PayPal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub title: String,
    #[serde(rename = "price")]
    #[serde(deserialize_with = "super::money::deserialize")]
    pub unit_price: BigDecimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub total_price: BigDecimal,
    pub billing: Billing,
    /// Owning account, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub book_id: BookId,
    pub title: String,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub price: BigDecimal,
    pub quantity: u32,
}

/// Payload of an order submission. Always starts out `pending` server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub payment_method: PaymentMethod,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub total_price: BigDecimal,
    pub billing: Billing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

/// Full admin rewrite of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub billing: Billing,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Admin table search: case-insensitive substring of the id or billing email.
pub fn filter_orders<'a>(orders: &'a [Order], term: &str) -> Vec<&'a Order> {
    let term = term.trim().to_lowercase();
    orders
        .iter()
        .filter(|o| {
            o.id.as_str().to_lowercase().contains(&term)
                || o.billing.email.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn billing() -> Billing {
        Billing {
            name: "Sam Shopper".to_string(),
            email: "sam@example.com".to_string(),
            phone: "+4512345678".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    pub(crate) fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            items: vec![OrderLine {
                title: "Dune".to_string(),
                unit_price: BigDecimal::from(10),
                quantity: 2,
            }],
            status,
            payment_method: PaymentMethod::CashOnDelivery,
            total_price: BigDecimal::from(20),
            billing: billing(),
            user: Some(UserId::new("u-1")),
            card_last4: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn cancel_rules() {
        use OrderStatus::*;
        let p = ShippedCancel::Forbidden;

        assert_eq!(Pending.check_cancel(Actor::Shopper, p).unwrap(), CancelDecision::Proceed);
        assert_eq!(
            Canceled.check_cancel(Actor::Shopper, p).unwrap(),
            CancelDecision::AlreadyCanceled
        );
        assert!(matches!(
            Completed.check_cancel(Actor::Admin, ShippedCancel::Anyone),
            Err(DomainError::InvalidTransition { from: Completed, to: Canceled })
        ));
        assert!(Shipped.check_cancel(Actor::Admin, p).is_err());
    }

    #[test]
    fn shipped_cancel_follows_policy() {
        use OrderStatus::Shipped;

        assert!(Shipped.check_cancel(Actor::Admin, ShippedCancel::AdminOnly).is_ok());
        assert!(Shipped.check_cancel(Actor::Shopper, ShippedCancel::AdminOnly).is_err());
        assert!(Shipped.check_cancel(Actor::Shopper, ShippedCancel::Anyone).is_ok());
    }

    #[test]
    fn admin_transitions_only_move_forward() {
        use OrderStatus::*;
        let p = ShippedCancel::Forbidden;

        assert_eq!(Pending.check_transition(Shipped, p).unwrap(), true);
        assert_eq!(Shipped.check_transition(Completed, p).unwrap(), true);
        assert_eq!(Pending.check_transition(Completed, p).unwrap(), true);
        assert_eq!(Shipped.check_transition(Shipped, p).unwrap(), false);
        assert!(Shipped.check_transition(Pending, p).is_err());
        assert!(Completed.check_transition(Shipped, p).is_err());
        assert!(Canceled.check_transition(Pending, p).is_err());
        assert_eq!(Pending.check_transition(Canceled, p).unwrap(), true);
        assert!(Shipped.check_transition(Canceled, p).is_err());
        assert_eq!(Canceled.check_transition(Canceled, p).unwrap(), false);
    }

    #[test]
    fn shipped_cancel_parses_from_config_values() {
        assert_eq!("admin".parse::<ShippedCancel>(), Ok(ShippedCancel::AdminOnly));
        assert_eq!(" Anyone ".parse::<ShippedCancel>(), Ok(ShippedCancel::Anyone));
        assert_eq!("forbidden".parse::<ShippedCancel>(), Ok(ShippedCancel::Forbidden));
        assert!("sometimes".parse::<ShippedCancel>().is_err());
    }

    #[test]
    fn order_uses_backend_field_names() {
        let json = serde_json::json!({
            "_id": "o-1",
            "items": [{ "title": "Dune", "price": "12.50", "quantity": 2 }],
            "status": "shipped",
            "paymentMethod": "cod",
            "totalPrice": "25",
            "billing": {
                "name": "n", "email": "e@x.io", "phone": "1", "address": "a",
                "city": "c", "postalCode": "1", "country": "k"
            }
        });
        let order: Order = serde_json::from_value(json).expect("order should parse");

        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.user, None);
    }

    #[test]
    fn filter_by_id_or_email() {
        let mut other = order("XYZ-2", OrderStatus::Pending);
        other.billing.email = "Someone@Else.org".to_string();
        let orders = vec![order("abc-1", OrderStatus::Pending), other];

        assert_eq!(filter_orders(&orders, "ABC").len(), 1);
        assert_eq!(filter_orders(&orders, "else.ORG")[0].id, OrderId::new("XYZ-2"));
        assert_eq!(filter_orders(&orders, " ").len(), 2);
        assert!(filter_orders(&orders, "nothing").is_empty());
    }
}

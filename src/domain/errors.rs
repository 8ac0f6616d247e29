use thiserror::Error;

use super::checkout::CheckoutReport;
use super::line_items::EditorReport;
use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Checkout form is invalid")]
    CheckoutRejected(CheckoutReport),
    #[error("Order line items are invalid")]
    InvalidLineItems(EditorReport),
    #[error("Remote store error ({}): {message}", status_label(.status))]
    Remote { status: Option<u16>, message: String },
    #[error("Storage error: {0}")]
    Storage(String),
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "transport".to_string(), |s| s.to_string())
}

impl DomainError {
    /// The remote store refused the request because of the entity's current state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Remote { status: Some(409), .. })
    }
}

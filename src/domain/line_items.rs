//! Admin order editor with a dynamic list of line items.
//!
//! The total is never accumulated: every price, quantity or row-count change
//! recomputes it from the current rows with [`compute_total`]. Recomputing
//! the total does not revalidate rows; validation only runs on
//! [`OrderEditor::validate`] and [`OrderEditor::to_update`].

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;

use super::checkout::{billing_defects, BillingRules, Field, FieldDefect};
use super::errors::DomainError;
use super::order::{Billing, Order, OrderId, OrderLine, OrderStatus, OrderUpdate, PaymentMethod};

/// One editable row. Values are kept as entered, so a row may be invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRow {
    pub title: String,
    pub quantity: i64,
    pub price: BigDecimal,
}

impl Default for LineItemRow {
    fn default() -> Self {
        Self {
            title: String::new(),
            quantity: 1,
            price: BigDecimal::from(0),
        }
    }
}

impl From<&OrderLine> for LineItemRow {
    fn from(line: &OrderLine) -> Self {
        Self {
            title: line.title.clone(),
            quantity: i64::from(line.quantity),
            price: line.unit_price.clone(),
        }
    }
}

impl LineItemRow {
    pub fn subtotal(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }

    pub fn defects(&self) -> Vec<RowDefect> {
        let mut defects = Vec::new();
        if self.title.trim().is_empty() {
            defects.push(RowDefect::TitleRequired);
        }
        if self.quantity < 1 {
            defects.push(RowDefect::QuantityBelowOne);
        }
        if self.price < BigDecimal::from(0) {
            defects.push(RowDefect::NegativePrice);
        }
        defects
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDefect {
    TitleRequired,
    QuantityBelowOne,
    NegativePrice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorReport {
    /// Row index to that row's defects; rows without defects are absent.
    pub rows: BTreeMap<usize, Vec<RowDefect>>,
    /// An order needs at least one line item.
    pub no_items: bool,
    pub billing: BTreeMap<Field, FieldDefect>,
}

impl EditorReport {
    pub fn is_valid(&self) -> bool {
        self.rows.is_empty() && !self.no_items && self.billing.is_empty()
    }
}

/// Sum of `price * quantity` over `rows`.
pub fn compute_total(rows: &[LineItemRow]) -> BigDecimal {
    rows.iter()
        .fold(BigDecimal::from(0), |acc, row| acc + row.subtotal())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItemEditor {
    rows: Vec<LineItemRow>,
    total: BigDecimal,
}

impl Default for LineItemEditor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LineItemEditor {
    pub fn new(rows: Vec<LineItemRow>) -> Self {
        let total = compute_total(&rows);
        Self { rows, total }
    }

    pub fn from_lines(lines: &[OrderLine]) -> Self {
        Self::new(lines.iter().map(LineItemRow::from).collect())
    }

    pub fn rows(&self) -> &[LineItemRow] {
        &self.rows
    }

    pub fn total(&self) -> &BigDecimal {
        &self.total
    }

    fn recompute_total(&mut self) {
        self.total = compute_total(&self.rows);
    }

    pub fn add_row(&mut self, row: LineItemRow) {
        self.rows.push(row);
        self.recompute_total();
    }

    pub fn remove_row(&mut self, index: usize) -> Option<LineItemRow> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        self.recompute_total();
        Some(removed)
    }

    pub fn set_title(&mut self, index: usize, title: impl Into<String>) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn set_quantity(&mut self, index: usize, quantity: i64) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        row.quantity = quantity;
        self.recompute_total();
        true
    }

    pub fn set_price(&mut self, index: usize, price: BigDecimal) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        row.price = price;
        self.recompute_total();
        true
    }

    pub fn row_defects(&self) -> BTreeMap<usize, Vec<RowDefect>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, row.defects()))
            .filter(|(_, defects)| !defects.is_empty())
            .collect()
    }

    fn to_order_lines(&self) -> Vec<OrderLine> {
        self.rows
            .iter()
            .map(|row| OrderLine {
                title: row.title.trim().to_string(),
                unit_price: row.price.clone(),
                quantity: u32::try_from(row.quantity).unwrap_or(u32::MAX),
            })
            .collect()
    }
}

/// Full-record edit of one order, as an admin sees it in the edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEditor {
    order_id: OrderId,
    pub billing: Billing,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub items: LineItemEditor,
}

impl OrderEditor {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            billing: order.billing.clone(),
            payment_method: order.payment_method,
            status: order.status,
            items: LineItemEditor::from_lines(&order.items),
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn total_price(&self) -> &BigDecimal {
        self.items.total()
    }

    pub fn validate(&self) -> EditorReport {
        EditorReport {
            rows: self.items.row_defects(),
            no_items: self.items.rows().is_empty(),
            billing: billing_defects(&self.billing, BillingRules::Admin),
        }
    }

    /// Builds the payload for a full update, with the total recomputed from
    /// the rows as they are now.
    pub fn to_update(&self) -> Result<OrderUpdate, DomainError> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(DomainError::InvalidLineItems(report));
        }
        Ok(OrderUpdate {
            billing: self.billing.clone(),
            items: self.items.to_order_lines(),
            payment_method: self.payment_method,
            status: self.status,
            total_price: compute_total(self.items.rows()),
        })
    }
}

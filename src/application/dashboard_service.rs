use bigdecimal::BigDecimal;
use chrono::{Local, NaiveDate};

use crate::domain::dashboard::{
    day_labels_ending, status_series, DashboardReport, StatusSeries, WINDOW_DAYS,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::DashboardSource;
use crate::domain::session::SessionContext;

/// What the admin dashboard renders: the headline numbers plus one daily
/// series per order status over the trailing window.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub revenue: BigDecimal,
    pub orders: u64,
    pub pending_orders: u64,
    pub users: u64,
    pub books: u64,
    pub labels: Vec<String>,
    pub series: Vec<StatusSeries>,
}

impl DashboardView {
    pub fn build(report: &DashboardReport, today: NaiveDate) -> Self {
        let labels = day_labels_ending(today, WINDOW_DAYS);
        let series = status_series(report, &labels);
        Self {
            revenue: report.total_revenue_last_30_days.clone(),
            orders: report.total_orders_last_30_days,
            pending_orders: report.pending_orders,
            users: report.total_users,
            books: report.total_books,
            labels,
            series,
        }
    }
}

pub struct DashboardService<D> {
    source: D,
    session: SessionContext,
}

impl<D: DashboardSource> DashboardService<D> {
    pub fn new(source: D, session: SessionContext) -> Self {
        Self { source, session }
    }

    pub async fn load(&self) -> Result<DashboardView, DomainError> {
        self.load_for(Local::now().date_naive()).await
    }

    /// Builds the view with the window ending on `today`.
    pub async fn load_for(&self, today: NaiveDate) -> Result<DashboardView, DomainError> {
        if !self.session.is_logged_in() {
            return Err(DomainError::NotAuthenticated);
        }
        if !self.session.is_admin() {
            return Err(DomainError::Forbidden("admin only".to_string()));
        }
        let report = self.source.fetch_dashboard().await.inspect_err(|e| {
            log::error!("dashboard fetch failed: {}", e);
        })?;
        Ok(DashboardView::build(&report, today))
    }
}

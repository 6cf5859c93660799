//! On-demand pull of remote collections into the local mirror.
//!
//! Each collection is fetched page by page for its window, mapped into
//! mirror rows and handed to the [`Reconciler`] as a single batch. Records
//! that cannot be mapped are logged and counted as skipped, never inserted
//! half-formed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use ledgersync_db::{Customer, Invoice, LedgerStore, MirrorStore, SaleOrder};
use tracing::{info, warn};

use crate::client::LedgerClient;
use crate::error::LedgerResult;
use crate::mapper::RecordMapper;
use crate::models::Page;
use crate::reconciler::{Reconciler, UpsertReport};

/// Page size for list requests.
const FETCH_PAGE_SIZE: usize = 1000;

/// Upper bound on records fetched per collection.
const MAX_REMOTE_RECORDS: usize = 50_000;

/// Date windows for time-scoped collections, in days relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindows {
    pub invoice_lookback_days: i64,
    pub order_lookback_days: i64,
    pub order_lookahead_days: i64,
}

impl Default for SyncWindows {
    fn default() -> Self {
        Self {
            invoice_lookback_days: 30,
            order_lookback_days: 30,
            order_lookahead_days: 2,
        }
    }
}

impl SyncWindows {
    /// `today - lookback ..= today`.
    #[must_use]
    pub fn invoice_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - Duration::days(self.invoice_lookback_days), today)
    }

    /// `today - lookback ..= today + lookahead`.
    #[must_use]
    pub fn order_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            today - Duration::days(self.order_lookback_days),
            today + Duration::days(self.order_lookahead_days),
        )
    }
}

/// Per-collection results of [`SyncScheduler::sync_all`].
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub customers: UpsertReport,
    pub orders: UpsertReport,
    pub invoices: UpsertReport,
}

/// Pulls customers, orders and invoices and reconciles them locally.
pub struct SyncScheduler {
    client: LedgerClient,
    store: Arc<dyn LedgerStore>,
    windows: SyncWindows,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(client: LedgerClient, store: Arc<dyn LedgerStore>, windows: SyncWindows) -> Self {
        Self {
            client,
            store,
            windows,
        }
    }

    /// Sync customers, then orders, then invoices, so that owners resolve.
    pub async fn sync_all(&self) -> LedgerResult<SyncSummary> {
        let today = Utc::now().date_naive();
        let customers = self.sync_customers().await?;
        let orders = self.sync_orders(today).await?;
        let invoices = self.sync_invoices(today).await?;
        Ok(SyncSummary {
            customers,
            orders,
            invoices,
        })
    }

    /// Mirror every remote customer.
    pub async fn sync_customers(&self) -> LedgerResult<UpsertReport> {
        let remote = fetch_all("customer", |from, count| {
            self.client.list_customers(from, count)
        })
        .await?;

        let mut skipped = 0;
        let batch: Vec<Customer> = remote
            .iter()
            .filter_map(|c| match RecordMapper::customer_from_remote(c) {
                Ok(customer) => Some(customer),
                Err(e) => {
                    warn!(entity = "customer", error = %e, "Skipping unmappable record");
                    skipped += 1;
                    None
                }
            })
            .collect();

        let mut report = Reconciler::upsert::<Customer, _>(self.store.as_ref(), batch).await?;
        report.skipped = skipped;
        Ok(report)
    }

    /// Mirror remote orders within the order window around `today`.
    ///
    /// Orders whose customer is not known locally are stored without one.
    pub async fn sync_orders(&self, today: NaiveDate) -> LedgerResult<UpsertReport> {
        let (date_from, date_to) = self.windows.order_range(today);
        let remote = fetch_all("order", |from, count| {
            self.client.list_orders(date_from, date_to, from, count)
        })
        .await?;

        let customers = self.customer_index().await?;
        let mut skipped = 0;
        let mut batch: Vec<SaleOrder> = Vec::with_capacity(remote.len());
        for raw in remote {
            let snapshot = match raw.parse() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(entity = "sale_order", error = %e, "Skipping unmappable record");
                    skipped += 1;
                    continue;
                }
            };
            let customer_id = snapshot
                .customer_id
                .and_then(|remote_id| customers.get(&remote_id).map(|c| c.id));
            if customer_id.is_none() {
                warn!(
                    remote_order_id = snapshot.id,
                    customer_remote_id = ?snapshot.customer_id,
                    "Order customer not found locally, storing without owner"
                );
            }
            batch.push(RecordMapper::sale_order_from_remote(&snapshot, customer_id));
        }

        let mut report = Reconciler::upsert::<SaleOrder, _>(self.store.as_ref(), batch).await?;
        report.skipped = skipped;
        Ok(report)
    }

    /// Mirror remote invoices within the invoice window ending `today`.
    ///
    /// Invoices whose customer is not known locally are skipped.
    pub async fn sync_invoices(&self, today: NaiveDate) -> LedgerResult<UpsertReport> {
        let (date_from, date_to) = self.windows.invoice_range(today);
        let remote = fetch_all("invoice", |from, count| {
            self.client.list_invoices(date_from, date_to, from, count)
        })
        .await?;

        let customers = self.customer_index().await?;
        let mut skipped = 0;
        let mut batch: Vec<Invoice> = Vec::with_capacity(remote.len());
        for raw in remote {
            let snapshot = match raw.parse() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(entity = "invoice", error = %e, "Skipping unmappable record");
                    skipped += 1;
                    continue;
                }
            };
            let Some(customer) = snapshot.customer_id.and_then(|id| customers.get(&id)) else {
                warn!(
                    remote_invoice_id = snapshot.id,
                    customer_remote_id = ?snapshot.customer_id,
                    "Invoice customer not found locally, skipping"
                );
                skipped += 1;
                continue;
            };
            match RecordMapper::invoice_from_remote(&snapshot, customer) {
                Ok(invoice) => batch.push(invoice),
                Err(e) => {
                    warn!(remote_invoice_id = snapshot.id, error = %e, "Skipping unmappable record");
                    skipped += 1;
                }
            }
        }

        let mut report = Reconciler::upsert::<Invoice, _>(self.store.as_ref(), batch).await?;
        report.skipped = skipped;
        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            "Invoice sync finished"
        );
        Ok(report)
    }

    /// Provisioned local customers keyed by remote id.
    async fn customer_index(&self) -> LedgerResult<HashMap<i64, Customer>> {
        let customers = MirrorStore::<Customer>::list(self.store.as_ref()).await?;
        Ok(customers
            .into_iter()
            .filter_map(|c| c.remote_id.map(|remote_id| (remote_id, c)))
            .collect())
    }
}

/// Fetch every page of a collection.
///
/// Stops after [`MAX_REMOTE_RECORDS`] to bound memory.
async fn fetch_all<T, F, Fut>(entity: &str, mut list: F) -> LedgerResult<Vec<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = LedgerResult<Page<T>>>,
{
    let mut all = Vec::new();
    let mut from = 0;

    loop {
        let page = list(from, FETCH_PAGE_SIZE).await?;
        let fetched = page.values.len();
        let full_result_size = page.full_result_size;
        all.extend(page.values);

        if all.len() >= MAX_REMOTE_RECORDS {
            warn!(
                entity,
                fetched = all.len(),
                full_result_size,
                "Reached MAX_REMOTE_RECORDS, stopping fetch"
            );
            all.truncate(MAX_REMOTE_RECORDS);
            break;
        }

        let reached_total = full_result_size
            .and_then(|total| usize::try_from(total).ok())
            .is_some_and(|total| all.len() >= total);
        if fetched < FETCH_PAGE_SIZE || reached_total {
            break;
        }

        from += fetched;
    }

    Ok(all)
}

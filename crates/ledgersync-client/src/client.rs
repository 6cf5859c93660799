//! HTTP client for the remote accounting platform (reqwest-based).

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::AuthProvider;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Created, InvoiceSnapshot, NewRemoteCustomer, NewRemoteInvoice, NewRemoteOrder, OrderSnapshot,
    Page, RemoteCustomer, RemoteInvoice, RemoteOrder, ValueEnvelope, VoucherSnapshot,
};

/// Typed operations against the remote platform.
///
/// Every non-2xx answer becomes [`LedgerError::RemoteRequest`] carrying the
/// status and body; a 401 also drops the cached credential.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    /// Base URL including the API version, e.g. `https://host/v2`.
    base_url: String,
    auth: Arc<dyn AuthProvider>,
    http_client: Client,
}

impl LedgerClient {
    pub fn new(
        base_url: &str,
        auth: Arc<dyn AuthProvider>,
        timeout: Duration,
    ) -> LedgerResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ledgersync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(base_url, auth, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(base_url: &str, auth: Arc<dyn AuthProvider>, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            http_client,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the current credential is accepted (`GET /customer?count=1`).
    pub async fn ping(&self) -> LedgerResult<()> {
        let url = self.url("/customer");
        let builder = self.http_client.get(&url).query(&[("from", 0), ("count", 1)]);
        let _: Page<serde_json::Value> = self.send(builder, "GET", &url).await?;
        Ok(())
    }

    // ── Customers ─────────────────────────────────────────────────────

    /// Create a customer (`POST /customer`) and return its remote id.
    pub async fn create_customer(&self, customer: &NewRemoteCustomer) -> LedgerResult<i64> {
        let url = self.url("/customer");
        let envelope: ValueEnvelope<Created> = self
            .send(self.http_client.post(&url).json(customer), "POST", &url)
            .await?;
        envelope.into_value("customer create")?.parse("customer")
    }

    pub async fn get_customer(&self, id: i64) -> LedgerResult<RemoteCustomer> {
        let url = self.url(&format!("/customer/{id}"));
        let envelope: ValueEnvelope<RemoteCustomer> =
            self.send(self.http_client.get(&url), "GET", &url).await?;
        envelope.into_value("customer")
    }

    pub async fn list_customers(&self, from: usize, count: usize) -> LedgerResult<Page<RemoteCustomer>> {
        let url = self.url("/customer");
        let builder = self
            .http_client
            .get(&url)
            .query(&[("from", from), ("count", count)]);
        self.send(builder, "GET", &url).await
    }

    // ── Orders ────────────────────────────────────────────────────────

    /// Create a sales order (`POST /order`) and return its remote id.
    pub async fn create_order(&self, order: &NewRemoteOrder) -> LedgerResult<i64> {
        let url = self.url("/order");
        let envelope: ValueEnvelope<Created> = self
            .send(self.http_client.post(&url).json(order), "POST", &url)
            .await?;
        envelope.into_value("order create")?.parse("order")
    }

    pub async fn get_order(&self, id: i64) -> LedgerResult<OrderSnapshot> {
        let url = self.url(&format!("/order/{id}"));
        let envelope: ValueEnvelope<RemoteOrder> =
            self.send(self.http_client.get(&url), "GET", &url).await?;
        envelope.into_value("order")?.parse()
    }

    pub async fn list_orders(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
        from: usize,
        count: usize,
    ) -> LedgerResult<Page<RemoteOrder>> {
        let url = self.url("/order");
        let builder = self.http_client.get(&url).query(&[
            ("orderDateFrom", date_from.to_string()),
            ("orderDateTo", date_to.to_string()),
            ("from", from.to_string()),
            ("count", count.to_string()),
        ]);
        self.send(builder, "GET", &url).await
    }

    // ── Invoices ──────────────────────────────────────────────────────

    /// Generate an invoice from an existing order
    /// (`PUT /order/{id}/:invoice`). The invoice is not sent.
    pub async fn create_invoice_from_order(
        &self,
        order_id: i64,
        invoice_date: NaiveDate,
    ) -> LedgerResult<InvoiceSnapshot> {
        let url = self.url(&format!("/order/{order_id}/:invoice"));
        let builder = self.http_client.put(&url).query(&[
            ("invoiceDate", invoice_date.to_string()),
            ("sendToCustomer", "false".to_string()),
        ]);
        let envelope: ValueEnvelope<RemoteInvoice> = self.send(builder, "PUT", &url).await?;
        envelope.into_value("order invoice")?.parse()
    }

    /// Create an invoice with its orders embedded (`POST /invoice`).
    pub async fn create_invoice(&self, invoice: &NewRemoteInvoice) -> LedgerResult<InvoiceSnapshot> {
        let url = self.url("/invoice");
        let builder = self
            .http_client
            .post(&url)
            .query(&[("sendToCustomer", "false")])
            .json(invoice);
        let envelope: ValueEnvelope<RemoteInvoice> = self.send(builder, "POST", &url).await?;
        envelope.into_value("invoice create")?.parse()
    }

    pub async fn get_invoice(&self, id: i64) -> LedgerResult<InvoiceSnapshot> {
        let url = self.url(&format!("/invoice/{id}"));
        let envelope: ValueEnvelope<RemoteInvoice> =
            self.send(self.http_client.get(&url), "GET", &url).await?;
        envelope.into_value("invoice")?.parse()
    }

    pub async fn list_invoices(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
        from: usize,
        count: usize,
    ) -> LedgerResult<Page<RemoteInvoice>> {
        let url = self.url("/invoice");
        let builder = self.http_client.get(&url).query(&[
            ("invoiceDateFrom", date_from.to_string()),
            ("invoiceDateTo", date_to.to_string()),
            ("from", from.to_string()),
            ("count", count.to_string()),
        ]);
        self.send(builder, "GET", &url).await
    }

    pub async fn approve_invoice(&self, id: i64) -> LedgerResult<()> {
        let url = self.url(&format!("/invoice/{id}/:approve"));
        self.send_no_content(self.http_client.put(&url), "PUT", &url)
            .await
    }

    /// Send the invoice to the customer by e-mail.
    pub async fn send_invoice(&self, id: i64) -> LedgerResult<()> {
        let url = self.url(&format!("/invoice/{id}/:send"));
        let builder = self.http_client.put(&url).query(&[("sendType", "EMAIL")]);
        self.send_no_content(builder, "PUT", &url).await
    }

    // ── Vouchers ──────────────────────────────────────────────────────

    pub async fn get_voucher(&self, id: i64) -> LedgerResult<VoucherSnapshot> {
        let url = self.url(&format!("/ledger/voucher/{id}"));
        let envelope: ValueEnvelope<serde_json::Value> =
            self.send(self.http_client.get(&url), "GET", &url).await?;
        VoucherSnapshot::parse(id, envelope.into_value("voucher")?)
    }

    /// Upload a document to a voucher as multipart field `file`.
    pub async fn upload_voucher_attachment(
        &self,
        voucher_id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> LedgerResult<()> {
        let url = self.url(&format!("/ledger/voucher/{voucher_id}/attachment"));
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        self.send_no_content(self.http_client.post(&url).multipart(form), "POST", &url)
            .await
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorize(&self, builder: RequestBuilder) -> LedgerResult<RequestBuilder> {
        let credential = self.auth.credential().await?;
        Ok(builder
            .header(AUTHORIZATION, credential.authorization_header())
            .header(ACCEPT, "application/json"))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &str,
        url: &str,
    ) -> LedgerResult<T> {
        debug!(method, url, "Remote request");
        let response = self.authorize(builder).await?.send().await?;
        self.handle_response(response).await
    }

    async fn send_no_content(
        &self,
        builder: RequestBuilder,
        method: &str,
        url: &str,
    ) -> LedgerResult<()> {
        debug!(method, url, "Remote request");
        let response = self.authorize(builder).await?.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> LedgerResult<T> {
        if response.status().is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| LedgerError::protocol(format!("Failed to parse response: {e}")))
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> LedgerResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        if status == StatusCode::UNAUTHORIZED {
            warn!("Remote platform rejected credential, invalidating cache");
            self.auth.invalidate().await;
        }

        Err(LedgerError::RemoteRequest {
            status: status.as_u16(),
            body,
        })
    }
}

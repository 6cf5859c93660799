//! Mock accounting platform using wiremock for integration testing.
//!
//! Each `mock_*` method mounts one endpoint. Pass `Some(n)` as `expect` to
//! have the server assert the exact number of calls when it is dropped.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ledgersync_client::auth::{SessionTokenProvider, StaticTokenProvider};
use ledgersync_client::client::LedgerClient;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session token the static test client authenticates with.
pub const TEST_TOKEN: &str = "test-token";

pub struct MockLedgerServer {
    server: MockServer,
}

impl MockLedgerServer {
    pub async fn new() -> Self {
        super::init_test_logging();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The underlying server, for one-off mocks.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// A client with a fixed session token.
    pub fn client(&self) -> LedgerClient {
        LedgerClient::with_http_client(
            &self.uri(),
            Arc::new(StaticTokenProvider::new(TEST_TOKEN)),
            reqwest::Client::new(),
        )
    }

    /// A client that creates its session token against this server.
    pub fn session_client(&self) -> LedgerClient {
        let auth = SessionTokenProvider::new(
            &self.uri(),
            "consumer-token",
            "employee-token",
            reqwest::Client::new(),
        );
        LedgerClient::new(&self.uri(), Arc::new(auth), Duration::from_secs(5)).unwrap()
    }

    /// Number of requests received so far for `method path`.
    pub async fn request_count(&self, http_method: &str, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
            .count()
    }

    async fn mount(&self, mock: Mock, expect: Option<u64>) {
        match expect {
            Some(n) => mock.expect(n).mount(&self.server).await,
            None => mock.mount(&self.server).await,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub async fn mock_session(&self, token: &str, expect: Option<u64>) {
        let mock = Mock::given(method("PUT"))
            .and(path("/token/session/:create"))
            .and(query_param("consumerToken", "consumer-token"))
            .and(query_param("employeeToken", "employee-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "id": 1, "token": token }
            })));
        self.mount(mock, expect).await;
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn mock_create_customer(&self, remote_id: i64, expect: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path("/customer"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "value": { "id": remote_id } })),
            );
        self.mount(mock, expect).await;
    }

    pub async fn mock_list_customers(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/customer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub async fn mock_create_order(&self, remote_id: i64, expect: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path("/order"))
            .and(header("authorization", "Basic MDp0ZXN0LXRva2Vu"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "value": { "id": remote_id } })),
            );
        self.mount(mock, expect).await;
    }

    pub async fn mock_get_order(&self, order_id: i64, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/order/{order_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": body })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_list_orders(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// `PUT /order/{id}/:invoice` answering with `invoice`.
    pub async fn mock_invoice_from_order(&self, order_id: i64, invoice: Value, expect: Option<u64>) {
        let mock = Mock::given(method("PUT"))
            .and(path(format!("/order/{order_id}/:invoice")))
            .and(query_param("sendToCustomer", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": invoice })));
        self.mount(mock, expect).await;
    }

    /// `PUT /order/{id}/:invoice` matching only the given `invoiceDate`.
    pub async fn mock_invoice_from_order_dated(
        &self,
        order_id: i64,
        invoice_date: &str,
        invoice: Value,
        expect: Option<u64>,
    ) {
        let mock = Mock::given(method("PUT"))
            .and(path(format!("/order/{order_id}/:invoice")))
            .and(query_param("invoiceDate", invoice_date))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": invoice })));
        self.mount(mock, expect).await;
    }

    /// `PUT /order/{id}/:invoice` failing with `status`.
    pub async fn mock_invoice_from_order_failure(&self, order_id: i64, status: u16, expect: Option<u64>) {
        let mock = Mock::given(method("PUT"))
            .and(path(format!("/order/{order_id}/:invoice")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "status": status,
                "message": "Internal error"
            })));
        self.mount(mock, expect).await;
    }

    pub async fn mock_create_invoice(&self, invoice: Value, expect: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path("/invoice"))
            .and(query_param("sendToCustomer", "false"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "value": invoice })));
        self.mount(mock, expect).await;
    }

    pub async fn mock_get_invoice(&self, invoice_id: i64, invoice: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/invoice/{invoice_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": invoice })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_get_invoice_failure(&self, invoice_id: i64, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/invoice/{invoice_id}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_list_invoices(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/invoice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_approve(&self, invoice_id: i64, status: u16, expect: Option<u64>) {
        let mock = Mock::given(method("PUT"))
            .and(path(format!("/invoice/{invoice_id}/:approve")))
            .respond_with(ResponseTemplate::new(status));
        self.mount(mock, expect).await;
    }

    pub async fn mock_send(&self, invoice_id: i64, status: u16, expect: Option<u64>) {
        let mock = Mock::given(method("PUT"))
            .and(path(format!("/invoice/{invoice_id}/:send")))
            .and(query_param("sendType", "EMAIL"))
            .respond_with(ResponseTemplate::new(status));
        self.mount(mock, expect).await;
    }

    // =========================================================================
    // Vouchers
    // =========================================================================

    pub async fn mock_get_voucher(&self, voucher_id: i64, attachment_id: Option<i64>) {
        let attachment = attachment_id.map_or(Value::Null, |id| json!({ "id": id }));
        Mock::given(method("GET"))
            .and(path(format!("/ledger/voucher/{voucher_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {
                    "id": voucher_id,
                    "number": 42,
                    "description": "Invoice 10",
                    "attachment": attachment
                }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_upload_attachment(&self, voucher_id: i64, status: u16, expect: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path(format!("/ledger/voucher/{voucher_id}/attachment")))
            .respond_with(ResponseTemplate::new(status).set_body_string(if status < 300 {
                ""
            } else {
                "{\"message\":\"Attachment rejected\"}"
            }));
        self.mount(mock, expect).await;
    }
}

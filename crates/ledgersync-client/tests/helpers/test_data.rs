//! Test data for ledgersync integration tests.
//!
//! JSON builders shaped like the remote platform's payloads, plus helpers
//! that seed the in-memory mirror store.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use ledgersync_db::{Customer, InMemoryLedgerStore, MirrorStore};
use serde_json::{json, Value};

/// Remote id of the customer used throughout the saga examples.
pub const CUSTOMER_REMOTE_ID: i64 = 80_389_576;
pub const ORDER_REMOTE_ID: i64 = 1001;
pub const INVOICE_REMOTE_ID: i64 = 555;
pub const VOUCHER_ID: i64 = 9001;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Flags of a remote invoice payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceFlags {
    pub voucher_id: Option<i64>,
    pub is_approved: bool,
    pub is_charged: bool,
}

impl InvoiceFlags {
    pub fn draft() -> Self {
        Self::default()
    }

    pub fn with_voucher(voucher_id: i64) -> Self {
        Self {
            voucher_id: Some(voucher_id),
            ..Self::default()
        }
    }

    pub fn charged() -> Self {
        Self {
            voucher_id: Some(VOUCHER_ID),
            is_approved: true,
            is_charged: true,
        }
    }
}

/// A remote invoice object (the `value` of `GET /invoice/{id}`).
pub fn invoice_json(id: i64, amount: f64, flags: InvoiceFlags) -> Value {
    let voucher = flags.voucher_id.map_or(Value::Null, |v| json!({ "id": v }));
    json!({
        "id": id,
        "invoiceNumber": 10,
        "invoiceDate": "2025-01-10",
        "invoiceDueDate": "2025-01-24",
        "amount": amount,
        "currency": { "id": 1, "code": "NOK" },
        "customer": { "id": CUSTOMER_REMOTE_ID },
        "voucher": voucher,
        "isApproved": flags.is_approved,
        "isCharged": flags.is_charged,
        "orders": [{ "id": ORDER_REMOTE_ID }]
    })
}

/// An invoice list entry owned by `customer_remote_id`.
pub fn invoice_list_entry(id: i64, customer_remote_id: i64, voucher_id: Option<i64>) -> Value {
    let mut invoice = invoice_json(id, 200.0, InvoiceFlags::default());
    invoice["customer"] = json!({ "id": customer_remote_id });
    invoice["voucher"] = voucher_id.map_or(Value::Null, |v| json!({ "id": v }));
    invoice
}

pub fn customer_json(id: i64, name: &str, email: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "organizationNumber": "987654321",
        "phoneNumber": "+47 22 00 00 00",
        "postalAddress": {
            "addressLine1": "Storgata 1",
            "postalCode": "0155",
            "city": "Oslo"
        }
    })
}

pub fn order_json(id: i64, customer_remote_id: i64, amount: f64) -> Value {
    json!({
        "id": id,
        "number": id.to_string(),
        "status": "Created",
        "totalAmount": amount,
        "orderDate": "2025-01-10",
        "customer": { "id": customer_remote_id }
    })
}

/// A paged list body.
pub fn page(values: Vec<Value>) -> Value {
    json!({
        "fullResultSize": values.len(),
        "from": 0,
        "count": values.len(),
        "values": values
    })
}

pub fn new_store() -> Arc<InMemoryLedgerStore> {
    Arc::new(InMemoryLedgerStore::new())
}

/// Insert a customer, provisioned remotely when `remote_id` is set.
pub async fn seed_customer(store: &InMemoryLedgerStore, remote_id: Option<i64>) -> Customer {
    MirrorStore::<Customer>::add(
        store,
        Customer {
            remote_id,
            name: Some("Acme AS".to_string()),
            email: Some("billing@acme.example".to_string()),
            address_line1: Some("Storgata 1".to_string()),
            postal_code: Some("0155".to_string()),
            city: Some("Oslo".to_string()),
            ..Customer::default()
        },
    )
    .await
    .unwrap()
}

//! Wire types for the remote platform.
//!
//! Response structs keep every field optional, mirroring what the platform
//! may omit. Each is turned into a typed snapshot exactly once via `parse`,
//! so business logic never probes for field presence itself.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Single-object response wrapper: `{"value": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueEnvelope<T> {
    pub value: Option<T>,
}

impl<T> ValueEnvelope<T> {
    /// Unwrap the payload, failing with a protocol error if it is absent.
    pub fn into_value(self, what: &str) -> LedgerResult<T> {
        self.value
            .ok_or_else(|| LedgerError::protocol(format!("{what} response has no value")))
    }
}

/// Paged list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub full_result_size: Option<i64>,
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

/// Reference to another remote resource by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl IdRef {
    #[must_use]
    pub fn to(id: i64) -> Self {
        Self { id: Some(id) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrencyRef {
    #[serde(default)]
    pub code: Option<String>,
}

// ── Customers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<IdRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCustomer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub organization_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub postal_address: Option<RemoteAddress>,
}

/// Body of `POST /customer`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteCustomer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_customer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_address: Option<RemoteAddress>,
}

/// Response of any create call; only the id matters.
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub id: Option<i64>,
}

impl Created {
    pub fn parse(self, what: &str) -> LedgerResult<i64> {
        self.id
            .ok_or_else(|| LedgerError::protocol(format!("created {what} has no id")))
    }
}

// ── Orders ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub count: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price_excluding_vat_currency: Decimal,
}

/// Body of `POST /order`, also embedded in `POST /invoice`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteOrder {
    pub customer: IdRef,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub invoices_due_in: i64,
    pub order_lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "amount", with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    #[serde(default)]
    pub customer: Option<IdRef>,
}

/// A remote order with the fields the sync relies on resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub id: i64,
    pub number: String,
    pub status: Option<String>,
    pub amount: Decimal,
    pub order_date: NaiveDate,
    pub customer_id: Option<i64>,
}

impl RemoteOrder {
    pub fn parse(self) -> LedgerResult<OrderSnapshot> {
        let id = self
            .id
            .ok_or_else(|| LedgerError::protocol("order has no id"))?;
        let order_date = self
            .order_date
            .ok_or_else(|| LedgerError::protocol(format!("order {id} has no orderDate")))?;
        Ok(OrderSnapshot {
            id,
            number: self.number.unwrap_or_default(),
            status: self.status.filter(|s| !s.is_empty()),
            amount: self.total_amount.unwrap_or_default(),
            order_date,
            customer_id: self.customer.and_then(|c| c.id),
        })
    }
}

// ── Invoices ──────────────────────────────────────────────────────────

/// Body of `POST /invoice` (invoice with embedded order).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteInvoice {
    pub customer: IdRef,
    pub invoice_date: NaiveDate,
    pub invoice_due_date: NaiveDate,
    pub orders: Vec<NewRemoteOrder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInvoice {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub invoice_number: Option<i64>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_due_date: Option<NaiveDate>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<CurrencyRef>,
    #[serde(default)]
    pub customer: Option<IdRef>,
    #[serde(default)]
    pub voucher: Option<IdRef>,
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default)]
    pub is_charged: Option<bool>,
    #[serde(default)]
    pub orders: Option<Vec<IdRef>>,
}

/// A remote invoice with every optional field resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSnapshot {
    pub id: i64,
    pub number: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub currency: String,
    pub customer_id: Option<i64>,
    /// Ledger voucher; absent until the platform has materialized it.
    pub voucher_id: Option<i64>,
    pub is_approved: bool,
    pub is_charged: bool,
    pub order_ids: Vec<i64>,
}

impl RemoteInvoice {
    pub fn parse(self) -> LedgerResult<InvoiceSnapshot> {
        let id = self
            .id
            .ok_or_else(|| LedgerError::protocol("invoice has no id"))?;
        Ok(InvoiceSnapshot {
            id,
            number: self.invoice_number,
            invoice_date: self.invoice_date,
            due_date: self.invoice_due_date,
            amount: self.amount.unwrap_or_default(),
            currency: self
                .currency
                .and_then(|c| c.code)
                .unwrap_or_else(|| ledgersync_db::models::invoice::DEFAULT_CURRENCY.to_string()),
            customer_id: self.customer.and_then(|c| c.id),
            voucher_id: self.voucher.and_then(|v| v.id).filter(|id| *id > 0),
            is_approved: self.is_approved.unwrap_or(false),
            is_charged: self.is_charged.unwrap_or(false),
            order_ids: self
                .orders
                .unwrap_or_default()
                .into_iter()
                .filter_map(|o| o.id)
                .collect(),
        })
    }
}

// ── Vouchers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteVoucher {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub attachment: Option<IdRef>,
}

/// A ledger voucher plus the raw payload it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherSnapshot {
    pub id: i64,
    pub attachment_id: Option<i64>,
    pub raw: serde_json::Value,
}

impl VoucherSnapshot {
    /// Parse the `value` object of a voucher response.
    pub fn parse(voucher_id: i64, raw: serde_json::Value) -> LedgerResult<Self> {
        let voucher: RemoteVoucher = serde_json::from_value(raw.clone()).map_err(|e| {
            LedgerError::protocol(format!("voucher {voucher_id} is malformed: {e}"))
        })?;
        Ok(Self {
            id: voucher.id.unwrap_or(voucher_id),
            attachment_id: voucher.attachment.and_then(|a| a.id),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoice_parse_resolves_optional_fields() {
        let remote: RemoteInvoice = serde_json::from_value(json!({
            "id": 555,
            "invoiceNumber": 10,
            "invoiceDate": "2025-01-10",
            "invoiceDueDate": "2025-01-24",
            "amount": 200.0,
            "currency": { "id": 1, "code": "NOK" },
            "customer": { "id": 80389576 },
            "voucher": { "id": 9001 },
            "isApproved": true,
            "orders": [{ "id": 1001 }, { "url": "no-id" }]
        }))
        .unwrap();

        let snapshot = remote.parse().unwrap();
        assert_eq!(snapshot.id, 555);
        assert_eq!(snapshot.amount, Decimal::new(200, 0));
        assert_eq!(snapshot.customer_id, Some(80_389_576));
        assert_eq!(snapshot.voucher_id, Some(9001));
        assert!(snapshot.is_approved);
        assert!(!snapshot.is_charged);
        assert_eq!(snapshot.order_ids, vec![1001]);
    }

    #[test]
    fn test_invoice_parse_defaults() {
        let remote: RemoteInvoice =
            serde_json::from_value(json!({ "id": 1, "voucher": null })).unwrap();
        let snapshot = remote.parse().unwrap();
        assert_eq!(snapshot.currency, "NOK");
        assert_eq!(snapshot.voucher_id, None);
        assert!(snapshot.order_ids.is_empty());
    }

    #[test]
    fn test_invoice_without_id_is_protocol_error() {
        let err = RemoteInvoice::default().parse().unwrap_err();
        assert!(matches!(err, LedgerError::RemoteProtocol(_)));
    }

    #[test]
    fn test_order_parse_requires_date() {
        let remote: RemoteOrder =
            serde_json::from_value(json!({ "id": 4, "number": "10045" })).unwrap();
        assert!(matches!(
            remote.parse(),
            Err(LedgerError::RemoteProtocol(_))
        ));
    }

    #[test]
    fn test_new_order_serializes_camel_case() {
        let order = NewRemoteOrder {
            customer: IdRef::to(80_389_576),
            order_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            invoices_due_in: 14,
            order_lines: vec![NewOrderLine {
                description: "Invoice amount 200.00".into(),
                count: Decimal::ONE,
                unit_price_excluding_vat_currency: Decimal::new(20000, 2),
            }],
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["customer"]["id"], 80_389_576);
        assert_eq!(value["orderDate"], "2025-01-10");
        assert_eq!(value["invoicesDueIn"], 14);
        assert_eq!(value["orderLines"][0]["unitPriceExcludingVatCurrency"], 200.0);
    }

    #[test]
    fn test_voucher_attachment_detection() {
        let with = VoucherSnapshot::parse(9001, json!({ "id": 9001, "attachment": { "id": 42 } }))
            .unwrap();
        assert_eq!(with.attachment_id, Some(42));

        let without = VoucherSnapshot::parse(9001, json!({ "id": 9001 })).unwrap();
        assert_eq!(without.attachment_id, None);
        assert_eq!(without.raw["id"], 9001);
    }
}

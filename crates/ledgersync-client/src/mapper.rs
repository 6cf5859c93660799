//! Record mapper: translates between remote payloads and mirror rows.

use chrono::NaiveDate;
use ledgersync_db::{Customer, Invoice, SaleOrder};
use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    IdRef, InvoiceSnapshot, NewOrderLine, NewRemoteCustomer, NewRemoteOrder, OrderSnapshot,
    RemoteAddress, RemoteCustomer,
};

/// Country id the platform assigns to Norway; used for new customer addresses.
const DEFAULT_COUNTRY_ID: i64 = 160;

/// Maps remote payloads into mirror rows and local rows into remote requests.
pub struct RecordMapper;

impl RecordMapper {
    /// Map a remote customer into a mirror row (local id unassigned).
    pub fn customer_from_remote(remote: &RemoteCustomer) -> LedgerResult<Customer> {
        let remote_id = remote
            .id
            .ok_or_else(|| LedgerError::protocol("customer has no id"))?;
        let address = remote.postal_address.clone().unwrap_or_default();
        Ok(Customer {
            remote_id: Some(remote_id),
            name: remote.name.clone(),
            email: remote.email.clone(),
            organization_number: remote.organization_number.clone(),
            phone_number: remote.phone_number.clone(),
            postal_address: format_postal_address(&address),
            address_line1: address.address_line1,
            postal_code: address.postal_code,
            city: address.city,
            country: None,
            ..Customer::default()
        })
    }

    /// Map a remote order. `customer_id` is the local owner, if resolved.
    #[must_use]
    pub fn sale_order_from_remote(snapshot: &OrderSnapshot, customer_id: Option<i64>) -> SaleOrder {
        SaleOrder {
            remote_id: Some(snapshot.id),
            number: snapshot.number.clone(),
            status: snapshot.status.clone().unwrap_or_default(),
            amount: snapshot.amount,
            order_date: snapshot.order_date,
            customer_id,
            ..SaleOrder::default()
        }
    }

    /// Map a remote invoice owned by a locally known, provisioned customer.
    pub fn invoice_from_remote(snapshot: &InvoiceSnapshot, customer: &Customer) -> LedgerResult<Invoice> {
        let customer_remote_id = customer.remote_id.ok_or_else(|| {
            LedgerError::precondition(format!("customer {} has no remote id", customer.id))
        })?;
        let invoice_created = snapshot.invoice_date.ok_or_else(|| {
            LedgerError::protocol(format!("invoice {} has no invoiceDate", snapshot.id))
        })?;
        Ok(Invoice {
            remote_id: Some(snapshot.id),
            voucher_id: snapshot.voucher_id,
            status: Self::invoice_status(snapshot),
            total: snapshot.amount,
            currency: snapshot.currency.clone(),
            invoice_created,
            invoice_due_date: snapshot.due_date.unwrap_or(invoice_created),
            customer_id: customer.id,
            customer_remote_id,
            sale_order_id: None,
            ..Invoice::default()
        })
    }

    /// Display status combining lifecycle state and amount,
    /// e.g. `"Approved (200.00 NOK)"`.
    #[must_use]
    pub fn invoice_status(snapshot: &InvoiceSnapshot) -> String {
        let lifecycle = if snapshot.is_charged {
            "Charged"
        } else if snapshot.is_approved {
            "Approved"
        } else {
            "Draft"
        };
        format!("{lifecycle} ({:.2} {})", snapshot.amount, snapshot.currency)
    }

    /// Build the `POST /customer` body for a local customer.
    pub fn new_remote_customer(customer: &Customer) -> LedgerResult<NewRemoteCustomer> {
        let name = customer
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                LedgerError::precondition(format!("customer {} has no name", customer.id))
            })?;

        let has_address = customer.address_line1.is_some()
            || customer.postal_code.is_some()
            || customer.city.is_some();
        let postal_address = has_address.then(|| RemoteAddress {
            address_line1: customer.address_line1.clone(),
            postal_code: customer.postal_code.clone(),
            city: customer.city.clone(),
            country: Some(IdRef::to(DEFAULT_COUNTRY_ID)),
        });

        Ok(NewRemoteCustomer {
            name,
            email: customer.email.clone(),
            organization_number: customer.organization_number.clone(),
            phone_number: customer.phone_number.clone(),
            is_customer: true,
            postal_address,
        })
    }

    /// Build a single-line order request.
    #[must_use]
    pub fn order_request(
        customer_remote_id: i64,
        amount: Decimal,
        order_date: NaiveDate,
        due_date: NaiveDate,
        description: Option<&str>,
    ) -> NewRemoteOrder {
        let description = description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Invoice amount {amount:.2}"));
        NewRemoteOrder {
            customer: IdRef::to(customer_remote_id),
            order_date,
            delivery_date: order_date,
            invoices_due_in: (due_date - order_date).num_days().max(0),
            order_lines: vec![NewOrderLine {
                description,
                count: Decimal::ONE,
                unit_price_excluding_vat_currency: amount,
            }],
        }
    }
}

fn format_postal_address(address: &RemoteAddress) -> Option<String> {
    let locality = [address.postal_code.as_deref(), address.city.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let parts: Vec<&str> = [address.address_line1.as_deref(), Some(locality.as_str())]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

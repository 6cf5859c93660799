//! Invoice provisioning saga.
//!
//! Drives one invoice through the remote pipeline:
//!
//! `Init → OrderCreated → InvoiceCreated → VoucherResolved → AttachmentUploaded → Approved → Sent`
//!
//! Every step is a plain async call that either completes or fails; callers
//! own retries beyond the built-in invoice-creation retry. Local rows are
//! committed right after each remote acceptance, so a later failure leaves a
//! recoverable trail and re-invoking the saga for the same order picks up
//! where the store says it stopped. Nothing created remotely is ever deleted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use ledgersync_db::models::sale_order::{STATUS_CREATED, STATUS_INVOICED};
use ledgersync_db::{
    Customer, Invoice, InvoiceStore, LedgerStore, MirrorRecord, MirrorStore, SaleOrder,
};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::audit::{status_for_error, AuditLog, StepAudit};
use crate::client::LedgerClient;
use crate::error::{LedgerError, LedgerResult};
use crate::mapper::RecordMapper;
use crate::models::InvoiceSnapshot;
use crate::retry::RetryPolicy;

/// Audit `from_endpoint` for steps initiated by this service.
const LOCAL_ENDPOINT: &str = "ledgersync";

/// Position of a saga run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SagaState {
    Init,
    OrderCreated,
    InvoiceCreated,
    VoucherResolved,
    AttachmentUploaded,
    Approved,
    Sent,
}

/// Outcome of a best-effort step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// Not needed (no payload, already approved, already charged).
    Skipped,
    /// Could not run yet; the voucher has not materialized.
    Deferred,
}

/// Result of the voucher-resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherResolution {
    Resolved(i64),
    /// The platform has not created the voucher yet; poll again later.
    NotYetAvailable,
}

/// A document to attach to the invoice's ledger voucher.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Produces the invoice document when the caller supplies none.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, invoice: &Invoice, customer: &Customer) -> LedgerResult<Attachment>;
}

/// Input of a full saga run.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    /// Local customer id.
    pub customer_id: i64,
    pub amount: Decimal,
    /// Order and invoice date; today when absent.
    pub invoice_date: Option<NaiveDate>,
    /// Due date; invoice date plus the configured due days when absent.
    pub due_date: Option<NaiveDate>,
    /// Order line text; derived from the amount when absent.
    pub description: Option<String>,
    pub attachment: Option<Attachment>,
    /// Acting user recorded in the audit log.
    pub user_id: String,
}

/// Mutable state of one saga run, rebuilt from the store on resumption.
#[derive(Debug, Clone)]
pub struct SagaRun {
    pub state: SagaState,
    pub customer: Customer,
    pub order: Option<SaleOrder>,
    pub invoice: Option<Invoice>,
}

impl SagaRun {
    fn require(&self, state: SagaState, step: &str) -> LedgerResult<()> {
        if self.state < state {
            return Err(LedgerError::precondition(format!(
                "{step} requires state {state:?}, run is at {:?}",
                self.state
            )));
        }
        Ok(())
    }

    fn advance(&mut self, state: SagaState) {
        self.state = self.state.max(state);
    }

    fn order(&self) -> LedgerResult<&SaleOrder> {
        self.order
            .as_ref()
            .ok_or_else(|| LedgerError::precondition("saga run has no sales order"))
    }

    fn invoice(&self) -> LedgerResult<&Invoice> {
        self.invoice
            .as_ref()
            .ok_or_else(|| LedgerError::precondition("saga run has no invoice"))
    }
}

/// Outcome of the approve/send step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub approval: StepStatus,
    pub send: StepStatus,
}

/// Terminal result of a saga run.
///
/// A run that returns at all has produced a remote invoice; the step
/// statuses describe the best-effort refinements layered on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaOutcome {
    pub state: SagaState,
    pub remote_invoice_id: i64,
    /// Local invoice id.
    pub invoice_id: i64,
    /// Local sales order id.
    pub sale_order_id: i64,
    /// `None` when the voucher was not needed.
    pub voucher: Option<VoucherResolution>,
    pub attachment: StepStatus,
    pub approval: StepStatus,
    pub send: StepStatus,
}

impl SagaOutcome {
    /// Whether any best-effort step failed or was deferred.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        [self.attachment, self.approval, self.send]
            .iter()
            .any(|s| matches!(s, StepStatus::Failed | StepStatus::Deferred))
    }
}

/// Attachment presence report for operator debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentVerification {
    pub remote_invoice_id: i64,
    pub voucher_id: i64,
    pub has_attachment: bool,
    pub attachment_id: Option<i64>,
    /// The voucher payload as returned by the platform.
    pub raw: serde_json::Value,
}

/// Orchestrates invoice provisioning against the remote platform.
pub struct InvoiceSaga {
    client: LedgerClient,
    store: Arc<dyn LedgerStore>,
    audit: AuditLog,
    retry_policy: RetryPolicy,
    invoice_due_days: i64,
    renderer: Option<Arc<dyn DocumentRenderer>>,
}

impl InvoiceSaga {
    #[must_use]
    pub fn new(
        client: LedgerClient,
        store: Arc<dyn LedgerStore>,
        retry_policy: RetryPolicy,
        invoice_due_days: i64,
    ) -> Self {
        Self {
            client,
            audit: AuditLog::new(Arc::clone(&store)),
            store,
            retry_policy,
            invoice_due_days,
            renderer: None,
        }
    }

    /// Render documents with `renderer` when a request carries no attachment.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Run the whole pipeline for a new invoice.
    ///
    /// Fails only if the order or the invoice could not be created. The
    /// voucher is resolved only when there is a document to attach.
    pub async fn execute(&self, request: InvoiceRequest) -> LedgerResult<SagaOutcome> {
        let (invoice_date, due_date) = self.dates(request.invoice_date, request.due_date);
        let mut run = self.create_order(&request).await?;
        self.create_invoice(&mut run, invoice_date, due_date).await?;
        Ok(self
            .complete(&mut run, request.attachment, &request.user_id)
            .await)
    }

    /// Re-invoke the pipeline for an order created by an earlier run.
    ///
    /// Never creates a second remote invoice for the order.
    pub async fn resume_for_order(
        &self,
        sale_order_id: i64,
        attachment: Option<Attachment>,
        user_id: &str,
    ) -> LedgerResult<SagaOutcome> {
        let order = MirrorStore::<SaleOrder>::get(self.store.as_ref(), sale_order_id)
            .await?
            .ok_or_else(|| {
                LedgerError::precondition(format!("sales order {sale_order_id} not found"))
            })?;
        if order.remote_id.is_none() {
            return Err(LedgerError::precondition(format!(
                "sales order {sale_order_id} was never created remotely"
            )));
        }
        let customer_id = order.customer_id.ok_or_else(|| {
            LedgerError::precondition(format!("sales order {sale_order_id} has no customer"))
        })?;
        let customer = self.provisioned_customer(customer_id).await?;

        // Invoice dates follow the order so they match its `invoicesDueIn`.
        let (invoice_date, due_date) = self.dates(Some(order.order_date), None);
        let mut run = SagaRun {
            state: SagaState::OrderCreated,
            customer,
            order: Some(order),
            invoice: None,
        };
        self.create_invoice(&mut run, invoice_date, due_date).await?;
        Ok(self.complete(&mut run, attachment, user_id).await)
    }

    /// Rebuild the run for an existing local invoice.
    pub async fn load_run(&self, invoice_id: i64) -> LedgerResult<SagaRun> {
        let invoice = MirrorStore::<Invoice>::get(self.store.as_ref(), invoice_id)
            .await?
            .ok_or_else(|| LedgerError::precondition(format!("invoice {invoice_id} not found")))?;
        if invoice.remote_id.is_none() {
            return Err(LedgerError::precondition(format!(
                "invoice {invoice_id} has no remote id"
            )));
        }
        let customer = MirrorStore::<Customer>::get(self.store.as_ref(), invoice.customer_id)
            .await?
            .ok_or_else(|| {
                LedgerError::precondition(format!("customer {} not found", invoice.customer_id))
            })?;
        let order = match invoice.sale_order_id {
            Some(id) => MirrorStore::<SaleOrder>::get(self.store.as_ref(), id).await?,
            None => None,
        };
        let state = if invoice.voucher_id.is_some() {
            SagaState::VoucherResolved
        } else {
            SagaState::InvoiceCreated
        };
        Ok(SagaRun {
            state,
            customer,
            order,
            invoice: Some(invoice),
        })
    }

    // ── Steps ─────────────────────────────────────────────────────────

    /// Init → OrderCreated.
    ///
    /// The customer must already have a remote id. The local sales order is
    /// committed immediately after the platform accepts the order.
    pub async fn create_order(&self, request: &InvoiceRequest) -> LedgerResult<SagaRun> {
        let customer = self.provisioned_customer(request.customer_id).await?;
        let customer_remote_id = customer.remote_id.unwrap_or_default();
        let (order_date, due_date) = self.dates(request.invoice_date, request.due_date);

        let order_request = RecordMapper::order_request(
            customer_remote_id,
            request.amount,
            order_date,
            due_date,
            request.description.as_deref(),
        );
        let remote_order_id = self.client.create_order(&order_request).await.map_err(|e| {
            error!(customer_id = customer.id, step = "create_order", error = %e, "Order creation failed");
            e
        })?;

        let order = MirrorStore::<SaleOrder>::add(
            self.store.as_ref(),
            SaleOrder {
                remote_id: Some(remote_order_id),
                number: remote_order_id.to_string(),
                status: STATUS_CREATED.to_string(),
                amount: request.amount,
                order_date,
                customer_id: Some(customer.id),
                ..SaleOrder::default()
            },
        )
        .await?;

        info!(
            sale_order_id = order.id,
            remote_order_id,
            customer_id = customer.id,
            "Sales order created"
        );
        Ok(SagaRun {
            state: SagaState::OrderCreated,
            customer,
            order: Some(order),
            invoice: None,
        })
    }

    /// OrderCreated → InvoiceCreated.
    ///
    /// Skips the remote call if the store already links an invoice to the
    /// order. Invoice creation is retried per the retry policy; exhausting it
    /// fails the saga and leaves the order in place.
    pub async fn create_invoice(
        &self,
        run: &mut SagaRun,
        invoice_date: NaiveDate,
        due_date: NaiveDate,
    ) -> LedgerResult<()> {
        run.require(SagaState::OrderCreated, "create_invoice")?;
        let order = run.order()?.clone();
        let remote_order_id = order.remote_id.ok_or_else(|| {
            LedgerError::precondition(format!("sales order {} has no remote id", order.id))
        })?;

        if let Some(existing) = self.store.get_by_sale_order(order.id).await? {
            info!(
                sale_order_id = order.id,
                invoice_id = existing.id,
                remote_invoice_id = ?existing.remote_id,
                "Invoice already exists for order, skipping creation"
            );
            run.invoice = Some(existing);
            run.advance(SagaState::InvoiceCreated);
            return Ok(());
        }

        let result = self
            .retry_policy
            .execute("create_invoice", || {
                self.client
                    .create_invoice_from_order(remote_order_id, invoice_date)
            })
            .await;

        let mut snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(
                    sale_order_id = order.id,
                    remote_order_id,
                    step = "create_invoice",
                    error = %e,
                    "Invoice creation failed; order left for manual reconciliation"
                );
                return Err(e);
            }
        };
        snapshot.invoice_date.get_or_insert(invoice_date);
        snapshot.due_date.get_or_insert(due_date);
        if snapshot.amount.is_zero() {
            snapshot.amount = order.amount;
        }

        let invoice = self.persist_new_invoice(&snapshot, &run.customer, order.id).await?;

        let mut invoiced = order;
        invoiced.status = STATUS_INVOICED.to_string();
        let invoiced = MirrorStore::<SaleOrder>::update(self.store.as_ref(), &invoiced).await?;

        info!(
            sale_order_id = invoiced.id,
            invoice_id = invoice.id,
            remote_invoice_id = snapshot.id,
            "Invoice created"
        );
        run.order = Some(invoiced);
        run.invoice = Some(invoice);
        run.advance(SagaState::InvoiceCreated);
        Ok(())
    }

    /// InvoiceCreated → VoucherResolved.
    ///
    /// Returns [`VoucherResolution::NotYetAvailable`] rather than an error when
    /// the platform has not materialized the voucher yet.
    pub async fn resolve_voucher(&self, run: &mut SagaRun) -> LedgerResult<VoucherResolution> {
        run.require(SagaState::InvoiceCreated, "resolve_voucher")?;
        let invoice = run.invoice()?.clone();
        if let Some(voucher_id) = invoice.voucher_id {
            run.advance(SagaState::VoucherResolved);
            return Ok(VoucherResolution::Resolved(voucher_id));
        }

        let remote_id = remote_invoice_id(&invoice)?;
        let snapshot = self.client.get_invoice(remote_id).await?;
        let Some(voucher_id) = snapshot.voucher_id else {
            info!(invoice_id = invoice.id, remote_invoice_id = remote_id, "Voucher not yet available");
            return Ok(VoucherResolution::NotYetAvailable);
        };

        let mut resolved = invoice;
        resolved.voucher_id = Some(voucher_id);
        resolved.status = RecordMapper::invoice_status(&snapshot);
        let resolved = MirrorStore::<Invoice>::update(self.store.as_ref(), &resolved).await?;

        info!(invoice_id = resolved.id, voucher_id, "Voucher resolved");
        run.invoice = Some(resolved);
        run.advance(SagaState::VoucherResolved);
        Ok(VoucherResolution::Resolved(voucher_id))
    }

    /// VoucherResolved → AttachmentUploaded.
    ///
    /// Non-fatal: failures are audited and reported as [`StepStatus::Failed`].
    /// Without a payload the step is skipped. Every upload attempt writes
    /// one audit entry.
    pub async fn upload_attachment(
        &self,
        run: &mut SagaRun,
        attachment: Option<Attachment>,
        user_id: &str,
    ) -> StepStatus {
        let attachment = match attachment {
            Some(attachment) => attachment,
            None => match self.render(run, user_id).await {
                Some(rendered) => rendered,
                None if self.renderer.is_some() => return StepStatus::Failed,
                None => {
                    run.advance(SagaState::AttachmentUploaded);
                    return StepStatus::Skipped;
                }
            },
        };

        let Some((invoice_id, voucher_id)) = run
            .invoice
            .as_ref()
            .and_then(|i| i.voucher_id.map(|v| (i.id, v)))
        else {
            warn!(state = ?run.state, "Attachment deferred: voucher not resolved");
            return StepStatus::Deferred;
        };

        let to_endpoint = format!("/ledger/voucher/{voucher_id}/attachment");
        let title = format!("Upload attachment for invoice {invoice_id}");
        let step = StepAudit {
            user_id,
            title: &title,
            from_endpoint: LOCAL_ENDPOINT,
            to_endpoint: &to_endpoint,
        };

        let result = self
            .client
            .upload_voucher_attachment(voucher_id, &attachment.filename, attachment.bytes)
            .await;
        self.audit.record_result(&step, &result).await;
        run.advance(SagaState::AttachmentUploaded);

        match result {
            Ok(()) => {
                info!(invoice_id, voucher_id, filename = %attachment.filename, "Attachment uploaded");
                StepStatus::Succeeded
            }
            Err(e) => {
                warn!(invoice_id, voucher_id, step = "upload_attachment", error = %e, "Attachment upload failed");
                StepStatus::Failed
            }
        }
    }

    /// AttachmentUploaded → Approved → Sent.
    ///
    /// Reads the current `isCharged`/`isApproved` flags first. A charged
    /// invoice is final, so both approval and send are skipped. Otherwise the
    /// invoice is approved if needed and always sent. Failures are audited and
    /// never fatal.
    pub async fn finalize(&self, run: &mut SagaRun, user_id: &str) -> LedgerResult<FinalizeOutcome> {
        run.require(SagaState::InvoiceCreated, "finalize")?;
        let invoice = run.invoice()?.clone();
        let remote_id = remote_invoice_id(&invoice)?;

        let mut snapshot = match self.client.get_invoice(remote_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(invoice_id = invoice.id, step = "finalize", error = %e, "Could not read invoice flags");
                let title = format!("Read flags of invoice {}", invoice.id);
                let to_endpoint = format!("/invoice/{remote_id}");
                let step = StepAudit {
                    user_id,
                    title: &title,
                    from_endpoint: LOCAL_ENDPOINT,
                    to_endpoint: &to_endpoint,
                };
                self.audit
                    .record(&step, status_for_error(&e), Some(e.to_string()))
                    .await;
                return Ok(FinalizeOutcome {
                    approval: StepStatus::Failed,
                    send: StepStatus::Failed,
                });
            }
        };

        if snapshot.is_charged {
            info!(invoice_id = invoice.id, remote_invoice_id = remote_id, "Invoice already charged; skipping approve and send");
            self.refresh_status(run, &snapshot).await;
            run.advance(SagaState::Sent);
            return Ok(FinalizeOutcome {
                approval: StepStatus::Skipped,
                send: StepStatus::Skipped,
            });
        }

        let approval = if snapshot.is_approved {
            StepStatus::Skipped
        } else {
            let result = self.client.approve_invoice(remote_id).await;
            self.audit_step(user_id, "Approve", &invoice, &format!("/invoice/{remote_id}/:approve"), &result)
                .await;
            match result {
                Ok(()) => {
                    snapshot.is_approved = true;
                    StepStatus::Succeeded
                }
                Err(e) => {
                    warn!(invoice_id = invoice.id, step = "approve", error = %e, "Approval failed; invoice stays in draft");
                    StepStatus::Failed
                }
            }
        };
        if approval != StepStatus::Failed {
            run.advance(SagaState::Approved);
        }

        let result = self.client.send_invoice(remote_id).await;
        self.audit_step(user_id, "Send", &invoice, &format!("/invoice/{remote_id}/:send"), &result)
            .await;
        let send = match result {
            Ok(()) => {
                if approval != StepStatus::Failed {
                    run.advance(SagaState::Sent);
                }
                StepStatus::Succeeded
            }
            Err(e) => {
                warn!(invoice_id = invoice.id, step = "send", error = %e, "Send failed");
                StepStatus::Failed
            }
        };

        self.refresh_status(run, &snapshot).await;
        info!(invoice_id = invoice.id, ?approval, ?send, "Invoice finalized");
        Ok(FinalizeOutcome { approval, send })
    }

    /// Resolve the voucher of a remote invoice and report whether it carries
    /// an attachment.
    pub async fn verify_attachment(&self, remote_invoice_id: i64) -> LedgerResult<AttachmentVerification> {
        let snapshot = self.client.get_invoice(remote_invoice_id).await?;
        let voucher_id = snapshot.voucher_id.ok_or_else(|| {
            LedgerError::NotYetAvailable(format!("invoice {remote_invoice_id} has no voucher yet"))
        })?;
        let voucher = self.client.get_voucher(voucher_id).await?;
        Ok(AttachmentVerification {
            remote_invoice_id,
            voucher_id,
            has_attachment: voucher.attachment_id.is_some(),
            attachment_id: voucher.attachment_id,
            raw: voucher.raw,
        })
    }

    // ── Internals ─────────────────────────────────────────────────────

    async fn complete(
        &self,
        run: &mut SagaRun,
        attachment: Option<Attachment>,
        user_id: &str,
    ) -> SagaOutcome {
        let wants_attachment = attachment.is_some() || self.renderer.is_some();
        let voucher = if wants_attachment {
            match self.resolve_voucher(run).await {
                Ok(resolution) => Some(resolution),
                Err(e) => {
                    warn!(step = "resolve_voucher", error = %e, "Voucher resolution failed");
                    None
                }
            }
        } else {
            None
        };

        let attachment_status = if wants_attachment && voucher.is_none() {
            StepStatus::Failed
        } else {
            self.upload_attachment(run, attachment, user_id).await
        };

        let finalize = match self.finalize(run, user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(step = "finalize", error = %e, "Finalization failed");
                FinalizeOutcome {
                    approval: StepStatus::Failed,
                    send: StepStatus::Failed,
                }
            }
        };

        let invoice = run.invoice.clone().unwrap_or_default();
        SagaOutcome {
            state: run.state,
            remote_invoice_id: invoice.remote_id.unwrap_or_default(),
            invoice_id: invoice.id,
            sale_order_id: run.order.as_ref().map_or(0, |o| o.id),
            voucher,
            attachment: attachment_status,
            approval: finalize.approval,
            send: finalize.send,
        }
    }

    fn dates(&self, invoice_date: Option<NaiveDate>, due_date: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
        let invoice_date = invoice_date.unwrap_or_else(|| Utc::now().date_naive());
        let due_date = due_date.unwrap_or(invoice_date + Duration::days(self.invoice_due_days));
        (invoice_date, due_date)
    }

    async fn provisioned_customer(&self, customer_id: i64) -> LedgerResult<Customer> {
        let customer = MirrorStore::<Customer>::get(self.store.as_ref(), customer_id)
            .await?
            .ok_or_else(|| LedgerError::precondition(format!("customer {customer_id} not found")))?;
        if !customer.is_provisioned() {
            return Err(LedgerError::precondition(format!(
                "customer {customer_id} has no remote id; provision it first"
            )));
        }
        Ok(customer)
    }

    async fn persist_new_invoice(
        &self,
        snapshot: &InvoiceSnapshot,
        customer: &Customer,
        sale_order_id: i64,
    ) -> LedgerResult<Invoice> {
        let mut invoice = RecordMapper::invoice_from_remote(snapshot, customer)?;
        // Resolved by its own step.
        invoice.voucher_id = None;
        invoice.sale_order_id = Some(sale_order_id);

        // A sync may have pulled the invoice in between.
        match MirrorStore::<Invoice>::get_by_remote_id(self.store.as_ref(), snapshot.id).await? {
            Some(mut existing) => {
                existing.merge_remote(&invoice);
                existing.sale_order_id = Some(sale_order_id);
                Ok(MirrorStore::<Invoice>::update(self.store.as_ref(), &existing).await?)
            }
            None => Ok(MirrorStore::<Invoice>::add(self.store.as_ref(), invoice).await?),
        }
    }

    async fn refresh_status(&self, run: &mut SagaRun, snapshot: &InvoiceSnapshot) {
        let Some(invoice) = run.invoice.as_ref() else {
            return;
        };
        let status = RecordMapper::invoice_status(snapshot);
        if invoice.status == status {
            return;
        }
        let mut updated = invoice.clone();
        updated.status = status;
        match MirrorStore::<Invoice>::update(self.store.as_ref(), &updated).await {
            Ok(saved) => run.invoice = Some(saved),
            Err(e) => warn!(invoice_id = updated.id, error = %e, "Failed to store invoice status"),
        }
    }

    async fn render(&self, run: &SagaRun, user_id: &str) -> Option<Attachment> {
        let renderer = self.renderer.as_ref()?;
        let invoice = run.invoice.as_ref()?;
        match renderer.render(invoice, &run.customer).await {
            Ok(attachment) => Some(attachment),
            Err(e) => {
                warn!(invoice_id = invoice.id, error = %e, "Document rendering failed");
                let title = format!("Render document for invoice {}", invoice.id);
                let step = StepAudit {
                    user_id,
                    title: &title,
                    from_endpoint: LOCAL_ENDPOINT,
                    to_endpoint: LOCAL_ENDPOINT,
                };
                self.audit
                    .record(&step, status_for_error(&e), Some(e.to_string()))
                    .await;
                None
            }
        }
    }

    async fn audit_step(
        &self,
        user_id: &str,
        action: &str,
        invoice: &Invoice,
        to_endpoint: &str,
        result: &LedgerResult<()>,
    ) {
        let title = format!("{action} invoice {}", invoice.id);
        let step = StepAudit {
            user_id,
            title: &title,
            from_endpoint: LOCAL_ENDPOINT,
            to_endpoint,
        };
        self.audit.record_result(&step, result).await;
    }
}

fn remote_invoice_id(invoice: &Invoice) -> LedgerResult<i64> {
    invoice
        .remote_id
        .ok_or_else(|| LedgerError::precondition(format!("invoice {} has no remote id", invoice.id)))
}

//! Invoice commands - drive the provisioning saga step by step or end to end

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use ledgersync_client::saga::{
    FinalizeOutcome, InvoiceRequest, InvoiceSaga, SagaOutcome, StepStatus, VoucherResolution,
};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use super::{print_json, AppContext};
use crate::error::{CliError, CliResult};
use crate::renderer::{attachment_from_file, DirectoryRenderer};

#[derive(Args, Debug)]
pub struct InvoiceArgs {
    #[command(subcommand)]
    pub command: InvoiceCommand,

    /// Acting user recorded in the audit log
    #[arg(long, global = true, env = "LEDGERSYNC_USER", default_value = "cli")]
    pub user: String,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum InvoiceCommand {
    /// Create an order and invoice it, then attach, approve and send
    Create {
        /// Local customer id (must be provisioned remotely)
        #[arg(long)]
        customer: i64,

        /// Amount excluding VAT, e.g. 200.00
        #[arg(long)]
        amount: Decimal,

        /// Order and invoice date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Due date (YYYY-MM-DD), defaults to the configured due days after the invoice date
        #[arg(long)]
        due_date: Option<NaiveDate>,

        /// Order line text
        #[arg(long)]
        description: Option<String>,

        /// Document to attach to the invoice voucher
        #[arg(long, conflicts_with = "documents")]
        attachment: Option<PathBuf>,

        /// Directory holding pre-rendered `invoice-<remote id>.pdf` documents
        #[arg(long)]
        documents: Option<PathBuf>,
    },

    /// Continue the saga for a sales order created by an earlier run
    Resume {
        /// Local sales order id
        sale_order: i64,

        /// Document to attach to the invoice voucher
        #[arg(long)]
        attachment: Option<PathBuf>,
    },

    /// Resolve the ledger voucher of a local invoice
    Voucher {
        /// Local invoice id
        id: i64,
    },

    /// Approve (if needed) and send a local invoice
    Finalize {
        /// Local invoice id
        id: i64,
    },

    /// Report whether a remote invoice's voucher carries an attachment
    Verify {
        /// Remote invoice id
        remote_id: i64,
    },
}

pub async fn execute(args: InvoiceArgs) -> CliResult<()> {
    let ctx = AppContext::load().await?;
    let saga = InvoiceSaga::new(
        ctx.client,
        ctx.store,
        ctx.config.retry,
        ctx.config.invoice_due_days,
    );

    match args.command {
        InvoiceCommand::Create {
            customer,
            amount,
            date,
            due_date,
            description,
            attachment,
            documents,
        } => {
            if amount <= Decimal::ZERO {
                return Err(CliError::Validation("amount must be positive".into()));
            }
            let attachment = match attachment {
                Some(path) => Some(attachment_from_file(&path).await?),
                None => None,
            };
            let saga = match documents {
                Some(dir) => saga.with_renderer(Arc::new(DirectoryRenderer::new(dir))),
                None => saga,
            };
            let outcome = saga
                .execute(InvoiceRequest {
                    customer_id: customer,
                    amount,
                    invoice_date: date,
                    due_date,
                    description,
                    attachment,
                    user_id: args.user,
                })
                .await?;
            report_outcome(&outcome, args.json)
        }
        InvoiceCommand::Resume {
            sale_order,
            attachment,
        } => {
            let attachment = match attachment {
                Some(path) => Some(attachment_from_file(&path).await?),
                None => None,
            };
            let outcome = saga
                .resume_for_order(sale_order, attachment, &args.user)
                .await?;
            report_outcome(&outcome, args.json)
        }
        InvoiceCommand::Voucher { id } => {
            let mut run = saga.load_run(id).await?;
            match saga.resolve_voucher(&mut run).await? {
                VoucherResolution::Resolved(voucher_id) => {
                    if args.json {
                        return print_json(&json!({ "invoice_id": id, "voucher_id": voucher_id }));
                    }
                    println!("Invoice {id}: voucher {voucher_id}");
                    Ok(())
                }
                VoucherResolution::NotYetAvailable => Err(CliError::NotYetAvailable(format!(
                    "invoice {id} has no voucher yet"
                ))),
            }
        }
        InvoiceCommand::Finalize { id } => {
            let mut run = saga.load_run(id).await?;
            let FinalizeOutcome { approval, send } = saga.finalize(&mut run, &args.user).await?;
            if args.json {
                print_json(&json!({
                    "invoice_id": id,
                    "approval": status_label(approval),
                    "send": status_label(send),
                }))?;
            } else {
                println!("Invoice {id}: approval {}, send {}", status_label(approval), status_label(send));
            }
            if approval == StepStatus::Failed || send == StepStatus::Failed {
                return Err(CliError::Partial { invoice_id: id });
            }
            Ok(())
        }
        InvoiceCommand::Verify { remote_id } => {
            let verification = saga.verify_attachment(remote_id).await?;
            if args.json {
                return print_json(&json!({
                    "remote_invoice_id": verification.remote_invoice_id,
                    "voucher_id": verification.voucher_id,
                    "has_attachment": verification.has_attachment,
                    "attachment_id": verification.attachment_id,
                    "raw": verification.raw,
                }));
            }
            println!(
                "Invoice {remote_id}: voucher {}, attachment {}",
                verification.voucher_id,
                verification
                    .attachment_id
                    .map_or_else(|| "none".to_string(), |a| a.to_string())
            );
            Ok(())
        }
    }
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "succeeded",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
        StepStatus::Deferred => "deferred",
    }
}

fn report_outcome(outcome: &SagaOutcome, as_json: bool) -> CliResult<()> {
    info!(
        invoice_id = outcome.invoice_id,
        remote_invoice_id = outcome.remote_invoice_id,
        state = ?outcome.state,
        "Invoice saga finished"
    );
    let voucher = match outcome.voucher {
        Some(VoucherResolution::Resolved(id)) => json!(id),
        Some(VoucherResolution::NotYetAvailable) => json!("pending"),
        None => serde_json::Value::Null,
    };

    if as_json {
        print_json(&json!({
            "invoice_id": outcome.invoice_id,
            "remote_invoice_id": outcome.remote_invoice_id,
            "sale_order_id": outcome.sale_order_id,
            "state": format!("{:?}", outcome.state),
            "voucher": voucher,
            "attachment": status_label(outcome.attachment),
            "approval": status_label(outcome.approval),
            "send": status_label(outcome.send),
        }))?;
    } else {
        println!(
            "Invoice {} (remote {}) from order {}",
            outcome.invoice_id, outcome.remote_invoice_id, outcome.sale_order_id
        );
        println!("  voucher:    {voucher}");
        println!("  attachment: {}", status_label(outcome.attachment));
        println!("  approval:   {}", status_label(outcome.approval));
        println!("  send:       {}", status_label(outcome.send));
    }

    if outcome.is_partial() {
        return Err(CliError::Partial {
            invoice_id: outcome.invoice_id,
        });
    }
    Ok(())
}

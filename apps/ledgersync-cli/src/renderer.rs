//! Document sources for invoice attachments.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ledgersync_client::saga::{Attachment, DocumentRenderer};
use ledgersync_client::{LedgerError, LedgerResult};
use ledgersync_db::{Customer, Invoice};

/// Read an attachment from disk, named after the file.
pub async fn attachment_from_file(path: &Path) -> LedgerResult<Attachment> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        LedgerError::precondition(format!("cannot read {}: {e}", path.display()))
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice.pdf".to_string());
    Ok(Attachment { filename, bytes })
}

/// Picks up pre-rendered documents from a directory.
///
/// The document for an invoice is `<dir>/invoice-<remote id>.pdf`.
#[derive(Debug, Clone)]
pub struct DirectoryRenderer {
    dir: PathBuf,
}

impl DirectoryRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, invoice: &Invoice) -> PathBuf {
        let key = invoice.remote_id.unwrap_or(invoice.id);
        self.dir.join(format!("invoice-{key}.pdf"))
    }
}

#[async_trait]
impl DocumentRenderer for DirectoryRenderer {
    async fn render(&self, invoice: &Invoice, _customer: &Customer) -> LedgerResult<Attachment> {
        attachment_from_file(&self.path_for(invoice)).await
    }
}

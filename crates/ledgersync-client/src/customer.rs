//! Remote customer provisioning.

use std::sync::Arc;

use ledgersync_db::{Customer, LedgerStore, MirrorStore};
use tracing::{debug, info};

use crate::client::LedgerClient;
use crate::error::{LedgerError, LedgerResult};
use crate::mapper::RecordMapper;

/// Pushes local customers to the remote platform so they obtain a remote id.
pub struct CustomerProvisioner {
    client: LedgerClient,
    store: Arc<dyn LedgerStore>,
}

impl CustomerProvisioner {
    #[must_use]
    pub fn new(client: LedgerClient, store: Arc<dyn LedgerStore>) -> Self {
        Self { client, store }
    }

    /// Create the customer remotely and store the returned remote id.
    ///
    /// A customer that already has a remote id is returned unchanged.
    pub async fn provision(&self, customer_id: i64) -> LedgerResult<Customer> {
        let customer = MirrorStore::<Customer>::get(self.store.as_ref(), customer_id)
            .await?
            .ok_or_else(|| LedgerError::precondition(format!("customer {customer_id} not found")))?;

        if let Some(remote_id) = customer.remote_id {
            debug!(customer_id, remote_id, "Customer already provisioned");
            return Ok(customer);
        }

        let request = RecordMapper::new_remote_customer(&customer)?;
        let remote_id = self.client.create_customer(&request).await?;

        let mut provisioned = customer;
        provisioned.remote_id = Some(remote_id);
        let provisioned = MirrorStore::<Customer>::update(self.store.as_ref(), &provisioned).await?;

        info!(customer_id, remote_id, "Customer provisioned");
        Ok(provisioned)
    }
}

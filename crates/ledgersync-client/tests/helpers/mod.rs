pub mod mock_ledger_server;
pub mod test_data;

use std::sync::Once;

static INIT: Once = Once::new();

/// Route saga and sync logs to the test writer when `RUST_LOG` is set.
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

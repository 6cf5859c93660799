//! Doctor command - diagnose configuration, database and platform connectivity

use clap::Args;
use ledgersync_client::{build_client_from_config, LedgerConfig};
use ledgersync_db::{AuditStore, PgLedgerStore};
use serde_json::json;

use super::{connect_store, print_json};
use crate::error::{CliError, CliResult};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

/// Arguments for the doctor command
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one diagnostic check.
#[derive(Debug, Clone)]
struct Check {
    name: &'static str,
    passed: bool,
    message: String,
}

impl Check {
    fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
        }
    }

    fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
        }
    }
}

async fn check_database() -> Check {
    match connect_store().await {
        Ok(store) => match check_schema(&store).await {
            Ok(()) => Check::pass("database", "Connected"),
            Err(e) => Check::fail("database", e),
        },
        Err(e) => Check::fail("database", e.to_string()),
    }
}

async fn check_schema(store: &PgLedgerStore) -> Result<(), String> {
    store
        .recent(1)
        .await
        .map(|_| ())
        .map_err(|e| format!("Schema check failed: {e} (run 'ledgersync migrate')"))
}

async fn check_platform(config: &LedgerConfig) -> Check {
    let client = match build_client_from_config(config) {
        Ok(client) => client,
        Err(e) => return Check::fail("platform", e.to_string()),
    };
    match client.ping().await {
        Ok(()) => Check::pass("platform", format!("Authenticated against {}", client.base_url())),
        Err(e) => Check::fail("platform", e.to_string()),
    }
}

pub async fn execute(args: DoctorArgs) -> CliResult<()> {
    let mut checks = Vec::new();

    match LedgerConfig::from_env() {
        Ok(config) => {
            checks.push(Check::pass("configuration", format!("API base URL {}", config.api_base_url)));
            checks.push(check_platform(&config).await);
        }
        Err(e) => checks.push(Check::fail("configuration", e.to_string())),
    }
    checks.push(check_database().await);

    if args.json {
        let rows: Vec<_> = checks
            .iter()
            .map(|c| json!({ "check": c.name, "passed": c.passed, "message": c.message }))
            .collect();
        print_json(&json!(rows))?;
    } else {
        let use_color = std::env::var("NO_COLOR").is_err();
        for check in &checks {
            let (mark, color) = if check.passed { ("ok", GREEN) } else { ("FAIL", RED) };
            if use_color {
                println!("{color}{mark:>4}{RESET}  {:<14} {}", check.name, check.message);
            } else {
                println!("{mark:>4}  {:<14} {}", check.name, check.message);
            }
        }
    }

    let failed = checks.iter().filter(|c| !c.passed).count();
    if failed > 0 {
        return Err(CliError::Config(format!("{failed} check(s) failed")));
    }
    Ok(())
}

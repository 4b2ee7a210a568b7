//! bwh-repo: converge one BorgWarehouse repository on its desired state.
//!
//! Prints `{changed, repository, error}` as JSON on stdout and exits non-zero
//! when the run failed. Logs go to stderr.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bwh_repo::model::{DEFAULT_ALERT, DEFAULT_COMMENT, DEFAULT_STORAGE_SIZE};
use bwh_repo::{DesiredState, Intent, Params};

/// BorgWarehouse repository reconciler
#[derive(Parser, Debug)]
#[command(name = "bwh-repo", version, about)]
struct Args {
    /// BorgWarehouse URL (e.g., http://borgwarehouse.lan:3000)
    #[arg(long, env = "BWH_URL")]
    url: String,

    /// BorgWarehouse API token
    #[arg(long, env = "BWH_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Repository name
    #[arg(long)]
    alias: String,

    /// SSH public key allowed to push to the repository
    #[arg(long)]
    ssh_public_key: String,

    /// Whether the repository should exist
    #[arg(long, value_enum, default_value_t = Intent::Present)]
    state: Intent,

    /// Storage size in GB
    #[arg(long, default_value_t = DEFAULT_STORAGE_SIZE)]
    size: i64,

    /// Backup alert threshold in seconds
    #[arg(long, default_value_t = DEFAULT_ALERT)]
    alert: i64,

    /// Free-text comment
    #[arg(long, default_value = DEFAULT_COMMENT)]
    comment: String,

    /// Dry run: report changed=false without contacting the backend
    #[arg(long)]
    check: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl From<Args> for Params {
    fn from(args: Args) -> Self {
        Params {
            url: args.url,
            api_token: args.api_token,
            desired: DesiredState {
                alias: args.alias,
                ssh_public_key: args.ssh_public_key,
                storage_size: args.size,
                alert: args.alert,
                comment: args.comment,
                intent: args.state,
            },
            check_mode: args.check,
            timeout: Duration::from_secs(args.timeout),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bwh_repo=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let params = Params::from(Args::parse());
    info!(
        "Reconciling repository {} ({:?}) on {}",
        params.desired.alias, params.desired.intent, params.url
    );

    let result = bwh_repo::run(&params).await;
    let out = serde_json::to_string(&result).context("Failed to serialize result")?;
    println!("{}", out);

    Ok(if result.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

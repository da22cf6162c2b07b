//! Reallocator CLI - move a Deployment's pods away from a set of nodes

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use reallocator::client::KubeDeploymentClient;
use reallocator::config::ReallocatorConfig;
use reallocator::deployment::DeploymentHandle;
use reallocator::kube_utils::create_client;
use reallocator::telemetry::{init_logging, LogFormat};
use reallocator::Reallocator;

/// Exit code when the run completes with `status: false`
const EXIT_REALLOCATION_FAILED: i32 = 2;

/// Move a Deployment's pods away from the given nodes
#[derive(Parser, Debug)]
#[command(name = "reallocator", version, about, long_about = None)]
struct Cli {
    /// Deployment to reallocate
    #[arg(short, long, env = "REALLOCATOR_DEPLOYMENT")]
    deployment: String,

    /// Namespace of the deployment
    #[arg(short, long, env = "REALLOCATOR_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Node hostnames to move pods away from (repeatable or comma-separated)
    #[arg(long = "avoid", required = true, value_delimiter = ',')]
    avoid: Vec<String>,

    /// Path to a kubeconfig; inferred when omitted
    #[arg(long, env = "REALLOCATOR_KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// JSON file overriding timings and attempt caps
    #[arg(short = 'c', long = "config", env = "REALLOCATOR_CONFIG")]
    config_file: Option<PathBuf>,

    /// Log output format (text or json)
    #[arg(long, env = "REALLOCATOR_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format)?;

    let config = match &cli.config_file {
        Some(path) => ReallocatorConfig::from_file(path)?,
        None => ReallocatorConfig::default(),
    };

    let client = create_client(cli.kubeconfig.as_deref()).await?;
    let handle = DeploymentHandle::new(cli.deployment, cli.namespace);

    let reallocator =
        Reallocator::new(Arc::new(KubeDeploymentClient::new(client)), handle, config).await?;
    let outcome = reallocator.reallocate(&cli.avoid).await;

    println!("{}", serde_json::to_string(&outcome)?);

    if !outcome.status {
        std::process::exit(EXIT_REALLOCATION_FAILED);
    }
    Ok(())
}

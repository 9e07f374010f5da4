//! gateway CLI: run the HTTP gateway or drive one operation by hand.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use queue_gateway::backend::{self, Backends};
use queue_gateway::config::Config;
use queue_gateway::coordinator::Coordinator;
use queue_gateway::health::HealthMonitor;
use queue_gateway::http::{self, GatewayState};
use queue_gateway::model::{Existence, Health};
use queue_gateway::telemetry::{TelemetryConfig, init_telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "gateway", about = "Submission gateway for Redis + RabbitMQ")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to both backends and serve HTTP
    Serve,
    /// Check whether a key was already submitted
    Check {
        /// Work item key
        key: String,
    },
    /// Record a key and enqueue its message
    Submit {
        /// Work item key
        key: String,
        /// Message handed to the queue
        message: String,
    },
    /// Print backend health; exits non-zero when unhealthy
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "queue-gateway".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    // Fatal bootstrap errors end the process with a non-zero exit.
    let backends = backend::bootstrap(&config).await?;

    match cli.command {
        Command::Serve => cmd_serve(&config, &backends).await,
        Command::Check { key } => cmd_check(&config, &backends, &key).await,
        Command::Submit { key, message } => cmd_submit(&config, &backends, &key, &message).await,
        Command::Health => cmd_health(&backends).await,
    }
}

async fn cmd_serve(config: &Config, backends: &Backends) -> anyhow::Result<()> {
    let state = GatewayState::new(backends, config.payload_format);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    http::serve(listener, state, async {
        tokio::signal::ctrl_c().await.ok();
        info!("shutting down");
    })
    .await?;
    Ok(())
}

async fn cmd_check(config: &Config, backends: &Backends, key: &str) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_backends(backends, config.payload_format);
    match coordinator.check_existence(key).await? {
        Existence::Exists => println!("Key already exists: {key}"),
        Existence::NotExists => println!("Key does not exist: {key}"),
    }
    Ok(())
}

async fn cmd_submit(
    config: &Config,
    backends: &Backends,
    key: &str,
    message: &str,
) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_backends(backends, config.payload_format);
    let receipt = coordinator.submit(key, message).await?;
    println!(
        "Submitted: {} (id {}, at {})",
        receipt.key,
        receipt.id,
        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

async fn cmd_health(backends: &Backends) -> anyhow::Result<()> {
    let report = HealthMonitor::from_backends(backends).report().await;
    let label = |h: Health| match h {
        Health::Healthy => "healthy",
        Health::Unhealthy => "unhealthy",
    };
    println!("Redis:    {}", label(report.store));
    println!("RabbitMQ: {}", label(report.queue));

    match report.first_failure() {
        None => Ok(()),
        Some(backend) => anyhow::bail!("{backend} connection failed"),
    }
}

//! `sitegate` edge server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitegate_core::ConfigLoader;
use sitegate_edge::{EdgeState, Gate, OriginClient, Settings, build_router, telemetry};
use sitegate_identity_oidc::{JwksSessionVerifier, OidcClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "sitegate",
    version,
    about = "Authentication and routing gate for a multi-tenant static site"
)]
struct Cli {
    /// Settings file (defaults to $SITEGATE_CONFIG_FILE or sitegate.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the edge server
    Serve,
    /// Load and validate settings, then print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::CheckConfig => {
            print_summary(&settings);
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> Result<()> {
    telemetry::init(&settings)?;

    let store = settings.secret_store()?;
    let loader = Arc::new(ConfigLoader::new(
        store,
        settings.secrets.parameter_name.clone(),
    ));
    let verifier = JwksSessionVerifier::new(&settings.identity)
        .context("Failed to create session verifier")?;
    let exchanger =
        OidcClient::new(&settings.identity).context("Failed to create identity client")?;
    let gate = Gate::new(
        settings.gate.clone(),
        loader,
        Arc::new(verifier),
        Arc::new(exchanger),
    );
    let origin = OriginClient::new(
        &settings.server.origin_url,
        Duration::from_secs(settings.server.origin_timeout_seconds),
    )
    .context("Failed to create origin client")?;

    let app = build_router(EdgeState::new(gate, origin));

    let addr = settings.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        %addr,
        apex_domain = %settings.gate.apex_domain,
        origin = %settings.server.origin_url,
        "sitegate listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("sitegate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn print_summary(settings: &Settings) {
    println!("✓ Settings loaded successfully!");

    println!("\nServer:");
    println!("  Listen: {}", settings.socket_addr());
    println!("  Origin: {}", settings.server.origin_url);

    println!("\nGate:");
    println!("  Apex domain: {}", settings.gate.apex_domain);
    println!(
        "  Cookie: {} (max-age {}s)",
        settings.gate.cookie_name, settings.gate.cookie_max_age_seconds
    );
    println!("  Not-found page: {}", settings.gate.not_found_path);
    println!("  Logout path: {}", settings.gate.logout_path);

    println!("\nIdentity:");
    println!("  Issuer template: {}", settings.identity.issuer_url_template);
    println!("  HTTP timeout: {}s", settings.identity.http_timeout_seconds);
    println!("  Leeway: {}s", settings.identity.leeway_seconds);

    println!("\nSecrets:");
    println!("  Provider: {:?}", settings.secrets.provider);
    println!("  Parameter: {}", settings.secrets.parameter_name);

    println!("\nLogging:");
    println!("  Level: {}", settings.logging.level);
    println!("  Format: {}", settings.logging.format);
    println!("  Filter: {}", settings.log_filter());
}

use anyhow::Result;
use clap::Parser;
use mcp_remote_inspector::{
    adapters::{console::Console, rmcp_client::RmcpConnector},
    app::{inspector_service::InspectorService, registry::SessionRegistry},
    infra::config::AppConfig,
    shared::types::TransportKind,
};
use std::{io, path::PathBuf, sync::Arc};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interactive inspector for remote MCP servers over SSE or streamable HTTP."
)]
struct Args {
    /// Transport active at start (sse | streamable_http)
    #[arg(long)]
    transport: Option<TransportKind>,

    /// Server URL for the SSE session
    #[arg(long)]
    sse_url: Option<String>,

    /// Server URL for the streamable HTTP session
    #[arg(long)]
    http_url: Option<String>,

    /// Directory holding default.toml / <profile>.toml / local.toml
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Connect the active transport before reading commands
    #[arg(long)]
    connect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    // stdout belongs to the console; logs go to stderr
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let mut config = match &args.config_dir {
        Some(dir) => AppConfig::load_from_dir(dir)?,
        None => AppConfig::load()?,
    };
    if args.sse_url.is_some() {
        config.sse_url = args.sse_url.clone();
    }
    if args.http_url.is_some() {
        config.streamable_http_url = args.http_url.clone();
    }
    if args.transport.is_some() {
        config.transport = args.transport;
    }

    let connector = RmcpConnector::new(config.client_name()).with_auth_token(config.auth_token.clone());
    let registry = SessionRegistry::new(
        config.url_for(TransportKind::Sse),
        config.url_for(TransportKind::StreamableHttp),
    );
    let service = InspectorService::new(Arc::new(connector), registry)
        .with_connect_timeout(config.connect_timeout());
    service.switch_transport(config.initial_transport());
    tracing::info!(transport = %service.active_transport(), "inspector starting");

    if args.connect {
        let kind = service.active_transport();
        let outcome = service.connect(kind).await;
        tracing::info!(transport = %kind, outcome = outcome.as_str(), "initial connect settled");
    }

    let console = Console::new(service);
    let mut stdout = io::stdout();
    console
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await?;
    Ok(())
}

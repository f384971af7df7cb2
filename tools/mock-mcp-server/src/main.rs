use std::{env, net::SocketAddr};

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let sse_addr: SocketAddr = env::var("MOCK_SSE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9100".into())
        .parse()?;
    let http_addr: SocketAddr = env::var("MOCK_HTTP_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9101".into())
        .parse()?;

    tracing::info!(
        sse = %format!("http://{sse_addr}{}", mock_mcp_server::SSE_PATH),
        http = %format!("http://{http_addr}{}", mock_mcp_server::STREAMABLE_HTTP_PATH),
        "mock server starting"
    );

    let sse_ct = mock_mcp_server::serve_sse(sse_addr).await?;
    let http_ct = mock_mcp_server::serve_streamable_http(TcpListener::bind(http_addr).await?).await?;

    let _ = signal::ctrl_c().await;
    tracing::info!("shutting down");
    sse_ct.cancel();
    http_ct.cancel();
    Ok(())
}

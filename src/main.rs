//! wiresql server binary

use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wiresql::server::{DEFAULT_PORT, Server};

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "In-memory SQL database server")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "WIRESQL_PORT")]
    port: u16,
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "WIRESQL_LISTEN")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Cli { port, listen } = Cli::parse();
    let addr: SocketAddr = format!("{listen}:{port}").parse()?;

    tracing::info!(%addr, "starting wiresql");
    let server = Server::bind(addr).await?;
    server.serve().await?;
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use dirserve::config::{
    ConfigValidator, ServerConfig, ServerConfigBuilder, build_file_server, load_config,
};
use dirserve::tracing_setup::init_tracing;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// YAML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve (overrides the config file)
    #[clap(short, long)]
    root: Option<String>,

    /// Address to listen on (overrides the config file)
    #[clap(short, long)]
    listen_addr: Option<String>,

    /// Generate listings for directories without an index document
    #[clap(long)]
    autoindex: bool,

    /// Prefix stripped from request paths
    #[clap(long)]
    prefix: Option<String>,

    /// Index document names, in lookup order
    #[clap(long = "index")]
    index: Vec<String>,

    /// Log in human readable form instead of JSON
    #[clap(long)]
    pretty_logs: bool,
}

async fn resolve_config(args: &Args) -> Result<ServerConfig> {
    let mut builder = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            let config = load_config(path)
                .await
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            ServerConfigBuilder::from_config(config)
        }
        None => ServerConfig::builder(),
    };

    if let Some(root) = &args.root {
        builder = builder.root(root.clone());
    }
    if let Some(addr) = &args.listen_addr {
        builder = builder.listen_addr(addr.clone());
    }
    if args.autoindex {
        builder = builder.autoindex(true);
    }
    if let Some(prefix) = &args.prefix {
        builder = builder.prefix(prefix.clone());
    }
    if !args.index.is_empty() {
        builder = builder.index(args.index.iter().cloned());
    }

    let config = builder
        .build()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    ConfigValidator::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(!args.pretty_logs).map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;

    let config = resolve_config(&args).await?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;

    let file_server = build_file_server(&config)
        .await
        .context("Failed to build file server")?;

    tracing::info!(
        "Serving {} (index: {:?}, autoindex: {}, prefix: {:?})",
        config.root,
        config.index,
        config.autoindex,
        config.prefix
    );

    let app = Router::new()
        .fallback_service(file_server)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("HTTP Server error: {}", e))?;

    Ok(())
}

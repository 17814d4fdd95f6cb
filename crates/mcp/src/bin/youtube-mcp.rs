// Standalone MCP server binary

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use youtube_mcp::protocol::ServerInfo;
use youtube_mcp::server::McpServer;
use youtube_mcp::tools::{register_youtube_tools, ToolRegistry};
use youtube_mcp_core::config::DEFAULT_ENV_FILE;
use youtube_mcp_core::youtube::http_client;
use youtube_mcp_core::{Config, ConsolePrompt, CredentialBroker, YouTubeClient};

#[derive(Parser, Debug)]
#[command(name = "youtube-mcp")]
#[command(about = "YouTube Data API v3 MCP server over stdio", long_about = None)]
struct Args {
    /// Read settings from a JSON config file instead of .env (environment still overrides)
    #[arg(long)]
    json_config: bool,

    /// Path to the JSON config file, used with --json-config
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Run the OAuth2 authorization flow, replace any cached token and exit
    #[arg(long)]
    authorize: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = if args.json_config {
        Config::load(Some(args.config.as_path()))
    } else {
        Config::load_env_file(Path::new(DEFAULT_ENV_FILE))
    }
    .context("Failed to load configuration")?;

    if !config.has_credentials() {
        tracing::error!(
            credentials_file = %config.oauth2_credentials_file.display(),
            "No YouTube API key provided and no OAuth2 credentials file found"
        );
        if args.json_config {
            tracing::info!(
                "Set youtube_api_key in {} or provide {}",
                args.config.display(),
                config.oauth2_credentials_file.display()
            );
            if !args.config.exists() {
                match config.save(&args.config) {
                    Ok(()) => tracing::info!("Created sample configuration file: {}", args.config.display()),
                    Err(e) => tracing::warn!(error = %e, "Failed to create sample config file"),
                }
            }
        } else {
            tracing::info!(
                "Please create a .env file with YOUTUBE_API_KEY or provide {}",
                config.oauth2_credentials_file.display()
            );
            tracing::info!("Example .env file:");
            tracing::info!("YOUTUBE_API_KEY=your_api_key_here");
        }
        tracing::info!("You can create API credentials at: https://console.cloud.google.com/");
        bail!("missing YouTube credentials");
    }

    let user_agent = format!("{}/{}", config.server_name, config.server_version);
    let http = http_client(&user_agent)?;
    let broker = CredentialBroker::new(&config, http.clone());

    // One-shot setup phase: may block on the console for an authorization code
    let mut prompt = ConsolePrompt;
    if args.authorize {
        broker
            .reauthorize(&mut prompt)
            .await
            .context("OAuth2 authorization failed")?;
        tracing::info!(token_file = %config.token_file.display(), "OAuth2 token is ready");
        return Ok(());
    }

    let credentials = broker
        .acquire(&mut prompt)
        .await
        .context("Failed to set up YouTube credentials")?;
    let youtube = YouTubeClient::new(http, credentials).context("Failed to create YouTube client")?;

    let mut registry = ToolRegistry::new();
    register_youtube_tools(&mut registry, Arc::new(youtube));
    tracing::info!("Registered {} tools", registry.len());

    tracing::info!("Starting {} v{}", config.server_name, config.server_version);
    tracing::info!("Server description: {}", config.server_description);

    let server = McpServer::new(
        registry,
        ServerInfo {
            name: config.server_name.clone(),
            version: config.server_version.clone(),
        },
    )
    .with_instructions(config.server_description.clone());
    server.start().await?;

    Ok(())
}

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::cli;
use crate::config::{Config, ConfigKey};
use crate::github::client::GitHubClient;
use crate::output;
use crate::server::{self, AppState};

pub async fn run(
    args: Vec<String>,
    mut stdout_additional: Option<&mut dyn std::io::Write>,
) -> anyhow::Result<()> {
    match cli::parser::parse_args(&args) {
        cli::parser::Command::Serve { addr } => {
            serve(Config::from_env(), &addr, &mut stdout_additional).await?;
        }
        cli::parser::Command::Help => {
            output::print_lines(cli::parser::USAGE, &mut stdout_additional)?;
        }
        cli::parser::Command::Unknown(cmd) => {
            output::print_lines(
                &[format!("Unknown command: {cmd}"), cli::parser::USAGE[0].to_string()],
                &mut stdout_additional,
            )?;
        }
    }
    Ok(())
}

/// Binds `addr` and serves the API until Ctrl-C.
///
/// Missing secrets are only warned about here; the routes that need them
/// report the problem per request.
pub async fn serve(
    config: Config,
    addr: &str,
    stdout_additional: &mut Option<&mut dyn std::io::Write>,
) -> anyhow::Result<()> {
    for key in config.missing_secrets() {
        tracing::warn!(
            key = key.as_str(),
            "secret not configured; routes that need it will fail"
        );
    }

    let client = GitHubClient::new(config.api_base(), config.get(ConfigKey::GithubToken))?;
    let state = Arc::new(AppState::new(config, Arc::new(client)));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr().context("Failed to read bound address")?;
    tracing::info!(%local_addr, "devloop listening");
    output::print_lines(
        &[format!("Listening on http://{local_addr}")],
        stdout_additional,
    )?;

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated with an error")?;
    tracing::info!("devloop stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

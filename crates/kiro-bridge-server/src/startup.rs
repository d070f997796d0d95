use std::sync::Arc;

use anyhow::{Context, Result};
use kiro_bridge::BridgeController;
use kiro_telegram::TelegramApiClient;
use kiro_terminal::TmuxHost;
use tokio::net::TcpListener;

use crate::cli_args::BridgeServerArgs;
use crate::webhook_server::build_webhook_router;

/// Validates configuration, wires the bridge and serves the webhook until ctrl-c.
pub async fn run_bridge_server(args: BridgeServerArgs) -> Result<()> {
    let telegram_config = args.telegram_config()?;
    let bridge_config = args.bridge_config()?;
    let bind_addr = args.bind_addr()?;

    let telegram = Arc::new(TelegramApiClient::new(telegram_config)?);
    let host = Arc::new(TmuxHost::new(args.tmux_timeout_ms));
    let session_name = bridge_config.session_name.clone();
    let state_dir = bridge_config.state_dir.clone();
    let controller = BridgeController::new(bridge_config, host, telegram.clone())
        .with_context(|| format!("failed to open bridge state in {}", state_dir.display()))?;

    if args.skip_command_registration {
        tracing::info!("skipping bot command registration");
    } else if let Err(error) = telegram.register_commands().await {
        tracing::warn!(
            reason_code = error.reason_code(),
            error = %error,
            "failed to register bot commands"
        );
    }

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind webhook listener on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook listen address")?;
    tracing::info!(
        addr = %local_addr,
        tmux_session = %session_name,
        state_dir = %state_dir.display(),
        pending_turn = controller.turn_status().is_pending(),
        "kiro telegram bridge listening"
    );

    let app = build_webhook_router(controller.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook server exited unexpectedly")?;

    controller.shutdown();
    tracing::info!("kiro telegram bridge stopped");
    Ok(())
}

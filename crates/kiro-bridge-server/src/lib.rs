//! Webhook server and startup wiring for the `kiro-telegram-bridge` binary.

mod bootstrap;
pub mod cli_args;
pub mod startup;
pub mod webhook_server;

pub use bootstrap::init_tracing;
pub use cli_args::BridgeServerArgs;
pub use startup::run_bridge_server;
pub use webhook_server::{build_webhook_router, WEBHOOK_BANNER};

use anyhow::Result;
use clap::Parser;
use kiro_bridge_server::{init_tracing, run_bridge_server, BridgeServerArgs};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = BridgeServerArgs::parse();
    run_bridge_server(args).await
}

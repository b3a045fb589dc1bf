use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use planning_poker_server::assets::Assets;
use planning_poker_server::config::Args;
use planning_poker_server::Server;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let addr = args
        .listen_addr()
        .with_context(|| format!("invalid bind address: {}:{}", args.bind, args.port))?;

    let server = Server::bind(addr, Assets::new(args.assets_dir))
        .await
        .with_context(|| format!("unable to listen on {addr}"))?;

    info!("Planning poker server {}", env!("CARGO_PKG_VERSION"));
    server.run().await;
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Planning poker server - shared voting over HTTP and WebSocket
#[derive(Parser, Debug, Clone)]
#[command(name = "planning-poker-server", version)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "PLANNING_POKER_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on (0 picks a free port)
    #[arg(long, env = "PLANNING_POKER_PORT", default_value_t = 40080)]
    pub port: u16,

    /// Directory holding the bundled web client
    #[arg(long, env = "PLANNING_POKER_ASSETS", default_value = "dist")]
    pub assets_dir: PathBuf,
}

impl Args {
    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind, self.port).parse()
    }
}

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Serves policy-network chess moves over HTTP", long_about = None)]
pub struct Args {
    /// TorchScript policy network
    #[arg(long, env = "FENMOVE_MODEL", default_value = "chess_model.pt")]
    pub model: PathBuf,

    /// Move vocabulary: JSON object of UCI move to index, bincode for .bin files,
    /// or a pickled dict for .pkl files
    #[arg(long, env = "FENMOVE_VOCABULARY", default_value = "move_to_int.json")]
    pub vocabulary: PathBuf,

    #[arg(long, env = "FENMOVE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "FENMOVE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "FENMOVE_LOG", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

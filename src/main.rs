mod config;
mod constants;
mod core_cli;
mod core_fs;
mod core_ftpcommand;
mod core_log;
mod core_network;
mod helpers;
mod server;
mod session;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;
use crate::core_cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();

    core_log::logger::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    // CLI flags win over the configuration file.
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(root) = args.root {
        config.server.root_dir = root;
    }

    server::run(config).await
}

use anyhow::Result;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::Config;
use crate::core_fs::VirtualFs;
use crate::core_network::network::Server;

/// Runs the FTP server with the provided configuration until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    log_config(&config);
    let fs = build_filesystem(&config);
    let config = Arc::new(config);

    let server = Server::bind(Arc::clone(&config), Arc::new(fs)).await?;
    info!("Server listening on {}", server.local_addr()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    server.run(shutdown_rx).await
}

/// Builds the rooted filesystem view, overlaying any configured virtual
/// mount names on `/`.
pub(crate) fn build_filesystem(config: &Config) -> VirtualFs {
    let root = Path::new(&config.server.root_dir);
    if !root.is_dir() {
        warn!("Storage root {:?} does not exist yet", root);
    }
    let mut fs = VirtualFs::new(root);
    if !config.server.virtual_roots.is_empty() {
        fs.add_mount("/", config.server.virtual_roots.clone());
        for name in &config.server.virtual_roots {
            fs.add_mount(&format!("/{}", name), Vec::new());
        }
    }
    fs
}

fn log_config(config: &Config) {
    info!("  Bind Address: {}:{}", config.server.bind_address, config.server.port);
    info!("  Storage Root: {}", config.server.root_dir);
    info!(
        "  Passive Ports: {}-{}",
        config.server.passive_port_min, config.server.passive_port_max
    );
    info!("  Max Clients: {}", config.server.max_clients);
    info!("  Read Only: {}", config.server.read_only);
    info!(
        "  Data Buffer Size: {} KB",
        config.server.data_buffer_bytes / 1024
    );
}

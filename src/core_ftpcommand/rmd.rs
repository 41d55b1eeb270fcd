use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::helpers::send_response;
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the RMD command. This goes through the directory-removal path,
/// so a populated directory is refused rather than unlinked.
pub async fn handle_rmd_command(
    writer: Arc<Mutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    if config.server.read_only {
        send_response(&writer, b"550 Command disabled.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }
    if arg.trim().is_empty() {
        send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    let (fs, cwd) = {
        let session = session.lock().await;
        (Arc::clone(&session.fs), session.cwd.clone())
    };
    let path = VirtualFs::resolve(&cwd, arg.trim());

    match fs.rmdir(&path).await {
        Ok(()) => {
            info!("Removed directory {}", path);
            send_response(&writer, b"250 Directory removed.\r\n").await?;
        }
        Err(e) => {
            warn!("rmdir {} failed: {}", path, e);
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::helpers::send_response;
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the DELE command: unlinks a file.
pub async fn handle_dele_command(
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

    match fs.unlink(&path).await {
        Ok(()) => {
            info!("Deleted {}", path);
            send_response(&writer, b"250 File deleted.\r\n").await?;
        }
        Err(e) => {
            warn!("Delete of {} failed: {}", path, e);
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

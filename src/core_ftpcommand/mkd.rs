use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::helpers::{quote_path, send_response};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the MKD command: creates one directory level.
pub async fn handle_mkd_command(
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

    match fs.mkdir(&path).await {
        Ok(()) => {
            info!("Created directory {}", path);
            let reply = format!("257 {} created.\r\n", quote_path(&path));
            send_response(&writer, reply.as_bytes()).await?;
        }
        Err(e) => {
            warn!("mkdir {} failed: {}", path, e);
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::helpers::send_response;
use crate::session::Session;
use log::debug;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the RNFR command: remembers the rename source for the next RNTO.
pub async fn handle_rnfr_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    if arg.trim().is_empty() {
        send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    let (fs, cwd) = {
        let session = session.lock().await;
        (Arc::clone(&session.fs), session.cwd.clone())
    };
    let path = VirtualFs::resolve(&cwd, arg.trim());

    match fs.stat(&path).await {
        Ok(_) => {
            let mut session = session.lock().await;
            debug!("[#{}] Rename source {}", session.index, path);
            session.pending_rename = Some(path);
            drop(session);
            send_response(&writer, b"350 Ready for RNTO.\r\n").await?;
        }
        Err(e) => {
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

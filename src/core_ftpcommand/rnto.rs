use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::helpers::send_response;
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the RNTO command, completing a rename started by RNFR.
pub async fn handle_rnto_command(
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

    let (fs, cwd, from) = {
        let mut session = session.lock().await;
        (
            Arc::clone(&session.fs),
            session.cwd.clone(),
            session.pending_rename.take(),
        )
    };
    let from = match from {
        Some(from) => from,
        None => {
            send_response(&writer, b"503 Bad sequence of commands.\r\n").await?;
            return Ok(VerbOutcome::Continue);
        }
    };
    let to = VirtualFs::resolve(&cwd, arg.trim());

    match fs.rename(&from, &to).await {
        Ok(()) => {
            info!("Renamed {} -> {}", from, to);
            send_response(&writer, b"250 Rename successful.\r\n").await?;
        }
        Err(e) => {
            warn!("Rename {} -> {} failed: {}", from, to, e);
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

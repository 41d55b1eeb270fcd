use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::helpers::send_response;
use crate::session::Session;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the MDTM command: reports a file's modification time in UTC.
pub async fn handle_mdtm_command(
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
        Ok(info) => {
            let stamp = DateTime::<Utc>::from(info.mtime).format("%Y%m%d%H%M%S");
            let reply = format!("213 {}\r\n", stamp);
            send_response(&writer, reply.as_bytes()).await?;
        }
        Err(e) => {
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

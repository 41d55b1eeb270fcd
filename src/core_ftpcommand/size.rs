use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::{EntryKind, VirtualFs};
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the SIZE command for regular files.
pub async fn handle_size_command(
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
        Ok(info) if info.kind == EntryKind::File => {
            let reply = format!("213 {}\r\n", info.size);
            send_response(&writer, reply.as_bytes()).await?;
        }
        Ok(_) => {
            send_response(&writer, b"550 Not a regular file.\r\n").await?;
        }
        Err(e) => {
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

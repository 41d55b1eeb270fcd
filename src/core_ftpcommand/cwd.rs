use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use log::{debug, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub async fn handle_cwd_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    change_directory(&writer, &session, arg.trim()).await
}

/// Resolves `target` against the working directory and commits the change
/// only if it lands on a directory. CDUP funnels through here as `..`.
pub(crate) async fn change_directory(
    writer: &Arc<Mutex<TcpStream>>,
    session: &Arc<Mutex<Session>>,
    target: &str,
) -> Result<VerbOutcome, std::io::Error> {
    let (fs, cwd) = {
        let session = session.lock().await;
        (Arc::clone(&session.fs), session.cwd.clone())
    };

    match fs.chdir(&cwd, target).await {
        Ok(new_cwd) => {
            let mut session = session.lock().await;
            debug!("[#{}] cwd {} -> {}", session.index, session.cwd, new_cwd);
            session.cwd = new_cwd;
            drop(session);
            send_response(writer, b"250 Directory successfully changed.\r\n").await?;
        }
        Err(e) => {
            warn!("Failed to change directory to {:?}: {}", target, e);
            send_response(writer, e.to_ftp_response().as_bytes()).await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

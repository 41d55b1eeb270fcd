use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the USER command. Any name is accepted; authentication is only
/// decided by the following PASS.
pub async fn handle_user_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let name = arg.trim().to_string();
    if name.is_empty() {
        send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    {
        let mut session = session.lock().await;
        info!("[#{}] Login attempt for user {:?}", session.index, name);
        session.username = Some(name);
        session.authenticated = false;
    }
    send_response(&writer, b"331 User name okay, need password.\r\n").await?;
    Ok(VerbOutcome::Continue)
}

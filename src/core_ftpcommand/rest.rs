use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use log::debug;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the REST command: stores the offset the next transfer verb will
/// resume from.
pub async fn handle_rest_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    match arg.trim().parse::<u64>() {
        Ok(offset) => {
            {
                let mut session = session.lock().await;
                session.restart_marker = offset;
                debug!("[#{}] Restart marker set to {}", session.index, offset);
            }
            let reply = format!("350 Restart position accepted ({}).\r\n", offset);
            send_response(&writer, reply.as_bytes()).await?;
        }
        Err(_) => {
            send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

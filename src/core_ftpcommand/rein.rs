use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the REIN command: drops login state, working directory, and any
/// pending data endpoint, leaving the connection as if freshly accepted.
pub async fn handle_rein_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    session.lock().await.reinitialize();
    send_response(&writer, b"220 Service ready for new user.\r\n").await?;
    Ok(VerbOutcome::Continue)
}

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the QUIT command. The control connection is torn down by the
/// caller once the farewell is on the wire.
pub async fn handle_quit_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    info!("[#{}] Client signing off", session.lock().await.index);
    send_response(&writer, b"221 Service closing control connection.\r\n").await?;
    Ok(VerbOutcome::Quit)
}

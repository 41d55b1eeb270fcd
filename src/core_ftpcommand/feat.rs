use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the FEAT command with the advertised extension list.
pub async fn handle_feat_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    send_response(&writer, b"211-Features:\r\n UTF8\r\n211 End\r\n").await?;
    Ok(VerbOutcome::Continue)
}

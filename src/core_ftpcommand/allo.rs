use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// ALLO is accepted and ignored; storage is allocated on demand.
pub async fn handle_allo_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    send_response(&writer, b"202 ALLO command ignored.\r\n").await?;
    Ok(VerbOutcome::Continue)
}

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Commands on a session are processed strictly in order, so an ABOR can
/// only arrive between transfers.
pub async fn handle_abor_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    send_response(&writer, b"225 No transfer to abort.\r\n").await?;
    Ok(VerbOutcome::Continue)
}

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the OPTS command. Only the UTF8 switch is recognized, and the
/// server is UTF-8 clean either way.
pub async fn handle_opts_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let normalized = arg.trim().to_ascii_uppercase();
    if normalized == "UTF8 ON" || normalized == "UTF8" {
        send_response(&writer, b"200 UTF8 mode enabled.\r\n").await?;
    } else {
        send_response(&writer, b"502 Option not implemented.\r\n").await?;
    }
    Ok(VerbOutcome::Continue)
}

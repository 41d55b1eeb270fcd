use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the STRU command; only file structure is supported.
pub async fn handle_stru_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    if arg.trim().eq_ignore_ascii_case("F") {
        send_response(&writer, b"200 Structure set to F.\r\n").await?;
    } else {
        send_response(&writer, b"504 Structure not implemented.\r\n").await?;
    }
    Ok(VerbOutcome::Continue)
}

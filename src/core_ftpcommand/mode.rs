use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the MODE command; only stream mode is supported.
pub async fn handle_mode_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    if arg.trim().eq_ignore_ascii_case("S") {
        send_response(&writer, b"200 Mode set to S.\r\n").await?;
    } else {
        send_response(&writer, b"501 Only stream mode is supported.\r\n").await?;
    }
    Ok(VerbOutcome::Continue)
}

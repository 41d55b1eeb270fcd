use crate::config::Config;
use crate::core_ftpcommand::ftpcommand::parse_command_line;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use log::warn;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the SITE command: the leading token of the argument selects a
/// subcommand from its own vocabulary.
pub async fn handle_site_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    let (subcommand, _sub_args) = parse_command_line(trimmed);
    match subcommand.to_ascii_uppercase().as_str() {
        "HELP" => {
            send_response(
                &writer,
                b"214-The following SITE commands are recognized.\r\n HELP\r\n214 Done.\r\n",
            )
            .await?;
        }
        other => {
            warn!("Unknown SITE subcommand: {}", other);
            send_response(&writer, b"502 SITE command not implemented.\r\n").await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

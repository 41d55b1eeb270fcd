use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::{Session, TransferType};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the TYPE command. The server is binary-clean in both types, so
/// the selection is recorded and echoed back only.
pub async fn handle_type_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let selected = match arg.trim().to_ascii_uppercase().as_str() {
        "A" | "A N" => Some(TransferType::Ascii),
        "I" => Some(TransferType::Image),
        _ => None,
    };

    match selected {
        Some(transfer_type) => {
            let mut session = session.lock().await;
            session.transfer_type = transfer_type;
            let reply = format!("200 Type set to {}.\r\n", session.transfer_type.label());
            drop(session);
            send_response(&writer, reply.as_bytes()).await?;
        }
        None => {
            send_response(&writer, b"501 Type not supported.\r\n").await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

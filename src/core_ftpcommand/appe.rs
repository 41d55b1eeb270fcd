use crate::config::Config;
use crate::core_ftpcommand::stor::receive_file;
use crate::core_ftpcommand::VerbOutcome;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the APPE command: like STOR, but appends to an existing file.
pub async fn handle_appe_command(
    writer: Arc<Mutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    receive_file(&writer, &config, &session, &arg, true).await
}

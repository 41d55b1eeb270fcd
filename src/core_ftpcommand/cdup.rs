use crate::config::Config;
use crate::core_ftpcommand::cwd::change_directory;
use crate::core_ftpcommand::VerbOutcome;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub async fn handle_cdup_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    change_directory(&writer, &session, "..").await
}

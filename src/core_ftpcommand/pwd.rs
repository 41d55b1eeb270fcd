use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::{quote_path, send_response};
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub async fn handle_pwd_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let cwd = session.lock().await.cwd.clone();
    let reply = format!("257 {} is the current directory.\r\n", quote_path(&cwd));
    send_response(&writer, reply.as_bytes()).await?;
    Ok(VerbOutcome::Continue)
}

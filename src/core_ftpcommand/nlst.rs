use crate::config::Config;
use crate::core_ftpcommand::list::{transfer_listing, ListStyle};
use crate::core_ftpcommand::VerbOutcome;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the NLST command: a name-per-line listing.
pub async fn handle_nlst_command(
    writer: Arc<Mutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    transfer_listing(&writer, &config, &session, &arg, ListStyle::NamesOnly).await
}

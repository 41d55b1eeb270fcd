use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::{VirtualFs, WriteMode};
use crate::core_network::data::{establish_data_connection, TransferError};
use crate::helpers::send_response;
use crate::session::Session;
use log::{error, info, warn};
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::io::AsyncSeekExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the STOR command: receives a file from the client, truncating the
/// target or overwriting from a restart marker.
pub async fn handle_stor_command(
    writer: Arc<Mutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    receive_file(&writer, &config, &session, &arg, false).await
}

/// Shared body of STOR and APPE.
pub(crate) async fn receive_file(
    writer: &Arc<Mutex<TcpStream>>,
    config: &Arc<Config>,
    session: &Arc<Mutex<Session>>,
    arg: &str,
    append: bool,
) -> Result<VerbOutcome, std::io::Error> {
    if config.server.read_only {
        send_response(writer, b"550 Command disabled.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }
    if arg.trim().is_empty() {
        send_response(writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    let (fs, cwd, marker, has_endpoint) = {
        let mut session = session.lock().await;
        (
            Arc::clone(&session.fs),
            session.cwd.clone(),
            session.take_restart_marker(),
            session.has_data_endpoint(),
        )
    };
    let path = VirtualFs::resolve(&cwd, arg.trim());

    let mode = if append {
        WriteMode::Append
    } else if marker > 0 {
        WriteMode::Overwrite
    } else {
        WriteMode::Truncate
    };
    let mut file = match fs.open_write(&path, mode).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Upload to {} refused: {}", path, e);
            send_response(writer, e.to_ftp_response().as_bytes()).await?;
            return Ok(VerbOutcome::Continue);
        }
    };
    if !append && marker > 0 {
        if let Err(e) = file.seek(SeekFrom::Start(marker)).await {
            error!("Seek to {} in {} failed: {}", marker, path, e);
            send_response(writer, b"550 Restart position not valid.\r\n").await?;
            return Ok(VerbOutcome::Continue);
        }
    }
    if !has_endpoint {
        send_response(writer, b"503 Use PORT or PASV first.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    send_response(writer, b"150 Opening data connection.\r\n").await?;
    let mut transfer = match establish_data_connection(writer, config, session).await? {
        Some(transfer) => transfer,
        None => return Ok(VerbOutcome::Continue),
    };

    match transfer.recv_into_file(&mut file).await {
        Ok(()) => match transfer.finish().await {
            Ok(stats) => {
                info!("Stored {} ({})", path, stats.summary());
                let reply = format!("226 Transfer complete ({}).\r\n", stats.summary());
                send_response(writer, reply.as_bytes()).await?;
            }
            Err(e) => {
                error!("Data connection lost finishing {}: {:?}", path, e);
                send_response(writer, b"426 Connection broken during transfer.\r\n").await?;
            }
        },
        Err(TransferError::Peer(e)) => {
            error!("Data connection lost receiving {}: {}", path, e);
            send_response(writer, b"426 Connection broken during transfer.\r\n").await?;
        }
        Err(TransferError::Local(e)) => {
            error!("Write of {} failed mid-transfer: {}", path, e);
            send_response(writer, b"451 Local error in processing.\r\n").await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::listing::{format_list_line, format_nlst_line};
use crate::core_fs::{EntryInfo, EntryKind, VirtualFs};
use crate::core_network::data::establish_data_connection;
use crate::helpers::send_response;
use crate::session::Session;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListStyle {
    Long,
    NamesOnly,
}

pub async fn handle_list_command(
    writer: Arc<Mutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    transfer_listing(&writer, &config, &session, &arg, ListStyle::Long).await
}

/// Shared body of LIST and NLST: walks one directory source and streams one
/// rendered line per entry over the data channel.
pub(crate) async fn transfer_listing(
    writer: &Arc<Mutex<TcpStream>>,
    config: &Arc<Config>,
    session: &Arc<Mutex<Session>>,
    arg: &str,
    style: ListStyle,
) -> Result<VerbOutcome, std::io::Error> {
    let (fs, cwd, has_endpoint) = {
        let session = session.lock().await;
        (
            Arc::clone(&session.fs),
            session.cwd.clone(),
            session.has_data_endpoint(),
        )
    };

    // Clients habitually pass ls-style flags; list the working directory.
    let arg = arg.trim();
    let target_arg = if arg.starts_with('-') { "" } else { arg };
    let target = VirtualFs::resolve(&cwd, target_arg);

    let mut dir = match fs.open_dir(&target).await {
        Ok(dir) => dir,
        Err(e) => {
            warn!("Listing of {} refused: {}", target, e);
            send_response(writer, e.to_ftp_response().as_bytes()).await?;
            return Ok(VerbOutcome::Continue);
        }
    };
    if !has_endpoint {
        send_response(writer, b"503 Use PORT or PASV first.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    send_response(writer, b"150 Here comes the directory listing.\r\n").await?;
    let mut transfer = match establish_data_connection(writer, config, session).await? {
        Some(transfer) => transfer,
        None => return Ok(VerbOutcome::Continue),
    };

    // A rendered line longer than the control scratch buffer is dropped so
    // the stream itself stays well-formed.
    let line_cap = config.server.control_buffer_bytes;

    if style == ListStyle::Long {
        for (name, vpath) in [
            (".", target.clone()),
            ("..", VirtualFs::resolve(&target, "..")),
        ] {
            let info = match fs.stat(&vpath).await {
                Ok(mut info) => {
                    info.name = name.to_string();
                    info
                }
                Err(_) => dot_entry(name),
            };
            if let Err(e) = transfer.send_line(&format_list_line(&info)).await {
                error!("Data connection lost listing {}: {:?}", target, e);
                send_response(writer, b"426 Connection broken during transfer.\r\n").await?;
                return Ok(VerbOutcome::Continue);
            }
        }
    }

    loop {
        match dir.next_entry().await {
            Ok(Some(entry)) => {
                let line = match style {
                    ListStyle::Long => format_list_line(&entry),
                    ListStyle::NamesOnly => format_nlst_line(&entry),
                };
                if line.len() > line_cap {
                    error!("Skipping oversized listing line for {:?}", entry.name);
                    continue;
                }
                if let Err(e) = transfer.send_line(&line).await {
                    error!("Data connection lost listing {}: {:?}", target, e);
                    send_response(writer, b"426 Connection broken during transfer.\r\n").await?;
                    return Ok(VerbOutcome::Continue);
                }
            }
            Ok(None) => break,
            Err(e) => {
                // Keep what was already sent; the listing just ends early.
                error!("Listing of {} stopped: {}", target, e);
                break;
            }
        }
    }

    match transfer.finish().await {
        Ok(stats) => {
            info!("Listed {} ({})", target, stats.summary());
            let reply = format!("226 Transfer complete ({}).\r\n", stats.summary());
            send_response(writer, reply.as_bytes()).await?;
        }
        Err(e) => {
            error!("Data connection lost finishing listing {}: {:?}", target, e);
            send_response(writer, b"426 Connection broken during transfer.\r\n").await?;
        }
    }
    Ok(VerbOutcome::Continue)
}

fn dot_entry(name: &str) -> EntryInfo {
    EntryInfo {
        name: name.to_string(),
        kind: EntryKind::Dir,
        size: 0,
        mtime: SystemTime::now(),
        mode_bits: 0o555,
    }
}

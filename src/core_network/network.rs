//! Control-connection front end: owns the listening socket and the session
//! table, frames CRLF command lines, and feeds them to the verb dispatcher.

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};

use crate::config::Config;
use crate::constants::LISTENER_REBIND_DELAY;
use crate::core_ftpcommand::ftpcommand::parse_command_line;
use crate::core_ftpcommand::handlers::dispatch_command;
use crate::core_ftpcommand::VerbOutcome;
use crate::core_fs::VirtualFs;
use crate::core_log::logger::describe_command;
use crate::helpers::send_response;
use crate::session::Session;

use super::pasv::PassivePortAllocator;
use super::socket;

/// Fixed-capacity slot table. A slot index identifies a session for its
/// whole life, so log lines can name sessions without pointer identity.
pub struct SessionTable {
    slots: StdMutex<Vec<Option<SocketAddr>>>,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: StdMutex::new(vec![None; capacity]),
        }
    }

    /// Claims the first free slot, or `None` when the table is full.
    pub fn claim(&self, peer: SocketAddr) -> Option<usize> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let index = slots.iter().position(Option::is_none)?;
        slots[index] = Some(peer);
        Some(index)
    }

    pub fn release(&self, index: usize) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(index) {
            *slot = None;
        }
    }

    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.iter().filter(|slot| slot.is_some()).count()
    }
}

pub struct Server {
    config: Arc<Config>,
    fs: Arc<VirtualFs>,
    pasv_ports: Arc<PassivePortAllocator>,
    table: Arc<SessionTable>,
    listener: tokio::net::TcpListener,
    bind_addr: SocketAddr,
}

impl Server {
    pub async fn bind(config: Arc<Config>, fs: Arc<VirtualFs>) -> Result<Server> {
        let bind_addr: SocketAddr =
            format!("{}:{}", config.server.bind_address, config.server.port)
                .parse()
                .with_context(|| {
                    format!(
                        "Invalid bind address {}:{}",
                        config.server.bind_address, config.server.port
                    )
                })?;
        let listener =
            socket::bind_listener(bind_addr).context("Failed to bind control listener")?;
        let pasv_ports = Arc::new(PassivePortAllocator::new(
            config.server.passive_port_min,
            config.server.passive_port_max,
        ));
        let table = Arc::new(SessionTable::new(config.server.max_clients as usize));
        Ok(Server {
            config,
            fs,
            pasv_ports,
            table,
            listener,
            bind_addr,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts sessions until `shutdown` fires, then notifies every session
    /// and drains them.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let (session_tx, _keepalive) = watch::channel(false);
        let mut tasks: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => self.handle_accept(&mut tasks, socket, peer, &session_tx),
                    Err(e) => {
                        if is_transient_accept_error(&e) {
                            warn!("Accept failed transiently: {}", e);
                        } else {
                            error!("Control listener broken: {}", e);
                            if !self.rebind_listener(&mut shutdown).await {
                                break;
                            }
                        }
                    }
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        info!(
            "Shutting down; draining {} active session(s)",
            self.table.active()
        );
        let _ = session_tx.send(true);
        drop(self.listener);
        while tasks.join_next().await.is_some() {}
        Ok(())
    }

    fn handle_accept(
        &self,
        tasks: &mut JoinSet<()>,
        socket: TcpStream,
        peer: SocketAddr,
        session_tx: &watch::Sender<bool>,
    ) {
        match self.table.claim(peer) {
            Some(index) => {
                info!("[#{}] New control connection from {}", index, peer);
                let config = Arc::clone(&self.config);
                let fs = Arc::clone(&self.fs);
                let pasv_ports = Arc::clone(&self.pasv_ports);
                let table = Arc::clone(&self.table);
                let shutdown = session_tx.subscribe();
                tasks.spawn(async move {
                    serve_control_connection(socket, peer, index, config, fs, pasv_ports, shutdown)
                        .await;
                    table.release(index);
                    info!("[#{}] Session closed for {}", index, peer);
                });
            }
            None => {
                // The listener is still drained beyond the cap; the surplus
                // peer is told why and dropped.
                warn!("Rejecting {}: client limit reached", peer);
                tasks.spawn(async move {
                    let mut socket = socket;
                    let _ = timeout(
                        Duration::from_secs(5),
                        socket.write_all(b"421 Too many clients, closing connection.\r\n"),
                    )
                    .await;
                    let _ = socket.shutdown().await;
                });
            }
        }
    }

    /// Tries to recreate the control listener until it succeeds or shutdown
    /// fires. Existing sessions keep running while accepts are paused.
    async fn rebind_listener(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return false,
                _ = sleep(LISTENER_REBIND_DELAY) => {}
            }
            match socket::bind_listener(self.bind_addr) {
                Ok(listener) => {
                    info!("Control listener recreated on {}", self.bind_addr);
                    self.listener = listener;
                    return true;
                }
                Err(e) => error!("Listener rebind failed: {}", e),
            }
        }
    }
}

fn is_transient_accept_error(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::WouldBlock
    )
}

async fn read_chunk(socket: &Arc<Mutex<TcpStream>>, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut socket = socket.lock().await;
    socket.read(buf).await
}

/// Drives one session: greet, then frame CRLF lines out of a fixed scratch
/// buffer and dispatch them in arrival order. A lone LF, an embedded NUL, or
/// a line that overflows the buffer closes the session with no reply.
async fn serve_control_connection(
    socket: TcpStream,
    peer: SocketAddr,
    index: usize,
    config: Arc<Config>,
    fs: Arc<VirtualFs>,
    pasv_ports: Arc<PassivePortAllocator>,
    mut shutdown: watch::Receiver<bool>,
) {
    let local_addr = match socket.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("[#{}] Could not read local address: {}", index, e);
            return;
        }
    };

    let writer = Arc::new(Mutex::new(socket));
    let session = Arc::new(Mutex::new(Session::new(
        index,
        peer,
        local_addr,
        fs,
        pasv_ports,
    )));

    let greeting = format!("220 {}\r\n", config.server.welcome_banner);
    if send_response(&writer, greeting.as_bytes()).await.is_err() {
        return;
    }

    let idle_timeout = config.control_idle_timeout();
    let mut buf = vec![0u8; config.server.control_buffer_bytes.max(64)];
    let mut used = 0usize;
    let mut scan_from = 0usize;

    'session: loop {
        // Drain every complete line currently buffered.
        while let Some(rel) = buf[scan_from..used].iter().position(|&b| b == b'\n') {
            let nl = scan_from + rel;
            if nl == 0 || buf[nl - 1] != b'\r' {
                warn!("[#{}] Protocol violation: LF without CR", index);
                break 'session;
            }
            if buf[..nl - 1].contains(&0) {
                warn!("[#{}] Protocol violation: NUL in command line", index);
                break 'session;
            }
            let line = String::from_utf8_lossy(&buf[..nl - 1]).into_owned();
            buf.copy_within(nl + 1..used, 0);
            used -= nl + 1;
            scan_from = 0;

            let (verb, arg) = parse_command_line(&line);
            info!("[#{}] {}", index, describe_command(verb, arg));
            match dispatch_command(&writer, &config, &session, &line).await {
                Ok(VerbOutcome::Continue) => {}
                Ok(VerbOutcome::Quit) => break 'session,
                Err(e) => {
                    warn!("[#{}] Control connection failed: {}", index, e);
                    break 'session;
                }
            }
        }

        if used == buf.len() {
            warn!("[#{}] Command line exceeds control buffer", index);
            break 'session;
        }
        scan_from = used;

        let read = tokio::select! {
            _ = shutdown.changed() => {
                let _ = send_response(
                    &writer,
                    b"421 Service not available, closing control connection.\r\n",
                )
                .await;
                break 'session;
            }
            read = timeout(idle_timeout, read_chunk(&writer, &mut buf[used..])) => read,
        };
        match read {
            Err(_) => {
                info!("[#{}] Control connection idle timeout", index);
                break 'session;
            }
            Ok(Ok(0)) => {
                info!("[#{}] Peer closed control connection", index);
                break 'session;
            }
            Ok(Ok(n)) => used += n,
            Ok(Err(e)) => {
                warn!("[#{}] Control read failed: {}", index, e);
                break 'session;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u8) -> SocketAddr {
        format!("10.0.0.{}:4000", n).parse().unwrap()
    }

    #[test]
    fn table_hands_out_stable_indices_up_to_capacity() {
        let table = SessionTable::new(2);
        let first = table.claim(peer(1)).unwrap();
        let second = table.claim(peer(2)).unwrap();
        assert_ne!(first, second);
        assert_eq!(table.claim(peer(3)), None);
        assert_eq!(table.active(), 2);

        table.release(first);
        assert_eq!(table.active(), 1);
        // The freed slot is reused, keeping indices small and stable.
        assert_eq!(table.claim(peer(4)), Some(first));
    }

    #[test]
    fn release_out_of_range_is_ignored() {
        let table = SessionTable::new(1);
        table.release(7);
        assert_eq!(table.active(), 0);
    }
}

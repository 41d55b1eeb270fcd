//! Passive mode: port allocation and the PASV handler.

use log::{debug, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex as TokioMutex;

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;

use super::socket::bind_listener;

/// Hands out data-channel ports from `[min, max)`, advancing modulo the
/// range so the cursor wraps instead of running past the window.
pub struct PassivePortAllocator {
    min: u16,
    max: u16,
    next: Mutex<u16>,
}

impl PassivePortAllocator {
    pub fn new(min: u16, max: u16) -> Self {
        let (min, max) = if min < max {
            (min, max)
        } else {
            let lo = min.min(max).min(u16::MAX - 1);
            (lo, lo + 1)
        };
        Self {
            min,
            max,
            next: Mutex::new(min),
        }
    }

    fn span(&self) -> u16 {
        self.max - self.min
    }

    fn next_port(&self) -> u16 {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let port = *next;
        *next = if port + 1 >= self.max { self.min } else { port + 1 };
        port
    }

    /// Binds a listener on the next free port in the window, retrying over
    /// the whole range before giving up.
    pub fn bind(&self, ip: IpAddr) -> io::Result<TcpListener> {
        let mut last_err = None;
        for _ in 0..self.span() {
            let port = self.next_port();
            match bind_listener(SocketAddr::new(ip, port)) {
                Ok(listener) => return Ok(listener),
                Err(e) => {
                    debug!("Passive bind to port {} failed: {}", port, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrInUse, "passive port range exhausted")
        }))
    }
}

/// Formats the classical six-number 227 reply.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let octets = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).\r\n",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

/// Handles the PASV command: replaces any pending data endpoint with a fresh
/// listener and advertises its address to the client.
pub async fn handle_pasv_command(
    writer: Arc<TokioMutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<TokioMutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let (allocator, local_ip) = {
        let mut session = session.lock().await;
        // A new PASV always supersedes the previous endpoint.
        session.passive_listener = None;
        session.port_target = None;
        (Arc::clone(&session.pasv_ports), session.local_addr.ip())
    };

    let advertised = match advertised_ip(&config, local_ip) {
        Some(ip) => ip,
        None => {
            warn!("No IPv4 address available to advertise for passive mode");
            send_response(&writer, b"520 Passive mode unavailable.\r\n").await?;
            return Ok(VerbOutcome::Continue);
        }
    };

    let listener = match allocator.bind(local_ip) {
        Ok(listener) => listener,
        Err(e) => {
            warn!("Failed to open passive listener: {}", e);
            send_response(&writer, b"520 Failed to enter passive mode.\r\n").await?;
            return Ok(VerbOutcome::Continue);
        }
    };

    let port = listener.local_addr()?.port();
    let reply = format_pasv_reply(advertised, port);
    {
        let mut session = session.lock().await;
        session.set_passive(listener);
        debug!("[#{}] Passive listener on port {}", session.index, port);
    }
    send_response(&writer, reply.as_bytes()).await?;
    Ok(VerbOutcome::Continue)
}

fn advertised_ip(config: &Config, local_ip: IpAddr) -> Option<Ipv4Addr> {
    if let Some(configured) = &config.server.pasv_address {
        match configured.parse::<Ipv4Addr>() {
            Ok(ip) => return Some(ip),
            Err(_) => warn!("Invalid pasv_address {:?}, falling back", configured),
        }
    }
    match local_ip {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_wraps_inside_the_window() {
        let allocator = PassivePortAllocator::new(50000, 50003);
        assert_eq!(allocator.next_port(), 50000);
        assert_eq!(allocator.next_port(), 50001);
        assert_eq!(allocator.next_port(), 50002);
        assert_eq!(allocator.next_port(), 50000);
    }

    #[test]
    fn allocator_wraps_at_the_top_of_the_port_space() {
        let allocator = PassivePortAllocator::new(65533, 65535);
        assert_eq!(allocator.next_port(), 65533);
        assert_eq!(allocator.next_port(), 65534);
        assert_eq!(allocator.next_port(), 65533);
    }

    #[test]
    fn reply_encodes_ip_and_port() {
        let reply = format_pasv_reply("192.168.1.10".parse().unwrap(), 50001);
        assert_eq!(
            reply,
            "227 Entering Passive Mode (192,168,1,10,195,81).\r\n"
        );
    }

    #[tokio::test]
    async fn bind_skips_busy_ports() {
        let allocator = PassivePortAllocator::new(51300, 51304);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        // Occupy the first port of the window.
        let _busy = bind_listener(SocketAddr::new(ip, 51300)).unwrap();
        let listener = allocator.bind(ip).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!((51301..51304).contains(&port));
    }
}

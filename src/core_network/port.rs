//! Active mode: the PORT handler.

use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;

/// Parses the six-number `h1,h2,h3,h4,p1,p2` form into a socket address.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let parts: Vec<u8> = arg
        .trim()
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.len() != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = u16::from(parts[4]) << 8 | u16::from(parts[5]);
    Some(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Handles the PORT command: records the peer's data address for the next
/// transfer, superseding any passive listener.
pub async fn handle_port_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let target = match parse_port_argument(&arg) {
        Some(target) => target,
        None => {
            warn!("Unparseable PORT argument: {:?}", arg);
            send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await?;
            return Ok(VerbOutcome::Continue);
        }
    };

    {
        let mut session = session.lock().await;
        session.set_active(target);
        debug!("[#{}] Active mode target {}", session.index, target);
    }
    send_response(&writer, b"200 PORT command successful.\r\n").await?;
    Ok(VerbOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_six_number_form() {
        let addr = parse_port_argument("192,168,1,2,195,81").unwrap();
        assert_eq!(addr, "192.168.1.2:50001".parse().unwrap());
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(parse_port_argument("").is_none());
        assert!(parse_port_argument("1,2,3,4,5").is_none());
        assert!(parse_port_argument("1,2,3,4,5,6,7").is_none());
        assert!(parse_port_argument("256,0,0,1,0,80").is_none());
        assert!(parse_port_argument("a,b,c,d,e,f").is_none());
    }
}

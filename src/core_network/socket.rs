//! Thin socket helpers shared by the control listener and the data channels.

use log::{debug, trace};
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::constants::{ACTIVE_SOURCE_PORT, LISTEN_BACKLOG};

fn new_socket_for(addr: &SocketAddr) -> io::Result<TcpSocket> {
    if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
}

/// Binds a listening socket with `SO_REUSEADDR`, so a restarted listener can
/// reclaim its port immediately.
pub fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = new_socket_for(&addr)?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

/// Kernel buffer sizing is a hint; failures are logged and ignored.
pub fn apply_buffer_hints(socket: &TcpSocket, bytes: usize) {
    let bytes = bytes as u32;
    if let Err(e) = socket.set_send_buffer_size(bytes) {
        trace!("Could not set send buffer size: {}", e);
    }
    if let Err(e) = socket.set_recv_buffer_size(bytes) {
        trace!("Could not set recv buffer size: {}", e);
    }
}

/// Opens an active-mode data connection to `peer`. The classical source port
/// 20 is attempted first; binding it usually needs privileges, so failure
/// falls through to an ephemeral port without surfacing to the client.
pub async fn connect_active(
    local_ip: IpAddr,
    peer: SocketAddr,
    buffer_hint: usize,
) -> io::Result<TcpStream> {
    if let IpAddr::V4(_) = local_ip {
        if let Ok(socket) = TcpSocket::new_v4() {
            apply_buffer_hints(&socket, buffer_hint);
            let bound = socket.set_reuseaddr(true).is_ok()
                && socket
                    .bind(SocketAddr::new(local_ip, ACTIVE_SOURCE_PORT))
                    .is_ok();
            if bound {
                match socket.connect(peer).await {
                    Ok(stream) => return Ok(stream),
                    Err(e) => debug!("Connect from source port 20 failed: {}", e),
                }
            }
        }
    }

    let socket = new_socket_for(&peer)?;
    apply_buffer_hints(&socket, buffer_hint);
    socket.connect(peer).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_active_reaches_a_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let peer = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move { listener.accept().await });
        let stream = connect_active("127.0.0.1".parse().unwrap(), peer, 8192)
            .await
            .unwrap();
        assert_eq!(stream.peer_addr().unwrap(), peer);
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_listener_yields_usable_socket() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}

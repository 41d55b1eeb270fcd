use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core_fs::VirtualFs;
use crate::core_network::pasv::PassivePortAllocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Image,
}

impl TransferType {
    pub fn label(&self) -> &'static str {
        match self {
            TransferType::Ascii => "A",
            TransferType::Image => "I",
        }
    }
}

/// Per-connection state. One session owns at most one pending data channel
/// endpoint: a passive listener or an active target, never both.
pub struct Session {
    /// Stable slot index in the server's session table, used in logs.
    pub index: usize,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub fs: Arc<VirtualFs>,
    pub pasv_ports: Arc<PassivePortAllocator>,
    pub cwd: String,
    /// Binary-clean either way; the selected type is only echoed back.
    pub transfer_type: TransferType,
    pub username: Option<String>,
    pub authenticated: bool,
    pub pending_rename: Option<String>,
    pub restart_marker: u64,
    pub port_target: Option<SocketAddr>,
    pub passive_listener: Option<TcpListener>,
}

impl Session {
    pub fn new(
        index: usize,
        peer_addr: SocketAddr,
        local_addr: SocketAddr,
        fs: Arc<VirtualFs>,
        pasv_ports: Arc<PassivePortAllocator>,
    ) -> Self {
        Self {
            index,
            peer_addr,
            local_addr,
            fs,
            pasv_ports,
            cwd: String::from("/"),
            transfer_type: TransferType::Ascii,
            username: None,
            authenticated: false,
            pending_rename: None,
            restart_marker: 0,
            port_target: None,
            passive_listener: None,
        }
    }

    /// Installs a passive listener, dropping any previous data endpoint.
    pub fn set_passive(&mut self, listener: TcpListener) {
        self.port_target = None;
        self.passive_listener = Some(listener);
    }

    /// Installs an active-mode target, dropping any previous data endpoint.
    pub fn set_active(&mut self, target: SocketAddr) {
        self.passive_listener = None;
        self.port_target = Some(target);
    }

    pub fn has_data_endpoint(&self) -> bool {
        self.passive_listener.is_some() || self.port_target.is_some()
    }

    /// Consumes the restart marker; it never survives the verb that uses it.
    pub fn take_restart_marker(&mut self) -> u64 {
        std::mem::take(&mut self.restart_marker)
    }

    pub fn clear_restart_marker(&mut self) {
        self.restart_marker = 0;
    }

    /// Resets the session to its pre-authentication state.
    pub fn reinitialize(&mut self) {
        self.cwd = String::from("/");
        self.transfer_type = TransferType::Ascii;
        self.username = None;
        self.authenticated = false;
        self.pending_rename = None;
        self.restart_marker = 0;
        self.port_target = None;
        self.passive_listener = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::new(
            0,
            "10.0.0.2:50000".parse().unwrap(),
            "10.0.0.1:21".parse().unwrap(),
            Arc::new(VirtualFs::new("/tmp")),
            Arc::new(PassivePortAllocator::new(50000, 50010)),
        )
    }

    #[tokio::test]
    async fn passive_and_active_are_mutually_exclusive() {
        let mut session = test_session();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        session.set_passive(listener);
        assert!(session.passive_listener.is_some());

        session.set_active("10.0.0.2:6000".parse().unwrap());
        assert!(session.passive_listener.is_none());
        assert!(session.port_target.is_some());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        session.set_passive(listener);
        assert!(session.port_target.is_none());
        assert!(session.has_data_endpoint());
    }

    #[test]
    fn restart_marker_is_consumed_once() {
        let mut session = test_session();
        session.restart_marker = 1000;
        assert_eq!(session.take_restart_marker(), 1000);
        assert_eq!(session.take_restart_marker(), 0);
    }

    #[test]
    fn reinitialize_clears_login_state() {
        let mut session = test_session();
        session.authenticated = true;
        session.username = Some("alice".into());
        session.cwd = String::from("/music");
        session.restart_marker = 42;
        session.pending_rename = Some("/a".into());

        session.reinitialize();
        assert!(!session.authenticated);
        assert!(session.username.is_none());
        assert_eq!(session.cwd, "/");
        assert_eq!(session.restart_marker, 0);
        assert!(session.pending_rename.is_none());
        assert!(!session.has_data_endpoint());
    }
}

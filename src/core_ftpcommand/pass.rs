use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Handles the PASS command against the optional shared credentials.
pub async fn handle_pass_command(
    writer: Arc<Mutex<TcpStream>>,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    let username = session.lock().await.username.clone();
    let username = match username {
        Some(name) => name,
        None => {
            send_response(&writer, b"503 Login with USER first.\r\n").await?;
            return Ok(VerbOutcome::Continue);
        }
    };

    if credentials_ok(&config, &username, &arg) {
        let mut session = session.lock().await;
        session.authenticated = true;
        info!(
            "[#{}] User {:?} logged in from {}",
            session.index, username, session.peer_addr
        );
        drop(session);
        send_response(&writer, b"230 User logged in, proceed.\r\n").await?;
    } else {
        warn!("Failed login for user {:?}", username);
        send_response(&writer, b"530 Login incorrect.\r\n").await?;
    }
    Ok(VerbOutcome::Continue)
}

/// No configured password accepts anything; `anonymous` bypasses the check
/// when anonymous logins are enabled; a configured user name must match.
fn credentials_ok(config: &Config, username: &str, password: &str) -> bool {
    if config.server.anonymous_ok && username.eq_ignore_ascii_case("anonymous") {
        return true;
    }
    if let Some(expected_user) = &config.server.user {
        if username != expected_user {
            return false;
        }
    }
    match &config.server.password {
        None => true,
        Some(expected) => password == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(user: Option<&str>, password: Option<&str>, anonymous_ok: bool) -> Config {
        let mut config = Config::default();
        config.server.user = user.map(String::from);
        config.server.password = password.map(String::from);
        config.server.anonymous_ok = anonymous_ok;
        config
    }

    #[test]
    fn open_server_accepts_anyone() {
        let cfg = config(None, None, false);
        assert!(credentials_ok(&cfg, "alice", ""));
        assert!(credentials_ok(&cfg, "bob", "whatever"));
    }

    #[test]
    fn shared_password_is_enforced() {
        let cfg = config(None, Some("sekrit"), false);
        assert!(credentials_ok(&cfg, "alice", "sekrit"));
        assert!(!credentials_ok(&cfg, "alice", "wrong"));
        assert!(!credentials_ok(&cfg, "alice", ""));
    }

    #[test]
    fn configured_user_must_match() {
        let cfg = config(Some("alice"), Some("sekrit"), false);
        assert!(credentials_ok(&cfg, "alice", "sekrit"));
        assert!(!credentials_ok(&cfg, "bob", "sekrit"));
    }

    #[test]
    fn anonymous_bypasses_when_enabled() {
        let cfg = config(Some("alice"), Some("sekrit"), true);
        assert!(credentials_ok(&cfg, "anonymous", "x@y"));
        assert!(credentials_ok(&cfg, "Anonymous", ""));
        let cfg = config(Some("alice"), Some("sekrit"), false);
        assert!(!credentials_ok(&cfg, "anonymous", "x@y"));
    }
}

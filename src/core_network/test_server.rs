//! End-to-end exercises over real sockets: a server on an ephemeral port,
//! a scratch storage root, and a plain TCP client speaking the protocol.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::config::Config;
use crate::server::build_filesystem;

use super::network::Server;

struct TestServer {
    addr: SocketAddr,
    // Held so the shutdown channel stays open for the whole test.
    _shutdown: watch::Sender<bool>,
}

async fn start_server(
    root: &Path,
    pasv_base: u16,
    mutate: impl FnOnce(&mut Config),
) -> TestServer {
    let mut config = Config::default();
    config.server.bind_address = String::from("127.0.0.1");
    config.server.port = 0;
    config.server.root_dir = root.to_string_lossy().into_owned();
    config.server.data_buffer_bytes = 8 * 1024;
    config.server.control_buffer_bytes = 1024;
    config.server.data_timeout_secs = 5;
    config.server.control_idle_timeout_secs = 10;
    config.server.passive_port_min = pasv_base;
    config.server.passive_port_max = pasv_base + 20;
    mutate(&mut config);

    let fs = build_filesystem(&config);
    let server = Server::bind(Arc::new(config), Arc::new(fs)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(server.run(rx));
    TestServer {
        addr,
        _shutdown: tx,
    }
}

struct Client {
    stream: BufReader<TcpStream>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = Client {
            stream: BufReader::new(stream),
        };
        let greeting = client.read_reply().await;
        assert!(greeting.starts_with("220 "), "greeting: {}", greeting);
        client
    }

    async fn read_reply(&mut self) -> String {
        let mut line = String::new();
        self.stream.read_line(&mut line).await.unwrap();
        line
    }

    /// Like `read_reply`, but a reset connection reads as a close.
    async fn read_reply_or_close(&mut self) -> String {
        let mut line = String::new();
        match self.stream.read_line(&mut line).await {
            Ok(_) => line,
            Err(_) => String::new(),
        }
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.get_mut().write_all(bytes).await.unwrap();
    }

    async fn cmd(&mut self, command: &str) -> String {
        self.send_raw(format!("{}\r\n", command).as_bytes()).await;
        self.read_reply().await
    }

    async fn login(&mut self) {
        let reply = self.cmd("USER anonymous").await;
        assert_eq!(reply, "331 User name okay, need password.\r\n");
        let reply = self.cmd("PASS x@y").await;
        assert_eq!(reply, "230 User logged in, proceed.\r\n");
    }

    /// Issues PASV and opens the advertised data connection.
    async fn pasv_data(&mut self) -> TcpStream {
        let reply = self.cmd("PASV").await;
        assert!(reply.starts_with("227 "), "PASV reply: {}", reply);
        TcpStream::connect(parse_pasv(&reply)).await.unwrap()
    }
}

fn parse_pasv(reply: &str) -> SocketAddr {
    let inner = reply
        .split('(')
        .nth(1)
        .and_then(|s| s.split(')').next())
        .expect("six-number form");
    let numbers: Vec<u16> = inner.split(',').map(|n| n.trim().parse().unwrap()).collect();
    assert_eq!(numbers.len(), 6);
    format!(
        "{}.{}.{}.{}:{}",
        numbers[0],
        numbers[1],
        numbers[2],
        numbers[3],
        numbers[4] * 256 + numbers[5]
    )
    .parse()
    .unwrap()
}

async fn drain(mut data: TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    data.read_to_end(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn login_pwd_syst_quit() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52000, |_| {}).await;
    let mut client = Client::connect(server.addr).await;

    client.login().await;
    let reply = client.cmd("PWD").await;
    assert!(reply.starts_with("257 \"/\""), "PWD reply: {}", reply);
    let reply = client.cmd("SYST").await;
    assert_eq!(reply, "215 UNIX Type: L8\r\n");

    let reply = client.cmd("QUIT").await;
    assert_eq!(reply, "221 Service closing control connection.\r\n");
    // The control socket is observed closed right after the farewell.
    let eof = client.read_reply().await;
    assert!(eof.is_empty());
}

#[tokio::test]
async fn feat_is_available_before_login() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52030, |_| {}).await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(client.cmd("FEAT").await, "211-Features:\r\n");
    assert_eq!(client.read_reply().await, " UTF8\r\n");
    assert_eq!(client.read_reply().await, "211 End\r\n");

    let reply = client.cmd("OPTS UTF8 ON").await;
    assert!(reply.starts_with("200 "));
}

#[tokio::test]
async fn verbs_require_login() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52060, |_| {}).await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(client.cmd("LIST").await, "530 Not logged in.\r\n");
    assert_eq!(client.cmd("SYST").await, "530 Not logged in.\r\n");
    assert_eq!(client.cmd("NOOP").await, "200 OK.\r\n");
}

#[tokio::test]
async fn shared_password_is_checked() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52090, |config| {
        config.server.user = Some(String::from("alice"));
        config.server.password = Some(String::from("sekrit"));
        config.server.anonymous_ok = false;
    })
    .await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(
        client.cmd("USER alice").await,
        "331 User name okay, need password.\r\n"
    );
    assert_eq!(client.cmd("PASS wrong").await, "530 Login incorrect.\r\n");
    assert_eq!(client.cmd("PWD").await, "530 Not logged in.\r\n");
    assert_eq!(
        client.cmd("PASS sekrit").await,
        "230 User logged in, proceed.\r\n"
    );
    assert!(client.cmd("PWD").await.starts_with("257 "));
}

#[tokio::test]
async fn list_on_root_shows_virtual_mounts() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52120, |config| {
        config.server.virtual_roots = vec![String::from("media"), String::from("docs")];
    })
    .await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let data = client.pasv_data().await;
    let reply = client.cmd("LIST").await;
    assert!(reply.starts_with("150 "), "LIST reply: {}", reply);
    let listing = String::from_utf8(drain(data).await).unwrap();
    let reply = client.read_reply().await;
    assert!(reply.starts_with("226 "), "LIST close: {}", reply);

    let lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert!(lines.iter().any(|l| l.ends_with(" .")));
    assert!(lines.iter().any(|l| l.ends_with(" ..")));
    let media = lines.iter().find(|l| l.ends_with(" media")).unwrap();
    assert!(media.starts_with("dr-xr-xr-x"), "media line: {}", media);
    assert!(lines.iter().any(|l| l.ends_with(" docs")));

    // The mount is enterable like a real directory.
    assert_eq!(
        client.cmd("CWD media").await,
        "250 Directory successfully changed.\r\n"
    );
    assert!(client.cmd("PWD").await.starts_with("257 \"/media\""));
}

#[tokio::test]
async fn nlst_lists_names_only() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("one.txt"), b"1").unwrap();
    std::fs::write(root.path().join("two.txt"), b"2").unwrap();
    let server = start_server(root.path(), 52150, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let data = client.pasv_data().await;
    assert!(client.cmd("NLST").await.starts_with("150 "));
    let listing = String::from_utf8(drain(data).await).unwrap();
    assert!(client.read_reply().await.starts_with("226 "));

    let mut names: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
    names.sort();
    assert_eq!(names, vec!["one.txt", "two.txt"]);
}

#[tokio::test]
async fn stor_then_retr_roundtrip() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52180, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let payload: Vec<u8> = (0..30_000u32).map(|i| (i % 251) as u8).collect();

    let mut data = client.pasv_data().await;
    assert!(client.cmd("STOR up.bin").await.starts_with("150 "));
    data.write_all(&payload).await.unwrap();
    drop(data);
    assert!(client.read_reply().await.starts_with("226 "));

    let reply = client.cmd("SIZE up.bin").await;
    assert_eq!(reply, format!("213 {}\r\n", payload.len()));

    let data = client.pasv_data().await;
    assert!(client.cmd("RETR up.bin").await.starts_with("150 "));
    let downloaded = drain(data).await;
    assert!(client.read_reply().await.starts_with("226 "));
    assert_eq!(downloaded, payload);
}

#[tokio::test]
async fn appe_appends_to_an_upload() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52210, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let mut data = client.pasv_data().await;
    assert!(client.cmd("STOR log.txt").await.starts_with("150 "));
    data.write_all(b"first;").await.unwrap();
    drop(data);
    assert!(client.read_reply().await.starts_with("226 "));

    let mut data = client.pasv_data().await;
    assert!(client.cmd("APPE log.txt").await.starts_with("150 "));
    data.write_all(b"second").await.unwrap();
    drop(data);
    assert!(client.read_reply().await.starts_with("226 "));

    let stored = std::fs::read(root.path().join("log.txt")).unwrap();
    assert_eq!(stored, b"first;second");
}

#[tokio::test]
async fn rest_resumes_a_download() {
    let root = TempDir::new().unwrap();
    let payload: Vec<u8> = (0..1024u32).map(|i| (i % 256) as u8).collect();
    std::fs::write(root.path().join("file"), &payload).unwrap();
    let server = start_server(root.path(), 52240, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let data = client.pasv_data().await;
    let reply = client.cmd("REST 1000").await;
    assert!(reply.starts_with("350 "), "REST reply: {}", reply);
    assert!(client.cmd("RETR file").await.starts_with("150 "));
    let tail = drain(data).await;
    assert!(client.read_reply().await.starts_with("226 "));
    assert_eq!(tail.len(), 24);
    assert_eq!(tail, &payload[1000..]);

    // The marker was consumed; the next RETR starts from zero.
    let data = client.pasv_data().await;
    assert!(client.cmd("RETR file").await.starts_with("150 "));
    assert_eq!(drain(data).await.len(), 1024);
    assert!(client.read_reply().await.starts_with("226 "));
}

#[tokio::test]
async fn rest_at_file_size_transfers_zero_bytes() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("file"), vec![7u8; 1024]).unwrap();
    let server = start_server(root.path(), 52270, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let data = client.pasv_data().await;
    assert!(client.cmd("REST 1024").await.starts_with("350 "));
    assert!(client.cmd("RETR file").await.starts_with("150 "));
    assert!(drain(data).await.is_empty());
    assert!(client.read_reply().await.starts_with("226 "));
}

#[tokio::test]
async fn intervening_verb_clears_the_restart_marker() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("file"), vec![7u8; 100]).unwrap();
    let server = start_server(root.path(), 52300, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    assert!(client.cmd("REST 50").await.starts_with("350 "));
    assert!(client.cmd("NOOP").await.starts_with("200 "));

    let data = client.pasv_data().await;
    assert!(client.cmd("RETR file").await.starts_with("150 "));
    assert_eq!(drain(data).await.len(), 100);
    assert!(client.read_reply().await.starts_with("226 "));
}

#[tokio::test]
async fn stor_of_zero_bytes_creates_an_empty_file() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52330, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let data = client.pasv_data().await;
    assert!(client.cmd("STOR empty.bin").await.starts_with("150 "));
    drop(data);
    assert!(client.read_reply().await.starts_with("226 "));

    let md = std::fs::metadata(root.path().join("empty.bin")).unwrap();
    assert_eq!(md.len(), 0);
}

#[tokio::test]
async fn rename_moves_the_file() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a"), b"payload").unwrap();
    let server = start_server(root.path(), 52360, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    assert_eq!(client.cmd("RNFR a").await, "350 Ready for RNTO.\r\n");
    assert_eq!(client.cmd("RNTO b").await, "250 Rename successful.\r\n");
    assert!(!root.path().join("a").exists());
    assert!(root.path().join("b").exists());

    // RNTO out of sequence is refused.
    assert_eq!(
        client.cmd("RNTO c").await,
        "503 Bad sequence of commands.\r\n"
    );
}

#[tokio::test]
async fn mkd_cwd_dele_rmd_lifecycle() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52390, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    assert!(client.cmd("MKD inbox").await.starts_with("257 \"/inbox\""));
    assert_eq!(
        client.cmd("CWD inbox").await,
        "250 Directory successfully changed.\r\n"
    );
    assert!(client.cmd("PWD").await.starts_with("257 \"/inbox\""));
    assert_eq!(
        client.cmd("CDUP").await,
        "250 Directory successfully changed.\r\n"
    );

    // A populated directory is not silently unlinked.
    std::fs::write(root.path().join("inbox/mail"), b"x").unwrap();
    assert_eq!(
        client.cmd("RMD inbox").await,
        "550 Directory not empty.\r\n"
    );
    assert_eq!(client.cmd("DELE inbox/mail").await, "250 File deleted.\r\n");
    assert_eq!(client.cmd("RMD inbox").await, "250 Directory removed.\r\n");
}

#[tokio::test]
async fn path_arguments_cannot_escape_the_root() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("inside.txt"), b"in").unwrap();
    let server = start_server(root.path(), 52420, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    // Climbing above the root clamps at the root.
    assert_eq!(
        client.cmd("CWD ../../..").await,
        "250 Directory successfully changed.\r\n"
    );
    assert!(client.cmd("PWD").await.starts_with("257 \"/\""));
    let reply = client.cmd("SIZE ../../inside.txt").await;
    assert_eq!(reply, "213 2\r\n");
}

#[tokio::test]
async fn read_only_mode_disables_write_verbs() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a"), b"x").unwrap();
    let server = start_server(root.path(), 52450, |config| {
        config.server.read_only = true;
    })
    .await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    assert_eq!(client.cmd("DELE a").await, "550 Command disabled.\r\n");
    assert_eq!(client.cmd("MKD d").await, "550 Command disabled.\r\n");
    assert_eq!(client.cmd("STOR x").await, "550 Command disabled.\r\n");
    // Reads still work.
    assert_eq!(client.cmd("SIZE a").await, "213 1\r\n");
}

#[tokio::test]
async fn active_mode_download_via_port() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("hello.txt"), b"hello, active mode").unwrap();
    let server = start_server(root.path(), 52480, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let reply = client
        .cmd(&format!("PORT 127,0,0,1,{},{}", port / 256, port % 256))
        .await;
    assert_eq!(reply, "200 PORT command successful.\r\n");

    assert!(client.cmd("RETR hello.txt").await.starts_with("150 "));
    let (data, _) = listener.accept().await.unwrap();
    let body = drain(data).await;
    assert!(client.read_reply().await.starts_with("226 "));
    assert_eq!(body, b"hello, active mode");
}

#[tokio::test]
async fn transfer_without_a_data_endpoint_is_refused() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("f"), b"x").unwrap();
    let server = start_server(root.path(), 52510, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    assert_eq!(
        client.cmd("RETR f").await,
        "503 Use PORT or PASV first.\r\n"
    );
}

#[tokio::test]
async fn rein_drops_authentication() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52540, |_| {}).await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    assert_eq!(
        client.cmd("REIN").await,
        "220 Service ready for new user.\r\n"
    );
    assert_eq!(client.cmd("PWD").await, "530 Not logged in.\r\n");
    client.login().await;
    assert!(client.cmd("PWD").await.starts_with("257 \"/\""));
}

#[tokio::test]
async fn clients_beyond_the_cap_get_421() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52570, |config| {
        config.server.max_clients = 1;
    })
    .await;

    let mut first = Client::connect(server.addr).await;
    first.login().await;

    let surplus = TcpStream::connect(server.addr).await.unwrap();
    let mut surplus = BufReader::new(surplus);
    let mut line = String::new();
    surplus.read_line(&mut line).await.unwrap();
    assert_eq!(line, "421 Too many clients, closing connection.\r\n");
    line.clear();
    surplus.read_line(&mut line).await.unwrap();
    assert!(line.is_empty());

    // The established session is unaffected, and its slot frees on QUIT.
    assert_eq!(first.cmd("NOOP").await, "200 OK.\r\n");
    assert!(first.cmd("QUIT").await.starts_with("221 "));
    drop(first);

    // Allow a beat for the server to reap the slot.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let mut replacement = Client::connect(server.addr).await;
    replacement.login().await;
}

#[tokio::test]
async fn lone_lf_is_a_protocol_violation() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52600, |_| {}).await;
    let mut client = Client::connect(server.addr).await;

    client.send_raw(b"USER anonymous\n").await;
    let eof = client.read_reply_or_close().await;
    assert!(eof.is_empty(), "expected silent close, got: {}", eof);
}

#[tokio::test]
async fn command_lines_are_bounded_by_the_control_buffer() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52630, |config| {
        config.server.control_buffer_bytes = 64;
    })
    .await;

    // Exactly buffer - 2 bytes of line plus CRLF is parsed.
    let mut client = Client::connect(server.addr).await;
    let padded = format!("NOOP{}", " ".repeat(58));
    assert_eq!(padded.len(), 62);
    assert_eq!(client.cmd(&padded).await, "200 OK.\r\n");

    // One byte longer overflows the buffer and the session closes.
    let oversized = format!("NOOP{}\r\n", " ".repeat(59));
    client.send_raw(oversized.as_bytes()).await;
    assert_eq!(client.read_reply_or_close().await, "");
}

#[tokio::test]
async fn pasv_replaces_the_previous_listener() {
    let root = TempDir::new().unwrap();
    let server = start_server(root.path(), 52660, |config| {
        // A window of two ports: reissuing PASV repeatedly only works if
        // superseded listeners are released.
        config.server.passive_port_min = 52660;
        config.server.passive_port_max = 52662;
    })
    .await;
    let mut client = Client::connect(server.addr).await;
    client.login().await;

    for _ in 0..6 {
        let reply = client.cmd("PASV").await;
        assert!(reply.starts_with("227 "), "PASV reply: {}", reply);
    }
}

//! Data-channel engine: establishes per-transfer connections and streams
//! file or listing bytes through a single bounded buffer.

use log::{debug, warn};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::Config;
use crate::helpers::send_response;
use crate::session::Session;

use super::socket;

/// Bytes moved and wall time of one transfer, reported in the 226 reply.
pub struct TransferStats {
    bytes: u64,
    started: Instant,
}

impl TransferStats {
    fn new() -> Self {
        Self {
            bytes: 0,
            started: Instant::now(),
        }
    }

    fn add(&mut self, n: usize) {
        self.bytes += n as u64;
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn summary(&self) -> String {
        let secs = self.started.elapsed().as_secs_f64();
        let rate = if secs > 0.0 {
            self.bytes as f64 / 1024.0 / secs
        } else {
            0.0
        };
        format!("{} bytes in {:.2} s, {:.1} KiB/s", self.bytes, secs, rate)
    }
}

/// Distinguishes a broken data connection from a local file failure, so the
/// verb layer can pick between 426 and 451.
#[derive(Debug)]
pub enum TransferError {
    Peer(io::Error),
    Local(io::Error),
}

async fn with_deadline<T>(
    deadline: Duration,
    fut: impl std::future::Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match timeout(deadline, fut).await {
        Ok(res) => res,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "data channel timed out",
        )),
    }
}

/// An established data connection plus the transfer slab. All socket
/// operations carry the configured inactivity deadline; one slab serves the
/// whole transfer, so nothing is allocated per chunk.
pub struct DataTransfer {
    stream: TcpStream,
    buf: Vec<u8>,
    deadline: Duration,
    stats: TransferStats,
}

impl DataTransfer {
    fn new(stream: TcpStream, config: &Config) -> Self {
        Self {
            stream,
            buf: vec![0u8; config.server.data_buffer_bytes.max(1)],
            deadline: config.data_timeout(),
            stats: TransferStats::new(),
        }
    }

    /// Streams `file` to the peer until EOF.
    pub async fn send_from_file(&mut self, file: &mut File) -> Result<(), TransferError> {
        loop {
            let n = file.read(&mut self.buf).await.map_err(TransferError::Local)?;
            if n == 0 {
                return Ok(());
            }
            with_deadline(self.deadline, self.stream.write_all(&self.buf[..n]))
                .await
                .map_err(TransferError::Peer)?;
            self.stats.add(n);
        }
    }

    /// Streams peer bytes into `file` until the peer half-closes.
    pub async fn recv_into_file(&mut self, file: &mut File) -> Result<(), TransferError> {
        loop {
            let n = with_deadline(self.deadline, self.stream.read(&mut self.buf))
                .await
                .map_err(TransferError::Peer)?;
            if n == 0 {
                file.flush().await.map_err(TransferError::Local)?;
                return Ok(());
            }
            file.write_all(&self.buf[..n])
                .await
                .map_err(TransferError::Local)?;
            self.stats.add(n);
        }
    }

    /// Writes one pre-rendered listing line.
    pub async fn send_line(&mut self, line: &str) -> Result<(), TransferError> {
        with_deadline(self.deadline, self.stream.write_all(line.as_bytes()))
            .await
            .map_err(TransferError::Peer)?;
        self.stats.add(line.len());
        Ok(())
    }

    /// Half-closes the data connection, draining pending bytes to the peer.
    pub async fn finish(mut self) -> Result<TransferStats, TransferError> {
        with_deadline(self.deadline, self.stream.shutdown())
            .await
            .map_err(TransferError::Peer)?;
        Ok(self.stats)
    }
}

/// Promotes the session's pending data endpoint to a live connection. On
/// failure the 425 (or 503) reply has already been written and `None` is
/// returned; the session itself stays healthy.
pub async fn establish_data_connection(
    writer: &Arc<Mutex<TcpStream>>,
    config: &Arc<Config>,
    session: &Arc<Mutex<Session>>,
) -> io::Result<Option<DataTransfer>> {
    let (listener, target, local_ip, index) = {
        let mut session = session.lock().await;
        (
            session.passive_listener.take(),
            session.port_target.take(),
            session.local_addr.ip(),
            session.index,
        )
    };

    let deadline = config.data_timeout();
    let connected: io::Result<TcpStream> = if let Some(listener) = listener {
        // The listener is consumed here; stragglers queued behind the first
        // connection are refused when it drops.
        with_deadline(deadline, async {
            let (stream, peer) = listener.accept().await?;
            debug!("[#{}] Passive data connection from {}", index, peer);
            Ok(stream)
        })
        .await
    } else if let Some(target) = target {
        with_deadline(
            deadline,
            socket::connect_active(local_ip, target, config.server.data_buffer_bytes),
        )
        .await
    } else {
        send_response(writer, b"503 Use PORT or PASV first.\r\n").await?;
        return Ok(None);
    };

    match connected {
        Ok(stream) => Ok(Some(DataTransfer::new(stream, config))),
        Err(e) => {
            warn!("[#{}] Data connection failed: {}", index, e);
            send_response(writer, b"425 Failed to establish data connection.\r\n").await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.server.data_buffer_bytes = 64;
        config.server.data_timeout_secs = 2;
        config
    }

    #[tokio::test]
    async fn lines_and_stats_flow_to_the_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut out = Vec::new();
            stream.read_to_end(&mut out).await.unwrap();
            out
        });

        let (stream, _) = listener.accept().await.unwrap();
        let mut transfer = DataTransfer::new(stream, &test_config());
        transfer.send_line("alpha\r\n").await.ok().unwrap();
        transfer.send_line("beta\r\n").await.ok().unwrap();
        let stats = match transfer.finish().await {
            Ok(stats) => stats,
            Err(_) => panic!("finish failed"),
        };
        assert_eq!(stats.bytes(), 13);

        let received = client.await.unwrap();
        assert_eq!(received, b"alpha\r\nbeta\r\n");
    }

    #[test]
    fn summary_mentions_bytes() {
        let mut stats = TransferStats::new();
        stats.add(2048);
        let summary = stats.summary();
        assert!(summary.starts_with("2048 bytes in "));
        assert!(summary.contains("KiB/s"));
    }
}

//! TCP connection to a play-state server.
//!
//! Moves raw bytes between the socket and the decoder's ring buffer. Framing
//! and interpretation happen elsewhere; this type only reports how many bytes
//! arrived and writes pre-encoded frames. Lifecycle changes are published on
//! a [`watch`] channel.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::watch;

use crate::ring_buffer::RingBuffer;

/// Where the socket is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The socket is open.
    Connected,
    /// The peer closed the socket, an I/O error occurred, or we hung up.
    Disconnected,
}

/// Errors from socket transfer.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,

    /// The ring buffer has no room for incoming bytes.
    #[error("read buffer full")]
    BufferFull,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connected server session.
pub struct ServerConnection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    recv_buf: Vec<u8>,
    state: watch::Sender<ConnectionState>,
}

impl ServerConnection {
    /// Connects to `host:port` with `TCP_NODELAY` set.
    ///
    /// Each [`ServerConnection::recv`] moves at most `recv_chunk_size` bytes.
    pub async fn connect(host: &str, port: u16, recv_chunk_size: usize) -> std::io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        tracing::info!("Connected to {host}:{port}");

        let (reader, writer) = stream.into_split();
        let (state, _) = watch::channel(ConnectionState::Connected);
        Ok(Self {
            reader,
            writer,
            recv_buf: vec![0; recv_chunk_size.max(1)],
            state,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every later state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn mark_disconnected(&self) {
        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// Waits for bytes and appends them to `ring`. Returns the count moved.
    pub async fn recv(&mut self, ring: &mut RingBuffer) -> Result<usize, ConnectionError> {
        let room = ring.free_size().min(self.recv_buf.len());
        if room == 0 {
            return Err(ConnectionError::BufferFull);
        }

        let n = match self.reader.read(&mut self.recv_buf[..room]).await {
            Ok(0) => {
                self.mark_disconnected();
                return Err(ConnectionError::Closed);
            }
            Ok(n) => n,
            Err(err) => {
                self.mark_disconnected();
                return Err(err.into());
            }
        };

        let written = ring.write(&self.recv_buf[..n]);
        debug_assert_eq!(written, n);
        Ok(written)
    }

    /// Writes one encoded frame.
    pub async fn send(&mut self, frame: &[u8]) -> Result<(), ConnectionError> {
        if let Err(err) = self.writer.write_all(frame).await {
            self.mark_disconnected();
            return Err(err.into());
        }
        Ok(())
    }

    /// Flushes and shuts down the write half.
    pub async fn disconnect(&mut self) {
        if let Err(err) = self.writer.shutdown().await {
            tracing::debug!("Shutdown of write half failed: {err}");
        }
        self.mark_disconnected();
    }
}

//! Byte pumps that feed a [`Session`]: a captured-stream replay and a live
//! TCP connection.

use std::io::{ErrorKind, Read};
use std::time::Instant;

use crossbeam_channel::Receiver;
use tessera_mesh::MeshConsumer;
use tessera_net::{ConnectionError, ServerConnection};

use crate::reload::ConfigReloader;
use crate::session::{Session, SessionError};

/// Errors that stop a driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The session hit a fatal error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading the replay source or opening the socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket failed.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The read buffer is full and no frame in it can complete.
    #[error("read buffer stalled with {0} bytes buffered")]
    Stalled(usize),
}

/// Totals reported by a driver run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    /// Bytes received.
    pub bytes: u64,
    /// Frames decoded.
    pub frames: u64,
    /// Columns meshed.
    pub columns_built: u64,
    /// Reply frames produced.
    pub replies: u64,
}

/// Feeds a captured clientbound stream through `session` in slices of at
/// most `chunk_size` bytes, processing after every slice.
///
/// Replies are drained from `replies` and counted but go nowhere.
pub fn replay<C: MeshConsumer>(
    mut source: impl Read,
    chunk_size: usize,
    session: &mut Session<C>,
    replies: &Receiver<Vec<u8>>,
) -> Result<DriveSummary, DriverError> {
    let mut summary = DriveSummary::default();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    while !session.is_disconnected() {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        summary.bytes += n as u64;

        let mut rest = &chunk[..n];
        while !rest.is_empty() {
            let written = session.feed(rest);
            rest = &rest[written..];

            let processed = session.process()?;
            summary.frames += processed.frames as u64;
            summary.columns_built += u64::from(processed.builds.built);
            summary.replies += replies.try_iter().count() as u64;

            if written == 0 && processed.frames == 0 {
                let buffered = session.read_buffer_mut().read_amount();
                return Err(DriverError::Stalled(buffered));
            }
        }
    }

    Ok(summary)
}

/// Connects to `host:port` and pumps bytes both ways until the server
/// disconnects or an error occurs.
///
/// The stream is expected to already be in the play state. With a
/// `reloader`, config file edits are applied between reads.
pub async fn run_connected<C: MeshConsumer>(
    host: &str,
    port: u16,
    recv_chunk_size: usize,
    session: &mut Session<C>,
    replies: &Receiver<Vec<u8>>,
    mut reloader: Option<&mut ConfigReloader>,
) -> Result<DriveSummary, DriverError> {
    let mut connection = ServerConnection::connect(host, port, recv_chunk_size).await?;
    let mut summary = DriveSummary::default();

    let result = pump(&mut connection, session, replies, &mut reloader, &mut summary).await;
    connection.disconnect().await;
    result.map(|()| summary)
}

async fn pump<C: MeshConsumer>(
    connection: &mut ServerConnection,
    session: &mut Session<C>,
    replies: &Receiver<Vec<u8>>,
    reloader: &mut Option<&mut ConfigReloader>,
    summary: &mut DriveSummary,
) -> Result<(), DriverError> {
    while !session.is_disconnected() {
        let received = match connection.recv(session.read_buffer_mut()).await {
            Ok(n) => n,
            Err(ConnectionError::Closed) => {
                tracing::info!("Server closed the connection");
                return Ok(());
            }
            Err(ConnectionError::BufferFull) => {
                let buffered = session.read_buffer_mut().read_amount();
                return Err(DriverError::Stalled(buffered));
            }
            Err(err) => return Err(err.into()),
        };
        summary.bytes += received as u64;

        let processed = session.process()?;
        summary.frames += processed.frames as u64;
        summary.columns_built += u64::from(processed.builds.built);

        for frame in replies.try_iter() {
            connection.send(&frame).await?;
            summary.replies += 1;
        }

        if let Some(reloader) = reloader.as_deref_mut()
            && let Some(fresh) = reloader.poll(Instant::now())
        {
            session.apply_config(fresh);
        }
    }
    Ok(())
}

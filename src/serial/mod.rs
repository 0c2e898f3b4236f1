//! # Serial Communication Module
//!
//! Carries the text command protocol between the configuration tool and the
//! engine.
//!
//! This module handles:
//! - Opening the command port (USB gadget serial by default)
//! - A transport task that forwards received chunks into a bounded queue and
//!   drains response lines onto the port
//! - Reopening the port after the host disconnects or a read/write fails
//! - Synchronous adapters the engine thread polls without blocking
//!
//! The engine never awaits. Received bytes cross into it through
//! [`ChannelByteSource`] (`try_recv`) and responses leave through
//! [`ChannelResponder`] (`try_send`). Both queues are bounded; overflow is
//! dropped with a warning.

pub mod port_trait;

use std::path::Path;
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{Result, SipPuffError};
use crate::protocol::{ByteSource, Response, ResponseSink};

pub use port_trait::{SerialPortIO, StreamWriter};

/// Read buffer reserved per read call
const READ_CHUNK: usize = 256;

/// Command port handle before it is handed to the transport task.
pub struct CommandPort {
    port: tokio_serial::SerialStream,
    config: SerialConfig,
}

impl std::fmt::Debug for CommandPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPort")
            .field("device_path", &self.config.port)
            .finish_non_exhaustive()
    }
}

impl CommandPort {
    /// Open the configured port at 8N1 without flow control.
    ///
    /// # Errors
    ///
    /// [`SipPuffError::SerialPortNotFound`] if the device node does not
    /// exist, [`SipPuffError::Serial`] if it exists but cannot be opened.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = open_stream(config)?;
        info!("Command port opened at {}", config.port);
        Ok(Self {
            port,
            config: config.clone(),
        })
    }

    pub fn device_path(&self) -> &str {
        &self.config.port
    }

    /// Spawn the transport task.
    ///
    /// Both queues hold up to `transport_queue` entries. After a disconnect
    /// the port is reopened every `reconnect_interval_ms` until it comes back.
    pub fn spawn(self) -> (ChannelByteSource, ChannelResponder, JoinHandle<()>) {
        let queue = self.config.transport_queue;
        let reconnect = Duration::from_millis(self.config.reconnect_interval_ms);
        let config = self.config;
        spawn_transport(Some(self.port), move || open_stream(&config), queue, reconnect)
    }
}

fn open_stream(config: &SerialConfig) -> Result<tokio_serial::SerialStream> {
    if !Path::new(&config.port).exists() {
        return Err(SipPuffError::SerialPortNotFound(config.port.clone()));
    }

    debug!("Opening command port {} at {} baud", config.port, config.baud_rate);
    tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| SipPuffError::Serial(format!("Failed to open {}: {}", config.port, e)))
}

/// Why one connection stopped being serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// EOF or an I/O error on the port; reopen it.
    Disconnected,
    /// The engine dropped its end of a queue; stop for good.
    EngineGone,
}

/// Spawn the transport task over any reopenable byte stream.
///
/// `initial` is used first if given; afterwards `connect` is called after
/// every disconnect.
pub fn spawn_transport<S, F>(
    initial: Option<S>,
    connect: F,
    queue: usize,
    reconnect: Duration,
) -> (ChannelByteSource, ChannelResponder, JoinHandle<()>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    F: FnMut() -> Result<S> + Send + 'static,
{
    let (rx_tx, rx_rx) = mpsc::channel(queue.max(1));
    let (tx_tx, tx_rx) = mpsc::channel(queue.max(1));

    let task = tokio::spawn(run_transport(initial, connect, rx_tx, tx_rx, reconnect));

    (ChannelByteSource::new(rx_rx), ChannelResponder::new(tx_tx), task)
}

/// Service connections until the engine goes away.
pub async fn run_transport<S, F>(
    mut initial: Option<S>,
    mut connect: F,
    queue: mpsc::Sender<Bytes>,
    mut lines: mpsc::Receiver<String>,
    reconnect: Duration,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    F: FnMut() -> Result<S>,
{
    loop {
        if queue.is_closed() {
            break;
        }

        let stream = match initial.take() {
            Some(stream) => stream,
            None => match connect() {
                Ok(stream) => {
                    info!("Command port reconnected");
                    stream
                }
                Err(e) => {
                    debug!("Command port still unavailable: {}", e);
                    tokio::time::sleep(reconnect).await;
                    continue;
                }
            },
        };

        let (mut reader, writer) = tokio::io::split(stream);
        let mut writer = StreamWriter::new(writer);

        let end = tokio::select! {
            end = read_loop(&mut reader, &queue) => end,
            end = write_loop(&mut writer, &mut lines) => end,
        };

        match end {
            SessionEnd::EngineGone => break,
            SessionEnd::Disconnected => {
                warn!(
                    "Command port disconnected, reopening in {} ms",
                    reconnect.as_millis()
                );
                tokio::time::sleep(reconnect).await;
            }
        }
    }
    debug!("Command transport stopped");
}

/// Forward received chunks until EOF, a read error, or the engine goes away.
///
/// A chunk that does not fit in the queue is dropped.
pub async fn read_loop<R>(reader: &mut R, queue: &mpsc::Sender<Bytes>) -> SessionEnd
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);

    loop {
        buf.reserve(READ_CHUNK);
        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                info!("Command port closed by host");
                return SessionEnd::Disconnected;
            }
            Ok(n) => {
                let chunk = buf.split().freeze();
                match queue.try_send(chunk) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!("Command queue full, dropped {} received bytes", n);
                    }
                    Err(TrySendError::Closed(_)) => return SessionEnd::EngineGone,
                }
            }
            Err(e) => {
                warn!("Command port read failed: {}", e);
                return SessionEnd::Disconnected;
            }
        }
    }
}

/// Write response lines until the port fails or every sender is dropped.
///
/// The line whose write failed is lost.
pub async fn write_loop<P>(port: &mut P, lines: &mut mpsc::Receiver<String>) -> SessionEnd
where
    P: SerialPortIO,
{
    while let Some(line) = lines.recv().await {
        let mut data = line.into_bytes();
        data.push(crate::protocol::LINE_TERMINATOR);

        if let Err(e) = port.write_all(&data).await {
            warn!("Failed to write response: {}", e);
            return SessionEnd::Disconnected;
        }
        if let Err(e) = port.flush().await {
            warn!("Failed to flush command port: {}", e);
        }
    }
    SessionEnd::EngineGone
}

/// Engine-side view of the receive queue.
pub struct ChannelByteSource {
    queue: mpsc::Receiver<Bytes>,
    current: Bytes,
}

impl ChannelByteSource {
    pub fn new(queue: mpsc::Receiver<Bytes>) -> Self {
        Self {
            queue,
            current: Bytes::new(),
        }
    }
}

impl ByteSource for ChannelByteSource {
    fn next_byte(&mut self) -> Option<u8> {
        while !self.current.has_remaining() {
            self.current = self.queue.try_recv().ok()?;
        }
        Some(self.current.get_u8())
    }
}

/// Engine-side sender of response lines.
///
/// Lines that find the queue full are dropped. One warning marks the start
/// of a dropping streak and one its end.
pub struct ChannelResponder {
    lines: mpsc::Sender<String>,
    dropped: u64,
    closed: bool,
}

impl ChannelResponder {
    pub fn new(lines: mpsc::Sender<String>) -> Self {
        Self {
            lines,
            dropped: 0,
            closed: false,
        }
    }

    /// Lines dropped in the current full-queue streak.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ResponseSink for ChannelResponder {
    fn send(&mut self, response: Response) {
        match self.lines.try_send(response.to_string()) {
            Ok(()) => {
                if self.dropped > 0 {
                    warn!("Response queue drained, {} lines were dropped", self.dropped);
                    self.dropped = 0;
                }
            }
            Err(TrySendError::Full(_)) => {
                if self.dropped == 0 {
                    warn!("Response queue full, dropping output until the port drains");
                }
                self.dropped += 1;
            }
            Err(TrySendError::Closed(_)) => {
                if !self.closed {
                    warn!("Response writer is gone, discarding output");
                    self.closed = true;
                }
            }
        }
    }
}

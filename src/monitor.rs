// src/monitor.rs
//! Event dispatch between the serial transport, the framer and the decoder

use crate::{
    config::MonitorConfig,
    error::{Error, Result},
    gps::{data::SentenceKind, decoder::SentenceDecoder, framer::LineFramer},
    report::{Report, ReportSink},
};
use serde::Serialize;
use std::{
    io,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

/// Events raised by the UART transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartEvent {
    /// A byte can be read from the transport.
    DataReady,
    /// Framing, parity or other line error, with a driver-specific code.
    CommunicationError(u32),
    /// The receive FIFO overflowed and bytes were lost.
    FifoError(u32),
}

/// Read accessor of the transport.
pub trait ByteSource {
    fn read_byte(&mut self) -> Option<u8>;
}

impl<I: Iterator<Item = u8>> ByteSource for I {
    fn read_byte(&mut self) -> Option<u8> {
        self.next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkFaultKind {
    Communication,
    FifoOverflow,
}

/// A transport-level fault, reported as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkFault {
    pub kind: LinkFaultKind,
    pub code: u32,
}

/// Counters kept by the event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub bytes: u64,
    pub lines: u64,
    pub decoded: u64,
    pub rejected: u64,
    pub link_faults: u64,
}

/// Owns the framer for one byte stream and routes its lines to the decoder.
///
/// Runs every event to completion; nothing here blocks.
pub struct EventLoop<S> {
    framer: LineFramer,
    decoder: SentenceDecoder,
    sink: S,
    reset_on_link_fault: bool,
    stats: LinkStats,
}

impl<S: ReportSink> EventLoop<S> {
    pub fn new(sink: S) -> Self {
        Self {
            framer: LineFramer::new(),
            decoder: SentenceDecoder::new(),
            sink,
            reset_on_link_fault: false,
            stats: LinkStats::default(),
        }
    }

    pub fn from_config(config: &MonitorConfig, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            framer: LineFramer::with_capacity(config.line_capacity),
            decoder: SentenceDecoder::with_strict(config.strict_checksum),
            sink,
            reset_on_link_fault: config.reset_on_link_fault,
            stats: LinkStats::default(),
        })
    }

    /// Handle one transport event.
    ///
    /// Returns the classification when the event completed a line.
    pub fn handle_event<B: ByteSource + ?Sized>(
        &mut self,
        event: UartEvent,
        transport: &mut B,
    ) -> Option<SentenceKind> {
        match event {
            UartEvent::DataReady => match transport.read_byte() {
                Some(byte) => self.push_byte(byte),
                None => {
                    debug!("data ready without a byte to read");
                    None
                }
            },
            UartEvent::CommunicationError(code) => {
                self.link_fault(LinkFaultKind::Communication, code);
                None
            }
            UartEvent::FifoError(code) => {
                self.link_fault(LinkFaultKind::FifoOverflow, code);
                None
            }
        }
    }

    /// Feed a chunk of received bytes, one data-ready event per byte.
    pub fn feed(&mut self, bytes: &[u8]) {
        let mut source = bytes.iter().copied();
        for _ in 0..bytes.len() {
            self.handle_event(UartEvent::DataReady, &mut source);
        }
    }

    fn push_byte(&mut self, byte: u8) -> Option<SentenceKind> {
        self.stats.bytes += 1;
        let line = self.framer.submit_byte(byte)?;
        self.stats.lines += 1;

        let kind = match self.decoder.process(&line, &mut self.sink) {
            Ok(kind) => {
                self.stats.decoded += 1;
                kind
            }
            Err(e) => {
                self.stats.rejected += 1;
                e.kind()
            }
        };
        debug!(sentence = %kind, line = line.trim_end(), "line decoded");
        Some(kind)
    }

    fn link_fault(&mut self, kind: LinkFaultKind, code: u32) {
        self.stats.link_faults += 1;
        if self.reset_on_link_fault {
            debug!(pending = self.framer.pending(), "discarding partial line after link fault");
            self.framer.reset();
        }
        self.sink.report(Report::LinkFault(LinkFault { kind, code }));
    }

    pub fn framer(&self) -> &LineFramer {
        &self.framer
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Where the byte stream comes from.
#[derive(Debug, Clone)]
pub enum NmeaSource {
    Serial { port: String, baudrate: u32 },
    /// A captured byte stream, replayed as fast as it can be read.
    Replay { path: PathBuf },
}

/// Drives an [`EventLoop`] from an async byte stream.
pub struct NmeaMonitor {
    config: MonitorConfig,
    running: AtomicBool,
}

impl NmeaMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(true),
        }
    }

    /// Read from the source until it ends or [`stop`](Self::stop) is called.
    pub async fn run<S: ReportSink>(&self, source: NmeaSource, sink: S) -> Result<EventLoop<S>> {
        match source {
            NmeaSource::Serial { port, baudrate } => {
                info!("Connecting to GPS on {} at {} baud...", port, baudrate);

                let serial = tokio_serial::new(&port, baudrate)
                    .timeout(Duration::from_millis(1000))
                    .open_native_async()
                    .map_err(|e| {
                        Error::Connection(format!("Failed to open serial port {}: {}", port, e))
                    })?;

                info!("Connected successfully!");
                self.run_reader(serial, sink).await
            }
            NmeaSource::Replay { path } => {
                info!("Replaying {}", path.display());
                let file = tokio::fs::File::open(&path).await.map_err(|e| {
                    Error::Connection(format!("Failed to open {}: {}", path.display(), e))
                })?;
                self.run_reader(file, sink).await
            }
        }
    }

    /// Pump any async reader through a fresh event loop.
    ///
    /// Transient read errors are reported as link faults and reading goes on;
    /// any other error is reported and ends the run.
    pub async fn run_reader<R, S>(&self, mut reader: R, sink: S) -> Result<EventLoop<S>>
    where
        R: AsyncRead + Unpin,
        S: ReportSink,
    {
        let mut event_loop = EventLoop::from_config(&self.config, sink)?;
        let mut chunk = [0u8; 256];

        while self.running.load(Ordering::Relaxed) {
            match reader.read(&mut chunk).await {
                Ok(0) => break, // EOF
                Ok(n) => event_loop.feed(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => {
                    let code = e.raw_os_error().map_or(0, |c| c as u32);
                    event_loop.handle_event(
                        UartEvent::CommunicationError(code),
                        &mut std::iter::empty::<u8>(),
                    );

                    if !is_transient(&e) {
                        return Err(Error::Io(e));
                    }
                }
            }
        }

        let stats = event_loop.stats();
        info!(
            bytes = stats.bytes,
            lines = stats.lines,
            decoded = stats.decoded,
            rejected = stats.rejected,
            link_faults = stats.link_faults,
            "byte stream finished"
        );
        Ok(event_loop)
    }

    /// Stop the monitor
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Check if the monitor is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::InvalidData
    )
}

/// List available serial ports
pub fn list_serial_ports() -> Result<Vec<tokio_serial::SerialPortInfo>> {
    tokio_serial::available_ports()
        .map_err(|e| Error::Connection(format!("Failed to list serial ports: {}", e)))
}

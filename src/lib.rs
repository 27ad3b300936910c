// src/lib.rs
//! NMEA Link Library
//!
//! Turns the raw byte stream of a serial GPS receiver into typed NMEA-0183
//! records. Bytes are framed into lines, each line is checked and classified,
//! and RMC, GGA, GST, GSV, VTG and ZDA sentences are decoded into fixed-point
//! records. Every line and every link fault produces exactly one [`Report`].
//!
//! ```
//! use nmea_link::{EventLoop, Report, SentenceKind};
//!
//! let mut event_loop = EventLoop::new(Vec::new());
//! event_loop.feed(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n");
//!
//! let reports: Vec<Report> = event_loop.into_sink();
//! assert_eq!(reports[0].kind(), Some(SentenceKind::Gga));
//! ```

pub mod config;
pub mod error;
pub mod gps;
pub mod monitor;
pub mod report;

// Re-export main types for convenience
pub use config::{MonitorConfig, OutputFormat};
pub use error::{DecodeError, Error, Result};
pub use gps::{FixedPoint, LineFramer, Record, SentenceDecoder, SentenceKind};
pub use monitor::{ByteSource, EventLoop, LinkFault, NmeaMonitor, NmeaSource, UartEvent};
pub use report::{Report, ReportSink};

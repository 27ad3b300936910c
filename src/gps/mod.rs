// src/gps/mod.rs
//! NMEA framing, scanning and decoding

pub mod data;
pub mod decoder;
pub mod framer;
pub mod nmea;
pub mod scan;

pub use data::{FixedPoint, Record, SentenceKind};
pub use decoder::SentenceDecoder;
pub use framer::LineFramer;

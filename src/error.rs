// src/error.rs
//! Error types for the NMEA link

use crate::gps::data::SentenceKind;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the outer surfaces: transport, configuration, output.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a framed line produced no record.
///
/// Every variant is recovered locally: the line is reported and dropped, and
/// the next sentence from the receiver is decoded normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "sentence", rename_all = "snake_case")]
pub enum DecodeError {
    /// Bad checksum, missing `$`, non-printable bytes or an unreadable id.
    #[error("sentence is not valid")]
    ChecksumOrStructureInvalid,

    /// Well formed, but not one of the sentences this crate decodes.
    #[error("sentence is not parsed")]
    UnrecognizedSentence,

    /// The id was recognized but its fields did not parse.
    #[error("$xx{0} sentence is not parsed")]
    FieldParseFailure(SentenceKind),
}

impl DecodeError {
    /// The classification a rejected line ends up with.
    pub fn kind(&self) -> SentenceKind {
        match self {
            DecodeError::ChecksumOrStructureInvalid => SentenceKind::Invalid,
            DecodeError::UnrecognizedSentence => SentenceKind::Unknown,
            DecodeError::FieldParseFailure(kind) => *kind,
        }
    }
}

// src/report/mod.rs
//! Structured reports emitted for every decoded line and link fault

pub mod json;
pub mod log;

use crate::{
    error::DecodeError,
    gps::data::{FixedPoint, GsvRecord, Record, SentenceKind, ZdaRecord},
    monitor::LinkFault,
};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// RMC coordinates and speed are rescaled to three decimal places.
pub const RMC_PRECISION: i32 = 1000;

/// GST error deviations are rescaled to one decimal place.
pub const GST_PRECISION: i32 = 10;

/// VTG tracks and speeds are rescaled to one decimal place.
pub const VTG_PRECISION: i32 = 10;

/// One numeric field in its three representations.
///
/// `fixed` and `float` are both derived from `raw`; `fixed / precision`
/// is within half a unit of `raw.value / raw.scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub raw: FixedPoint,
    pub precision: i32,
    pub fixed: i32,
    pub float: f32,
}

impl Measurement {
    /// A plain quantity: speed, track, deviation.
    pub fn scalar(raw: FixedPoint, precision: i32) -> Self {
        Self {
            raw,
            precision,
            fixed: raw.rescale(precision),
            float: raw.to_float(),
        }
    }

    /// A `[d]ddmm.mmmm` coordinate; `float` is in decimal degrees.
    pub fn coordinate(raw: FixedPoint, precision: i32) -> Self {
        Self {
            raw,
            precision,
            fixed: raw.rescale(precision),
            float: raw.to_coord(),
        }
    }
}

/// Reported fields of a decoded sentence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "sentence", rename_all = "UPPERCASE")]
pub enum DecodedReport {
    Rmc {
        latitude: Measurement,
        longitude: Measurement,
        speed: Measurement,
    },
    Gga {
        fix_quality: i32,
    },
    Gst {
        latitude_error_deviation: Measurement,
        longitude_error_deviation: Measurement,
        altitude_error_deviation: Measurement,
    },
    Gsv(GsvRecord),
    Vtg {
        true_track_degrees: Measurement,
        magnetic_track_degrees: Measurement,
        speed_knots: Measurement,
        speed_kph: Measurement,
    },
    Zda(ZdaRecord),
}

impl DecodedReport {
    pub fn kind(&self) -> SentenceKind {
        match self {
            DecodedReport::Rmc { .. } => SentenceKind::Rmc,
            DecodedReport::Gga { .. } => SentenceKind::Gga,
            DecodedReport::Gst { .. } => SentenceKind::Gst,
            DecodedReport::Gsv(_) => SentenceKind::Gsv,
            DecodedReport::Vtg { .. } => SentenceKind::Vtg,
            DecodedReport::Zda(_) => SentenceKind::Zda,
        }
    }
}

impl From<&Record> for DecodedReport {
    fn from(record: &Record) -> Self {
        match *record {
            Record::Rmc(rmc) => DecodedReport::Rmc {
                latitude: Measurement::coordinate(rmc.latitude, RMC_PRECISION),
                longitude: Measurement::coordinate(rmc.longitude, RMC_PRECISION),
                speed: Measurement::scalar(rmc.speed, RMC_PRECISION),
            },
            Record::Gga(gga) => DecodedReport::Gga {
                fix_quality: gga.fix_quality,
            },
            Record::Gst(gst) => DecodedReport::Gst {
                latitude_error_deviation: Measurement::scalar(
                    gst.latitude_error_deviation,
                    GST_PRECISION,
                ),
                longitude_error_deviation: Measurement::scalar(
                    gst.longitude_error_deviation,
                    GST_PRECISION,
                ),
                altitude_error_deviation: Measurement::scalar(
                    gst.altitude_error_deviation,
                    GST_PRECISION,
                ),
            },
            Record::Gsv(gsv) => DecodedReport::Gsv(gsv),
            Record::Vtg(vtg) => DecodedReport::Vtg {
                true_track_degrees: Measurement::scalar(vtg.true_track_degrees, VTG_PRECISION),
                magnetic_track_degrees: Measurement::scalar(
                    vtg.magnetic_track_degrees,
                    VTG_PRECISION,
                ),
                speed_knots: Measurement::scalar(vtg.speed_knots, VTG_PRECISION),
                speed_kph: Measurement::scalar(vtg.speed_kph, VTG_PRECISION),
            },
            Record::Zda(zda) => DecodedReport::Zda(zda),
        }
    }
}

/// One outcome pushed to a [`ReportSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Report {
    Decoded(DecodedReport),
    Rejected {
        kind: SentenceKind,
        #[serde(flatten)]
        reason: DecodeError,
    },
    LinkFault(LinkFault),
}

impl Report {
    pub fn rejected(reason: DecodeError) -> Self {
        Report::Rejected {
            kind: reason.kind(),
            reason,
        }
    }

    /// Sentence kind, or `None` for link faults.
    pub fn kind(&self) -> Option<SentenceKind> {
        match self {
            Report::Decoded(decoded) => Some(decoded.kind()),
            Report::Rejected { kind, .. } => Some(*kind),
            Report::LinkFault(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Decoded(_))
    }
}

/// Consumer of reports.
///
/// Called synchronously from the event loop, once per completed line or link
/// fault, in arrival order.
pub trait ReportSink {
    fn report(&mut self, report: Report);
}

impl ReportSink for Vec<Report> {
    fn report(&mut self, report: Report) {
        self.push(report);
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn report(&mut self, report: Report) {
        (**self).report(report);
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn report(&mut self, report: Report) {
        (**self).report(report);
    }
}

/// Forwards reports to another task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<Report>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Report>) -> Self {
        Self { tx }
    }
}

impl ReportSink for ChannelSink {
    fn report(&mut self, report: Report) {
        if self.tx.send(report).is_err() {
            debug!("report receiver dropped, discarding report");
        }
    }
}

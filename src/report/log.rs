// src/report/log.rs
//! Human-readable reporting through `tracing`

use super::{DecodedReport, Measurement, Report, ReportSink};
use crate::{error::DecodeError, monitor::LinkFault};
use tracing::{debug, info, warn};

/// Logs every report; decoded sentences at `info`, rejections at `warn`
/// (unrecognized sentences at `debug`, since receivers emit plenty of them).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }

    fn decoded(&self, decoded: &DecodedReport) {
        match decoded {
            DecodedReport::Rmc {
                latitude,
                longitude,
                speed,
            } => {
                info!(
                    "$xxRMC: raw coordinates and speed: ({},{}) {}",
                    latitude.raw, longitude.raw, speed.raw
                );
                info!(
                    "$xxRMC fixed-point coordinates and speed scaled to three decimal places: ({},{}) {}",
                    latitude.fixed, longitude.fixed, speed.fixed
                );
                info!(
                    "$xxRMC floating point degree coordinates and speed: ({:.6},{:.6}) {:.6}",
                    latitude.float, longitude.float, speed.float
                );
            }
            DecodedReport::Gga { fix_quality } => {
                info!("$xxGGA: fix quality: {}", fix_quality);
            }
            DecodedReport::Gst {
                latitude_error_deviation: lat,
                longitude_error_deviation: lon,
                altitude_error_deviation: alt,
            } => {
                info!(
                    "$xxGST: raw latitude, longitude and altitude error deviation: ({},{},{})",
                    lat.raw, lon.raw, alt.raw
                );
                info!(
                    "$xxGST fixed point latitude, longitude and altitude error deviation scaled to one decimal place: ({},{},{})",
                    lat.fixed, lon.fixed, alt.fixed
                );
                info!(
                    "$xxGST floating point latitude, longitude and altitude error deviation: ({:.6},{:.6},{:.6})",
                    lat.float, lon.float, alt.float
                );
            }
            DecodedReport::Gsv(gsv) => {
                info!("$xxGSV: message {} of {}", gsv.msg_nr, gsv.total_msgs);
                info!(
                    "$xxGSV: satellites in view: {} ({} in this message)",
                    gsv.total_sats, gsv.populated
                );
                for sat in &gsv.sats {
                    info!(
                        "$xxGSV: sat nr {}, elevation: {}, azimuth: {}, snr: {} dbm",
                        sat.nr, sat.elevation, sat.azimuth, sat.snr
                    );
                }
            }
            DecodedReport::Vtg {
                true_track_degrees,
                magnetic_track_degrees,
                speed_knots,
                speed_kph,
            } => {
                info!("$xxVTG: true track degrees = {}", render(true_track_degrees));
                info!("        magnetic track degrees = {}", render(magnetic_track_degrees));
                info!("        speed knots = {}", render(speed_knots));
                info!("        speed kph = {}", render(speed_kph));
            }
            DecodedReport::Zda(zda) => {
                info!("$xxZDA: {}:{}:{}", zda.hours, zda.minutes, zda.seconds);
            }
        }
    }

    fn link_fault(&self, fault: &LinkFault) {
        warn!(kind = ?fault.kind, code = fault.code, "serial link fault");
    }
}

fn render(m: &Measurement) -> String {
    format!("{:.6} ({} raw, {} fixed)", m.float, m.raw, m.fixed)
}

impl ReportSink for TracingSink {
    fn report(&mut self, report: Report) {
        match &report {
            Report::Decoded(decoded) => self.decoded(decoded),
            Report::Rejected {
                reason: DecodeError::UnrecognizedSentence,
                ..
            } => debug!("$xxxxx sentence is not parsed"),
            Report::Rejected {
                reason: DecodeError::ChecksumOrStructureInvalid,
                ..
            } => warn!("$xxxxx sentence is not valid"),
            Report::Rejected { reason, .. } => warn!("{}", reason),
            Report::LinkFault(fault) => self.link_fault(fault),
        }
    }
}

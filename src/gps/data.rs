// src/gps/data.rs
//! Sentence kinds, fixed-point values and decoded records

use chrono::NaiveTime;
use serde::Serialize;
use std::fmt;

/// Number of satellite slots carried by every GSV record.
pub const GSV_SLOTS: usize = 4;

/// Classification of a framed line.
///
/// Decided from the `$` id and checksum alone, never from payload content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentenceKind {
    Rmc,
    Gga,
    Gst,
    Gsv,
    Vtg,
    Zda,
    Unknown,
    Invalid,
}

impl SentenceKind {
    /// Map the three-letter sentence id (without talker) to a kind.
    pub fn from_sentence_id(id: &str) -> Self {
        match id {
            "RMC" => SentenceKind::Rmc,
            "GGA" => SentenceKind::Gga,
            "GST" => SentenceKind::Gst,
            "GSV" => SentenceKind::Gsv,
            "VTG" => SentenceKind::Vtg,
            "ZDA" => SentenceKind::Zda,
            _ => SentenceKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentenceKind::Rmc => "RMC",
            SentenceKind::Gga => "GGA",
            SentenceKind::Gst => "GST",
            SentenceKind::Gsv => "GSV",
            SentenceKind::Vtg => "VTG",
            SentenceKind::Zda => "ZDA",
            SentenceKind::Unknown => "UNKNOWN",
            SentenceKind::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for SentenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exact decimal `value / scale` as read from an NMEA field.
///
/// A scale of zero marks an empty field. Numeric fields are kept in this form
/// until a consumer asks for a rescaled integer or a float, so parsing never
/// rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FixedPoint {
    pub value: i32,
    pub scale: i32,
}

impl FixedPoint {
    pub const fn new(value: i32, scale: i32) -> Self {
        Self { value, scale }
    }

    /// True when the source field was empty.
    pub fn is_empty(&self) -> bool {
        self.scale == 0
    }

    /// Express the value as an integer count of `1 / new_scale` units.
    ///
    /// Down-scaling rounds half away from zero, up-scaling is exact. Empty
    /// values and non-positive targets give 0; results outside `i32`
    /// saturate.
    pub fn rescale(&self, new_scale: i32) -> i32 {
        if self.scale == 0 || new_scale <= 0 {
            return 0;
        }
        if self.scale == new_scale {
            return self.value;
        }

        let value = i64::from(self.value);
        let scale = i64::from(self.scale);
        let new_scale = i64::from(new_scale);

        let rescaled = if scale > new_scale {
            let factor = scale / new_scale;
            (value + value.signum() * factor / 2) / factor
        } else {
            value * (new_scale / scale)
        };

        rescaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Lossy conversion to a float; NaN for an empty value.
    pub fn to_float(&self) -> f32 {
        if self.scale == 0 {
            return f32::NAN;
        }
        self.value as f32 / self.scale as f32
    }

    /// Interpret a raw `[d]ddmm.mmmm` coordinate as decimal degrees.
    pub fn to_coord(&self) -> f32 {
        if self.scale == 0 || self.scale > i32::MAX / 100 || self.scale < i32::MIN / 100 {
            return f32::NAN;
        }
        let per_degree = self.scale * 100;
        let degrees = self.value / per_degree;
        let minutes = self.value % per_degree;
        degrees as f32 + minutes as f32 / (60 * self.scale) as f32
    }

    /// Apply an N/E (+1) or S/W (-1) hemisphere; 0 clears the value.
    pub(crate) fn with_direction(self, direction: i32) -> Self {
        Self {
            value: self.value.saturating_mul(direction),
            scale: self.scale,
        }
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.scale)
    }
}

/// Recommended minimum position and velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RmcRecord {
    pub latitude: FixedPoint,
    pub longitude: FixedPoint,
    /// Knots
    pub speed: FixedPoint,
}

/// Fix data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GgaRecord {
    pub fix_quality: i32,
}

/// Pseudorange error statistics, in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GstRecord {
    pub latitude_error_deviation: FixedPoint,
    pub longitude_error_deviation: FixedPoint,
    pub altitude_error_deviation: FixedPoint,
}

/// One satellite entry of a GSV sentence. Absent entries are all zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SatelliteSlot {
    pub nr: i32,
    pub elevation: i32,
    pub azimuth: i32,
    /// dB-Hz
    pub snr: i32,
}

/// Satellites in view.
///
/// `sats` always holds [`GSV_SLOTS`] entries, whatever `total_sats` says; the
/// trailing message of a group usually carries fewer satellites and the rest
/// are zero. `populated` counts the entries whose id field was present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GsvRecord {
    pub msg_nr: i32,
    pub total_msgs: i32,
    pub total_sats: i32,
    pub sats: [SatelliteSlot; GSV_SLOTS],
    pub populated: u8,
}

/// Track made good and ground speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VtgRecord {
    pub true_track_degrees: FixedPoint,
    pub magnetic_track_degrees: FixedPoint,
    pub speed_knots: FixedPoint,
    pub speed_kph: FixedPoint,
}

/// UTC time of day from a ZDA sentence; -1 when the field was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZdaRecord {
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
}

impl ZdaRecord {
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let hours = u32::try_from(self.hours).ok()?;
        let minutes = u32::try_from(self.minutes).ok()?;
        let seconds = u32::try_from(self.seconds).ok()?;
        NaiveTime::from_hms_opt(hours, minutes, seconds)
    }
}

/// A successfully decoded sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "sentence", rename_all = "UPPERCASE")]
pub enum Record {
    Rmc(RmcRecord),
    Gga(GgaRecord),
    Gst(GstRecord),
    Gsv(GsvRecord),
    Vtg(VtgRecord),
    Zda(ZdaRecord),
}

impl Record {
    pub fn kind(&self) -> SentenceKind {
        match self {
            Record::Rmc(_) => SentenceKind::Rmc,
            Record::Gga(_) => SentenceKind::Gga,
            Record::Gst(_) => SentenceKind::Gst,
            Record::Gsv(_) => SentenceKind::Gsv,
            Record::Vtg(_) => SentenceKind::Vtg,
            Record::Zda(_) => SentenceKind::Zda,
        }
    }
}

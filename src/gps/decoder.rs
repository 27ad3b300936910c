// src/gps/decoder.rs
//! Sentence classification and dispatch to the field parsers

use super::data::{Record, SentenceKind};
use super::nmea;
use crate::{
    error::DecodeError,
    report::{DecodedReport, Report, ReportSink},
};
use tracing::debug;

/// Stateless decoder for framed lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceDecoder {
    strict: bool,
}

impl SentenceDecoder {
    /// Lenient decoder: lines without a `*HH` checksum are accepted.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Require a checksum on every line.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    pub fn classify(&self, line: &str) -> SentenceKind {
        nmea::classify(line, self.strict)
    }

    /// Classify and parse a line into its record.
    pub fn decode_record(&self, line: &str) -> Result<Record, DecodeError> {
        let kind = self.classify(line);
        let parsed = match kind {
            SentenceKind::Rmc => nmea::parse_rmc(line).map(Record::Rmc),
            SentenceKind::Gga => nmea::parse_gga(line).map(Record::Gga),
            SentenceKind::Gst => nmea::parse_gst(line).map(Record::Gst),
            SentenceKind::Gsv => nmea::parse_gsv(line).map(Record::Gsv),
            SentenceKind::Vtg => nmea::parse_vtg(line).map(Record::Vtg),
            SentenceKind::Zda => nmea::parse_zda(line).map(Record::Zda),
            SentenceKind::Unknown => return Err(DecodeError::UnrecognizedSentence),
            SentenceKind::Invalid => return Err(DecodeError::ChecksumOrStructureInvalid),
        };

        parsed.map_err(|e| {
            debug!(sentence = %kind, error = %e, "field parse failed");
            DecodeError::FieldParseFailure(kind)
        })
    }

    /// Classify and parse a line; the record is present only on success.
    pub fn decode(&self, line: &str) -> (SentenceKind, Option<Record>) {
        match self.decode_record(line) {
            Ok(record) => (record.kind(), Some(record)),
            Err(e) => (e.kind(), None),
        }
    }

    /// Decode a line and push exactly one report for it.
    ///
    /// The error has already been reported when this returns `Err`.
    pub fn process<S: ReportSink + ?Sized>(
        &self,
        line: &str,
        sink: &mut S,
    ) -> Result<SentenceKind, DecodeError> {
        match self.decode_record(line) {
            Ok(record) => {
                sink.report(Report::Decoded(DecodedReport::from(&record)));
                Ok(record.kind())
            }
            Err(e) => {
                sink.report(Report::rejected(e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::data::{FixedPoint, GSV_SLOTS};

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    #[test]
    fn test_decode_gga() {
        let (kind, record) = SentenceDecoder::new().decode(GGA);
        assert_eq!(kind, SentenceKind::Gga);
        match record {
            Some(Record::Gga(gga)) => assert_eq!(gga.fix_quality, 1),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_decode_is_idempotent() {
        let decoder = SentenceDecoder::new();
        assert_eq!(decoder.decode(RMC), decoder.decode(RMC));
    }

    #[test]
    fn test_decode_rejections() {
        let decoder = SentenceDecoder::new();
        assert_eq!(decoder.decode("$GPXXX,1,2,3*53\n"), (SentenceKind::Unknown, None));
        assert_eq!(decoder.decode("$GPRMC,1,2,3*00\n"), (SentenceKind::Invalid, None));
        assert_eq!(
            decoder.decode("$GPRMC,123519,A,4807.038,Q,01131.000,E,022.4,084.4,230394,003.1,W*75\n"),
            (SentenceKind::Rmc, None)
        );
        assert_eq!(
            decoder.decode_record("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,X*5B"),
            Err(DecodeError::FieldParseFailure(SentenceKind::Vtg))
        );
    }

    #[test]
    fn test_strict_decoder_requires_checksum() {
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,\n";
        assert_eq!(SentenceDecoder::new().decode(line).0, SentenceKind::Gga);
        assert_eq!(SentenceDecoder::strict().decode(line), (SentenceKind::Invalid, None));
    }

    #[test]
    fn test_process_reports_once_per_line() {
        let decoder = SentenceDecoder::new();
        let mut reports = Vec::new();

        assert_eq!(decoder.process(RMC, &mut reports), Ok(SentenceKind::Rmc));
        assert_eq!(
            decoder.process("$GPXXX,1,2,3*53\n", &mut reports),
            Err(DecodeError::UnrecognizedSentence)
        );
        assert_eq!(
            decoder.process("garbage\n", &mut reports),
            Err(DecodeError::ChecksumOrStructureInvalid)
        );

        assert_eq!(reports.len(), 3);
        match &reports[0] {
            Report::Decoded(DecodedReport::Rmc { latitude, speed, .. }) => {
                assert_eq!(latitude.raw, FixedPoint::new(4807038, 1000));
                assert_eq!(latitude.fixed, 4807038);
                assert_eq!(speed.fixed, 22400);
            }
            other => panic!("unexpected report {:?}", other),
        }
        assert_eq!(reports[1], Report::rejected(DecodeError::UnrecognizedSentence));
        assert_eq!(reports[2], Report::rejected(DecodeError::ChecksumOrStructureInvalid));
    }

    #[test]
    fn test_gsv_always_has_four_slots() {
        let (_, record) = SentenceDecoder::new().decode("$GPGSV,4,4,13,39,31,170,27*40\r\n");
        let Some(Record::Gsv(gsv)) = record else {
            panic!("expected GSV record");
        };
        assert_eq!(gsv.sats.len(), GSV_SLOTS);
        assert_eq!(gsv.populated, 1);
        assert_eq!(gsv.total_sats, 13);
        assert!(gsv.sats[1..].iter().all(|sat| sat.nr == 0 && sat.snr == 0));
    }
}

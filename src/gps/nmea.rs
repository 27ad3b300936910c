// src/gps/nmea.rs
//! NMEA sentence validation, classification and parsing

use super::data::{
    GgaRecord, GstRecord, GsvRecord, RmcRecord, SatelliteSlot, SentenceKind, VtgRecord,
    ZdaRecord, GSV_SLOTS,
};
use super::scan::{FieldScanner, ScanError};

/// Longest sentence the protocol allows, excluding the line ending.
pub const MAX_SENTENCE_LENGTH: usize = 80;

/// Longest line accepted by [`check`]: a sentence plus CR, LF and one byte of
/// slack.
pub const MAX_LINE_LENGTH: usize = MAX_SENTENCE_LENGTH + 3;

/// XOR of every byte between `$` and `*`.
#[inline]
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

#[inline]
fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Structural validation of a raw line.
///
/// The line must start with `$`, carry only printable bytes up to `*`, and
/// end in nothing but CR/LF. A `*HH` checksum is verified when present;
/// `strict` rejects lines without one.
pub fn check(line: &str, strict: bool) -> bool {
    let bytes = line.as_bytes();
    if bytes.len() > MAX_LINE_LENGTH {
        return false;
    }

    let Some((&b'$', rest)) = bytes.split_first() else {
        return false;
    };

    let end = rest
        .iter()
        .position(|&b| b == b'*' || !(0x20..=0x7e).contains(&b))
        .unwrap_or(rest.len());
    let (payload, tail) = rest.split_at(end);

    let tail = match tail.split_first() {
        Some((&b'*', after)) => {
            let (Some(high), Some(low)) = (
                after.first().copied().and_then(hex_digit),
                after.get(1).copied().and_then(hex_digit),
            ) else {
                return false;
            };
            if checksum(payload) != (high << 4 | low) {
                return false;
            }
            &after[2..]
        }
        _ if strict => return false,
        _ => tail,
    };

    matches!(tail, b"" | b"\n" | b"\r\n")
}

/// Classify a raw line without parsing its payload.
pub fn classify(line: &str, strict: bool) -> SentenceKind {
    if !check(line, strict) {
        return SentenceKind::Invalid;
    }
    match FieldScanner::new(line).sentence_id() {
        Ok(id) => SentenceKind::from_sentence_id(&id[2..]),
        Err(_) => SentenceKind::Invalid,
    }
}

/// `$xxRMC,time,status,lat,N,lon,E,speed,course,date,variation,E`
pub fn parse_rmc(line: &str) -> Result<RmcRecord, ScanError> {
    let mut f = FieldScanner::new(line);
    f.expect_sentence("RMC")?;
    let _time = f.time()?;
    let _status = f.char()?;
    let latitude = f.float()?;
    let latitude_direction = f.direction()?;
    let longitude = f.float()?;
    let longitude_direction = f.direction()?;
    let speed = f.float()?;
    let _course = f.float()?;
    let _date = f.date()?;
    let _variation = f.float()?;
    let _variation_direction = f.direction()?;

    Ok(RmcRecord {
        latitude: latitude.with_direction(latitude_direction),
        longitude: longitude.with_direction(longitude_direction),
        speed,
    })
}

/// `$xxGGA,time,lat,N,lon,E,quality,sats,hdop,alt,M,geoid,M,age,station`
pub fn parse_gga(line: &str) -> Result<GgaRecord, ScanError> {
    let mut f = FieldScanner::new(line);
    f.expect_sentence("GGA")?;
    let _time = f.time()?;
    let _latitude = f.float()?;
    let _latitude_direction = f.direction()?;
    let _longitude = f.float()?;
    let _longitude_direction = f.direction()?;
    let fix_quality = f.int()?;
    let _satellites_tracked = f.int()?;
    let _hdop = f.float()?;
    let _altitude = f.float()?;
    let _altitude_units = f.char()?;
    let _height = f.float()?;
    let _height_units = f.char()?;
    let _dgps_age = f.float()?;
    f.skip()?;

    Ok(GgaRecord { fix_quality })
}

/// `$xxGST,time,rms,major,minor,orientation,lat_err,lon_err,alt_err`
pub fn parse_gst(line: &str) -> Result<GstRecord, ScanError> {
    let mut f = FieldScanner::new(line);
    f.expect_sentence("GST")?;
    let _time = f.time()?;
    let _rms_deviation = f.float()?;
    let _semi_major_deviation = f.float()?;
    let _semi_minor_deviation = f.float()?;
    let _semi_major_orientation = f.float()?;

    Ok(GstRecord {
        latitude_error_deviation: f.float()?,
        longitude_error_deviation: f.float()?,
        altitude_error_deviation: f.float()?,
    })
}

/// `$xxGSV,total_msgs,msg_nr,total_sats[,nr,elevation,azimuth,snr]{0..4}`
pub fn parse_gsv(line: &str) -> Result<GsvRecord, ScanError> {
    let mut f = FieldScanner::new(line);
    f.expect_sentence("GSV")?;
    let total_msgs = f.int()?;
    let msg_nr = f.int()?;
    let total_sats = f.int()?;
    f.rest_optional();

    let mut sats = [SatelliteSlot::default(); GSV_SLOTS];
    let mut populated = 0u8;
    for slot in sats.iter_mut() {
        let nr = f.int_field()?;
        if nr.is_some() {
            populated += 1;
        }
        *slot = SatelliteSlot {
            nr: nr.unwrap_or(0),
            elevation: f.int()?,
            azimuth: f.int()?,
            snr: f.int()?,
        };
    }

    Ok(GsvRecord {
        msg_nr,
        total_msgs,
        total_sats,
        sats,
        populated,
    })
}

/// `$xxVTG,true,T,magnetic,M,knots,N,kph,K[,mode]`
pub fn parse_vtg(line: &str) -> Result<VtgRecord, ScanError> {
    let mut f = FieldScanner::new(line);
    f.expect_sentence("VTG")?;
    let true_track_degrees = f.float()?;
    let true_unit = f.char()?;
    let magnetic_track_degrees = f.float()?;
    let magnetic_unit = f.char()?;
    let speed_knots = f.float()?;
    let knots_unit = f.char()?;
    let speed_kph = f.float()?;
    let kph_unit = f.char()?;
    f.rest_optional();
    let _faa_mode = f.char()?;

    // Values only count with their unit letters in place.
    if (true_unit, magnetic_unit, knots_unit, kph_unit) != ('T', 'M', 'N', 'K') {
        return Err(ScanError::Malformed {
            index: 8,
            format: "unit letter",
        });
    }

    Ok(VtgRecord {
        true_track_degrees,
        magnetic_track_degrees,
        speed_knots,
        speed_kph,
    })
}

/// `$xxZDA,time,day,month,year,zone_hours,zone_minutes`
pub fn parse_zda(line: &str) -> Result<ZdaRecord, ScanError> {
    let mut f = FieldScanner::new(line);
    f.expect_sentence("ZDA")?;
    let time = f.time()?;
    let _day = f.int()?;
    let _month = f.int()?;
    let _year = f.int()?;
    let hour_offset = f.int()?;
    let minute_offset = f.int()?;

    if !(-13..=13).contains(&hour_offset) || !(0..=59).contains(&minute_offset) {
        return Err(ScanError::Malformed {
            index: 5,
            format: "zone offset",
        });
    }

    Ok(ZdaRecord {
        hours: time.hours,
        minutes: time.minutes,
        seconds: time.seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::data::FixedPoint;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(b"GPXXX,1,2,3"), 0x53);
    }

    #[test]
    fn test_check_accepts_line_endings() {
        assert!(check(GGA, false));
        assert!(check(&format!("{GGA}\r\n"), false));
        assert!(check(&format!("{GGA}\n"), false));
        assert!(check("$GPGGA,1,2,3", false));
    }

    #[test]
    fn test_check_rejects() {
        // checksum mismatch
        assert!(!check("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48", false));
        // bad hex
        assert!(!check("$GPXXX,1,2,3*5G", false));
        // truncated checksum
        assert!(!check("$GPXXX,1,2,3*5", false));
        // missing $
        assert!(!check("GPXXX,1,2,3*53", false));
        // garbage after the checksum
        assert!(!check("$GPXXX,1,2,3*53 ", false));
        // non-printable byte in payload
        assert!(!check("$GPXXX,1,\u{1}2,3", false));
        // only LF or CRLF may end a line
        for tail in ["\r", "\n\r", "\r\r\n", "\r\n\r\n", "\n\n"] {
            assert!(!check(&format!("$GPXXX,1,2,3*53{tail}"), false), "{tail:?}");
            assert!(!check(&format!("$GPXXX,1,2,3{tail}"), false), "{tail:?}");
        }
        // strict mode requires a checksum
        assert!(!check("$GPGGA,1,2,3", true));
        assert!(check(GGA, true));
        // over length
        let long = format!("$GPXXX,{}", "1".repeat(MAX_LINE_LENGTH));
        assert!(!check(&long, false));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(GGA, false), SentenceKind::Gga);
        assert_eq!(classify(RMC, false), SentenceKind::Rmc);
        assert_eq!(classify("$GPXXX,1,2,3*53", false), SentenceKind::Unknown);
        assert_eq!(classify("$GPRMC,1,2,3*00", false), SentenceKind::Invalid);
        assert_eq!(classify("$GP,1,2,3", false), SentenceKind::Invalid);
        assert_eq!(classify("", false), SentenceKind::Invalid);
    }

    #[test]
    fn test_parse_rmc() {
        let rmc = parse_rmc(RMC).unwrap();
        assert_eq!(rmc.latitude, FixedPoint::new(4807038, 1000));
        assert_eq!(rmc.longitude, FixedPoint::new(1131000, 1000));
        assert_eq!(rmc.speed, FixedPoint::new(224, 10));
    }

    #[test]
    fn test_parse_rmc_southern_hemisphere() {
        let rmc = parse_rmc("$GPRMC,081836,A,3751.65,S,14507.36,E,000.0,360.0,130998,011.3,E*62")
            .unwrap();
        assert_eq!(rmc.latitude, FixedPoint::new(-375165, 100));
        assert_eq!(rmc.longitude, FixedPoint::new(1450736, 100));
        assert_eq!(rmc.speed, FixedPoint::new(0, 10));
    }

    #[test]
    fn test_parse_rmc_rejects_bad_direction() {
        let err = parse_rmc("$GPRMC,123519,A,4807.038,Q,01131.000,E,022.4,084.4,230394,003.1,W*75");
        assert!(matches!(err, Err(ScanError::Malformed { format: "direction", .. })));
    }

    #[test]
    fn test_parse_gga() {
        assert_eq!(parse_gga(GGA).unwrap().fix_quality, 1);
        assert!(parse_gga("$GPGGA,123519,4807.038,N,01131.000,E,x,08,0.9,545.4,M,46.9,M,,*0E").is_err());
        assert!(parse_gga(RMC).is_err());
    }

    #[test]
    fn test_parse_gst() {
        let gst = parse_gst("$GPGST,024603.00,3.2,6.6,4.7,47.3,5.8,5.6,22.0*58").unwrap();
        assert_eq!(gst.latitude_error_deviation, FixedPoint::new(58, 10));
        assert_eq!(gst.longitude_error_deviation, FixedPoint::new(56, 10));
        assert_eq!(gst.altitude_error_deviation, FixedPoint::new(220, 10));
    }

    #[test]
    fn test_parse_gsv_full_message() {
        let gsv =
            parse_gsv("$GPGSV,3,1,11,03,03,111,00,04,15,270,00,06,01,010,00,13,06,292,00*74")
                .unwrap();
        assert_eq!(gsv.total_msgs, 3);
        assert_eq!(gsv.msg_nr, 1);
        assert_eq!(gsv.total_sats, 11);
        assert_eq!(gsv.populated, 4);
        assert_eq!(
            gsv.sats[3],
            SatelliteSlot { nr: 13, elevation: 6, azimuth: 292, snr: 0 }
        );
    }

    #[test]
    fn test_parse_gsv_partial_message_keeps_four_slots() {
        let gsv = parse_gsv("$GPGSV,3,3,11,22,42,067,42,24,14,311,43,27,05,244,00,,,,*4D").unwrap();
        assert_eq!(gsv.populated, 3);
        assert_eq!(gsv.sats.len(), GSV_SLOTS);
        assert_eq!(gsv.sats[3], SatelliteSlot::default());

        let gsv = parse_gsv("$GPGSV,4,4,13,39,31,170,27*40").unwrap();
        assert_eq!(gsv.populated, 1);
        assert_eq!(
            gsv.sats[0],
            SatelliteSlot { nr: 39, elevation: 31, azimuth: 170, snr: 27 }
        );
        assert_eq!(gsv.sats[1], SatelliteSlot::default());
    }

    #[test]
    fn test_parse_vtg() {
        let vtg = parse_vtg("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48").unwrap();
        assert_eq!(vtg.true_track_degrees, FixedPoint::new(547, 10));
        assert_eq!(vtg.magnetic_track_degrees, FixedPoint::new(344, 10));
        assert_eq!(vtg.speed_knots, FixedPoint::new(55, 10));
        assert_eq!(vtg.speed_kph, FixedPoint::new(102, 10));

        assert!(parse_vtg("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,X*5B").is_err());
    }

    #[test]
    fn test_parse_zda() {
        let zda = parse_zda("$GPZDA,201530.00,04,07,2002,00,00*60").unwrap();
        assert_eq!(zda, ZdaRecord { hours: 20, minutes: 15, seconds: 30 });

        assert!(parse_zda("$GPZDA,201530.00,04,07,2002,14,00*65").is_err());
    }

    #[test]
    fn test_parse_zda_hour_offset_bounds() {
        let zda = |hours: i32| parse_zda(&format!("$GPZDA,201530.00,04,07,2002,{hours},00"));

        assert!(zda(13).is_ok());
        assert!(zda(-13).is_ok());
        assert!(zda(14).is_err());
        assert!(zda(-14).is_err());
        assert!(zda(i32::MIN).is_err());
        assert!(zda(i32::MAX).is_err());
    }

    #[test]
    fn test_classify_zda_with_extreme_offset() {
        let payload = "GPZDA,201530.00,04,07,2002,-2147483648,00";
        let line = format!("${}*{:02X}\r\n", payload, checksum(payload.as_bytes()));

        assert_eq!(classify(&line, true), SentenceKind::Zda);
        assert!(parse_zda(&line).is_err());
    }
}

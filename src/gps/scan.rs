// src/gps/scan.rs
//! Field-level scanning of NMEA sentences
//!
//! A sentence is a `$` id followed by comma-separated fields. A field ends at
//! the first comma, `*`, or non-printable byte; scanning stops entirely at
//! the first byte that is neither a field byte nor a comma, so the checksum
//! and line ending are never read as fields.

use super::data::FixedPoint;
use thiserror::Error;

/// Why a sentence's fields could not be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("missing field {index}")]
    MissingField { index: usize },

    #[error("malformed {format} in field {index}")]
    Malformed { index: usize, format: &'static str },

    #[error("expected ${expected} sentence")]
    WrongSentence { expected: &'static str },
}

/// True for bytes that may appear inside a field.
pub fn is_field_byte(b: u8) -> bool {
    (0x20..=0x7e).contains(&b) && b != b',' && b != b'*'
}

/// UTC time of day; every component is -1 when the field was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcTime {
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub microseconds: i32,
}

impl UtcTime {
    pub const EMPTY: UtcTime = UtcTime {
        hours: -1,
        minutes: -1,
        seconds: -1,
        microseconds: -1,
    };
}

/// Calendar date with a two-digit year; every component is -1 when empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcDate {
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

impl UtcDate {
    pub const EMPTY: UtcDate = UtcDate {
        day: -1,
        month: -1,
        year: -1,
    };
}

/// Sequential reader over the fields of one sentence.
pub struct FieldScanner<'a> {
    fields: std::str::Split<'a, char>,
    index: usize,
    optional: bool,
}

impl<'a> FieldScanner<'a> {
    pub fn new(line: &'a str) -> Self {
        let end = line
            .bytes()
            .position(|b| !(is_field_byte(b) || b == b','))
            .unwrap_or(line.len());

        Self {
            fields: line[..end].split(','),
            index: 0,
            optional: false,
        }
    }

    /// Every field read after this call may be missing and takes its
    /// empty-field default.
    pub fn rest_optional(&mut self) {
        self.optional = true;
    }

    fn next_field(&mut self) -> Result<Option<&'a str>, ScanError> {
        let index = self.index;
        self.index += 1;
        match self.fields.next() {
            Some(field) => Ok(Some(field)),
            None if self.optional => Ok(None),
            None => Err(ScanError::MissingField { index }),
        }
    }

    fn malformed(&self, format: &'static str) -> ScanError {
        ScanError::Malformed {
            index: self.index.saturating_sub(1),
            format,
        }
    }

    /// The five-character talker + sentence id, e.g. `GPRMC`.
    ///
    /// Always mandatory, and only the first five bytes after `$` count.
    pub fn sentence_id(&mut self) -> Result<&'a str, ScanError> {
        let field = self
            .fields
            .next()
            .ok_or(ScanError::MissingField { index: self.index })?;
        self.index += 1;

        let id = field
            .strip_prefix('$')
            .and_then(|rest| rest.get(..5))
            .ok_or_else(|| self.malformed("sentence id"))?;
        Ok(id)
    }

    /// Read the id and require the given three-letter sentence type.
    pub fn expect_sentence(&mut self, expected: &'static str) -> Result<(), ScanError> {
        let id = self.sentence_id()?;
        if id.get(2..) != Some(expected) {
            return Err(ScanError::WrongSentence { expected });
        }
        Ok(())
    }

    /// Skip a field that must be present but is not interpreted.
    pub fn skip(&mut self) -> Result<(), ScanError> {
        self.next_field().map(|_| ())
    }

    /// First character of the field, `'\0'` when empty.
    pub fn char(&mut self) -> Result<char, ScanError> {
        Ok(self
            .next_field()?
            .and_then(|field| field.chars().next())
            .unwrap_or('\0'))
    }

    /// Hemisphere: +1 for N/E, -1 for S/W, 0 when empty.
    pub fn direction(&mut self) -> Result<i32, ScanError> {
        match self.next_field()?.and_then(|field| field.bytes().next()) {
            None => Ok(0),
            Some(b'N') | Some(b'E') => Ok(1),
            Some(b'S') | Some(b'W') => Ok(-1),
            Some(_) => Err(self.malformed("direction")),
        }
    }

    /// Decimal number kept as a [`FixedPoint`]; `0/0` when empty.
    ///
    /// Leading spaces are tolerated. Fractional digits that no longer fit in
    /// an `i32` are dropped; integer digits that do not fit are an error.
    pub fn float(&mut self) -> Result<FixedPoint, ScanError> {
        let Some(field) = self.next_field()? else {
            return Ok(FixedPoint::default());
        };

        let mut sign = 0i32;
        let mut value: Option<i32> = None;
        let mut scale = 0i32;

        for b in field.bytes() {
            match b {
                b'+' if sign == 0 && value.is_none() => sign = 1,
                b'-' if sign == 0 && value.is_none() => sign = -1,
                b'0'..=b'9' => {
                    let digit = i32::from(b - b'0');
                    let current = value.unwrap_or(0);
                    let fits = current <= (i32::MAX - digit) / 10
                        && (scale == 0 || scale <= i32::MAX / 10);
                    if !fits {
                        if scale != 0 {
                            break;
                        }
                        return Err(self.malformed("number"));
                    }
                    value = Some(current * 10 + digit);
                    if scale != 0 {
                        scale *= 10;
                    }
                }
                b'.' if scale == 0 => scale = 1,
                b' ' if sign == 0 && value.is_none() && scale == 0 => {}
                _ => return Err(self.malformed("number")),
            }
        }

        let Some(mut value) = value else {
            if sign != 0 || scale != 0 {
                return Err(self.malformed("number"));
            }
            return Ok(FixedPoint::default());
        };
        if scale == 0 {
            scale = 1;
        }
        if sign != 0 {
            value *= sign;
        }
        Ok(FixedPoint::new(value, scale))
    }

    /// Signed integer; `None` when the field is empty or missing.
    pub fn int_field(&mut self) -> Result<Option<i32>, ScanError> {
        match self.next_field()? {
            None | Some("") => Ok(None),
            Some(field) => field
                .trim_start_matches(' ')
                .parse::<i32>()
                .map(Some)
                .map_err(|_| self.malformed("integer")),
        }
    }

    /// Signed integer, 0 when empty.
    pub fn int(&mut self) -> Result<i32, ScanError> {
        self.int_field().map(|value| value.unwrap_or(0))
    }

    /// `hhmmss[.ffffff]`
    pub fn time(&mut self) -> Result<UtcTime, ScanError> {
        let field = match self.next_field()? {
            None | Some("") => return Ok(UtcTime::EMPTY),
            Some(field) => field,
        };

        let [hours, minutes, seconds] = self.six_digits(field, "time")?;
        let microseconds = match field[6..].strip_prefix('.') {
            Some(fraction) => {
                let mut value = 0i32;
                let mut scale = 1_000_000i32;
                for b in fraction.bytes().take_while(u8::is_ascii_digit) {
                    if scale <= 1 {
                        break;
                    }
                    value = value * 10 + i32::from(b - b'0');
                    scale /= 10;
                }
                value * scale
            }
            None => 0,
        };

        Ok(UtcTime {
            hours,
            minutes,
            seconds,
            microseconds,
        })
    }

    /// `ddmmyy`
    pub fn date(&mut self) -> Result<UtcDate, ScanError> {
        let field = match self.next_field()? {
            None | Some("") => return Ok(UtcDate::EMPTY),
            Some(field) => field,
        };

        let [day, month, year] = self.six_digits(field, "date")?;
        Ok(UtcDate { day, month, year })
    }

    /// Split the first six bytes of a field into three two-digit numbers.
    fn six_digits(&self, field: &str, format: &'static str) -> Result<[i32; 3], ScanError> {
        let digits = field.as_bytes();
        if digits.len() < 6 || !digits[..6].iter().all(u8::is_ascii_digit) {
            return Err(self.malformed(format));
        }
        let pair = |i: usize| i32::from(digits[i] - b'0') * 10 + i32::from(digits[i + 1] - b'0');
        Ok([pair(0), pair(2), pair(4)])
    }
}

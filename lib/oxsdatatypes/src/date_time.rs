use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

/// A parsed `(+|-)hh:mm` timezone offset, stored as minutes from UTC.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub struct TimezoneOffset {
    offset_minutes: i16,
}

impl TimezoneOffset {
    pub const UTC: Self = Self { offset_minutes: 0 };

    #[inline]
    pub fn as_minutes(self) -> i16 {
        self.offset_minutes
    }
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset_minutes == 0 {
            return f.write_char('Z');
        }
        let (sign, minutes) = if self.offset_minutes < 0 {
            ('-', -self.offset_minutes)
        } else {
            ('+', self.offset_minutes)
        };
        write!(f, "{sign}{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Days from the civil-calendar epoch (0000-03-01), following Howard Hinnant's well-known
/// `days_from_civil`/`civil_from_days` algorithm (proleptic Gregorian, no year zero adjustment
/// needed because it operates on the astronomical year count XSD also uses).
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64;
    let mp = (i64::from(month) + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, u8, u8) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    (if month <= 2 { y + 1 } else { y }, month, day)
}

/// [XML Schema `dateTime` datatype](https://www.w3.org/TR/xmlschema11-2/#dateTime).
///
/// Stored as whole nanoseconds since the Unix epoch in UTC plus the originally-parsed timezone
/// (if any, kept only for display; equality and ordering compare instants). The `i64` nanosecond
/// range covers roughly the years 1677-2262, sufficient for SPARQL query evaluation.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct DateTime {
    nanos_since_epoch: i64,
    timezone_offset: Option<TimezoneOffset>,
}

impl DateTime {
    #[inline]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self {
            nanos_since_epoch: i64::from_be_bytes(bytes),
            timezone_offset: None,
        }
    }

    #[inline]
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.nanos_since_epoch.to_be_bytes()
    }

    #[inline]
    pub fn year(self) -> i64 {
        self.civil().0
    }

    #[inline]
    pub fn month(self) -> u8 {
        self.civil().1
    }

    #[inline]
    pub fn day(self) -> u8 {
        self.civil().2
    }

    #[inline]
    pub fn hour(self) -> u8 {
        ((self.local_seconds().rem_euclid(SECONDS_PER_DAY)) / 3600) as u8
    }

    #[inline]
    pub fn minute(self) -> u8 {
        ((self.local_seconds().rem_euclid(3600)) / 60) as u8
    }

    #[inline]
    pub fn second(self) -> f64 {
        let whole = (self.local_seconds().rem_euclid(60)) as f64;
        whole + (self.nanos_since_epoch.rem_euclid(NANOS_PER_SECOND) as f64) / 1e9
    }

    #[inline]
    pub fn timezone_offset(self) -> Option<TimezoneOffset> {
        self.timezone_offset
    }

    #[inline]
    pub fn is_identical_with(self, other: Self) -> bool {
        self.nanos_since_epoch == other.nanos_since_epoch
    }

    fn local_seconds(self) -> i64 {
        let offset_seconds = i64::from(self.timezone_offset.map_or(0, |tz| tz.as_minutes())) * 60;
        (self.nanos_since_epoch.div_euclid(NANOS_PER_SECOND)) + offset_seconds
    }

    fn civil(self) -> (i64, u8, u8) {
        civil_from_days(self.local_seconds().div_euclid(SECONDS_PER_DAY))
    }
}

impl PartialOrd for DateTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.nanos_since_epoch.partial_cmp(&other.nanos_since_epoch)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day) = self.civil();
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second() as u64
        )?;
        let fraction = self.nanos_since_epoch.rem_euclid(NANOS_PER_SECOND);
        if fraction != 0 {
            write!(f, ".{fraction:09}")?;
        }
        if let Some(tz) = self.timezone_offset {
            write!(f, "{tz}")?;
        }
        Ok(())
    }
}

impl FromStr for DateTime {
    type Err = XsdDateTimeParseError;

    /// Parses `YYYY-MM-DDThh:mm:ss(\.s+)?(Z|[+-]hh:mm)?`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (date, rest) = input.split_once('T').ok_or(XsdDateTimeParseError)?;
        let (year, month, day) = parse_date_parts(date)?;
        let (time, timezone_offset) = parse_timezone(rest)?;
        let mut parts = time.split(':');
        let hour: u8 = parts.next().ok_or(XsdDateTimeParseError)?.parse().map_err(|_| XsdDateTimeParseError)?;
        let minute: u8 = parts.next().ok_or(XsdDateTimeParseError)?.parse().map_err(|_| XsdDateTimeParseError)?;
        let second: f64 = parts.next().ok_or(XsdDateTimeParseError)?.parse().map_err(|_| XsdDateTimeParseError)?;
        if parts.next().is_some() || hour > 24 || minute > 59 || second >= 61.0 {
            return Err(XsdDateTimeParseError);
        }
        let days = days_from_civil(year, month, day);
        let whole_seconds = days * SECONDS_PER_DAY
            + i64::from(hour) * 3600
            + i64::from(minute) * 60
            + second.trunc() as i64;
        let nanos = (whole_seconds * NANOS_PER_SECOND)
            + (second.fract() * 1e9).round() as i64
            - i64::from(timezone_offset.map_or(0, TimezoneOffset::as_minutes)) * 60 * NANOS_PER_SECOND;
        Ok(Self {
            nanos_since_epoch: nanos,
            timezone_offset,
        })
    }
}

/// [XML Schema `date` datatype](https://www.w3.org/TR/xmlschema11-2/#date).
///
/// Stored as whole days since the Unix epoch.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Date {
    days_since_epoch: i64,
    timezone_offset: Option<TimezoneOffset>,
}

impl Date {
    #[inline]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self {
            days_since_epoch: i64::from_be_bytes(bytes),
            timezone_offset: None,
        }
    }

    #[inline]
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.days_since_epoch.to_be_bytes()
    }

    #[inline]
    pub fn year(self) -> i64 {
        civil_from_days(self.days_since_epoch).0
    }

    #[inline]
    pub fn month(self) -> u8 {
        civil_from_days(self.days_since_epoch).1
    }

    #[inline]
    pub fn day(self) -> u8 {
        civil_from_days(self.days_since_epoch).2
    }

    #[inline]
    pub fn timezone_offset(self) -> Option<TimezoneOffset> {
        self.timezone_offset
    }

    #[inline]
    pub fn is_identical_with(self, other: Self) -> bool {
        self.days_since_epoch == other.days_since_epoch
            && self.timezone_offset.map(TimezoneOffset::as_minutes)
                == other.timezone_offset.map(TimezoneOffset::as_minutes)
    }
}

impl PartialOrd for Date {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.days_since_epoch.partial_cmp(&other.days_since_epoch)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day) = civil_from_days(self.days_since_epoch);
        write!(f, "{year:04}-{month:02}-{day:02}")?;
        if let Some(tz) = self.timezone_offset {
            write!(f, "{tz}")?;
        }
        Ok(())
    }
}

impl FromStr for Date {
    type Err = XsdDateTimeParseError;

    /// Parses `YYYY-MM-DD(Z|[+-]hh:mm)?`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (date, timezone_offset) = parse_timezone(input)?;
        let (year, month, day) = parse_date_parts(date)?;
        Ok(Self {
            days_since_epoch: days_from_civil(year, month, day),
            timezone_offset,
        })
    }
}

fn parse_date_parts(date: &str) -> Result<(i64, u8, u8), XsdDateTimeParseError> {
    let mut parts = date.splitn(3, '-');
    let first = parts.next().ok_or(XsdDateTimeParseError)?;
    // A leading '-' (BCE year) makes the first split segment empty; re-join it onto the year.
    let (year_str, month, day) = if first.is_empty() {
        let year_str = format!("-{}", parts.next().ok_or(XsdDateTimeParseError)?);
        (year_str, parts.next(), parts.next())
    } else {
        (first.to_owned(), parts.next(), parts.next())
    };
    let year = year_str.parse().map_err(|_| XsdDateTimeParseError)?;
    let month = month.ok_or(XsdDateTimeParseError)?.parse().map_err(|_| XsdDateTimeParseError)?;
    let day = day.ok_or(XsdDateTimeParseError)?.parse().map_err(|_| XsdDateTimeParseError)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(XsdDateTimeParseError);
    }
    Ok((year, month, day))
}

fn parse_timezone(input: &str) -> Result<(&str, Option<TimezoneOffset>), XsdDateTimeParseError> {
    if let Some(body) = input.strip_suffix('Z') {
        return Ok((body, Some(TimezoneOffset::UTC)));
    }
    // A trailing `[+-]hh:mm` offset; the date/time portion itself may also start with `-` for a
    // BCE year, so only look for the sign after the first byte.
    if input.len() > 6 {
        let tail = &input[input.len() - 6..];
        if (tail.starts_with('+') || tail.starts_with('-')) && tail.as_bytes()[3] == b':' {
            let sign = if tail.starts_with('-') { -1 } else { 1 };
            let hours: i16 = tail[1..3].parse().map_err(|_| XsdDateTimeParseError)?;
            let minutes: i16 = tail[4..6].parse().map_err(|_| XsdDateTimeParseError)?;
            if hours > 14 || minutes > 59 {
                return Err(XsdDateTimeParseError);
            }
            return Ok((
                &input[..input.len() - 6],
                Some(TimezoneOffset {
                    offset_minutes: sign * (hours * 60 + minutes),
                }),
            ));
        }
    }
    Ok((input, None))
}

/// The lexical form does not match the `dateTime`/`date` grammar.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("invalid dateTime or date lexical form")]
pub struct XsdDateTimeParseError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_round_trip() {
        let dt: DateTime = "2024-03-05T13:30:00Z".parse().unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 5);
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.to_string(), "2024-03-05T13:30:00Z");
    }

    #[test]
    fn date_time_without_timezone() {
        let dt: DateTime = "2000-01-01T00:00:00".parse().unwrap();
        assert_eq!(dt.timezone_offset(), None);
        assert_eq!(dt.to_string(), "2000-01-01T00:00:00");
    }

    #[test]
    fn date_time_ordering() {
        let a: DateTime = "2024-01-01T00:00:00Z".parse().unwrap();
        let b: DateTime = "2024-01-02T00:00:00Z".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn date_round_trip() {
        let d: Date = "2024-03-05".parse().unwrap();
        assert_eq!(d.year(), 2024);
        assert_eq!(d.month(), 3);
        assert_eq!(d.day(), 5);
        assert_eq!(d.to_string(), "2024-03-05");
    }

    #[test]
    fn date_with_offset() {
        let d: Date = "2024-03-05+02:00".parse().unwrap();
        assert_eq!(d.to_string(), "2024-03-05+02:00");
    }

    #[test]
    fn invalid_inputs() {
        assert!("not-a-date".parse::<Date>().is_err());
        assert!("2024-13-01".parse::<Date>().is_err());
        assert!("2024-01-01Tbad".parse::<DateTime>().is_err());
    }
}

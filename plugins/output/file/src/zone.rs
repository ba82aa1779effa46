use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat, TimeZone as _, Utc};

use crate::error::FileOutputError;

/// Time zone used to render event timestamps and slice keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    /// Offset of the host at the rendered instant.
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    /// `timezone` wins over `utc`, which wins over `localtime`.
    pub fn from_config(localtime: bool, utc: bool, timezone: Option<&str>) -> Result<Self, FileOutputError> {
        if let Some(tz) = timezone {
            if tz.eq_ignore_ascii_case("z") || tz.eq_ignore_ascii_case("utc") {
                return Ok(Zone::Utc);
            }
            return parse_offset(tz).map(Zone::Fixed);
        }
        if utc || !localtime {
            return Ok(Zone::Utc);
        }
        Ok(Zone::Local)
    }

    /// ISO-8601 with second precision. `None` when `secs` is out of range.
    ///
    /// UTC renders with a `Z` designator, other zones with a numeric offset.
    pub fn iso8601(&self, secs: i64) -> Option<String> {
        match self {
            Zone::Utc => Some(Utc.timestamp_opt(secs, 0).single()?.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Zone::Local => Some(Local.timestamp_opt(secs, 0).single()?.to_rfc3339_opts(SecondsFormat::Secs, false)),
            Zone::Fixed(offset) => {
                Some(offset.timestamp_opt(secs, 0).single()?.to_rfc3339_opts(SecondsFormat::Secs, false))
            }
        }
    }

    /// Render `secs` with a strftime pattern, e.g. `%Y%m%d` → `20240102`.
    ///
    /// `None` when `secs` is out of range or the pattern is invalid; check
    /// patterns up front with [`is_valid_strftime`].
    pub fn strftime(&self, secs: i64, pattern: &str) -> Option<String> {
        match self {
            Zone::Utc => write_strftime(Utc.timestamp_opt(secs, 0).single()?, pattern),
            Zone::Local => write_strftime(Local.timestamp_opt(secs, 0).single()?, pattern),
            Zone::Fixed(offset) => write_strftime(offset.timestamp_opt(secs, 0).single()?, pattern),
        }
    }
}

pub fn is_valid_strftime(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn write_strftime<Tz>(at: DateTime<Tz>, pattern: &str) -> Option<String>
where
    Tz: chrono::TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", at.format(pattern)).ok()?;
    Some(out)
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `-HHMM`.
fn parse_offset(raw: &str) -> Result<FixedOffset, FileOutputError> {
    let invalid = || FileOutputError::InvalidParameter {
        param: "timezone",
        detail: format!("'{raw}' is not a UTC offset like +09:00"),
    };

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let (hh, mm) = match rest.as_bytes() {
        [_, _, b':', _, _] => (&rest[..2], &rest[3..]),
        [_, _, _, _] => (&rest[..2], &rest[2..]),
        _ => return Err(invalid()),
    };
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = hh.parse().map_err(|_| invalid())?;
    let minutes: i32 = mm.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02T03:04:05Z
    const T: i64 = 1_704_164_645;

    #[test]
    fn utc_uses_z_designator() {
        assert_eq!(Zone::Utc.iso8601(T).unwrap(), "2024-01-02T03:04:05Z");
        assert_eq!(Zone::Utc.iso8601(0).unwrap(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn fixed_offset_is_numeric() {
        let zone = Zone::from_config(true, false, Some("+09:00")).unwrap();
        assert_eq!(zone.iso8601(T).unwrap(), "2024-01-02T12:04:05+09:00");

        let zone = Zone::from_config(true, false, Some("-0530")).unwrap();
        assert_eq!(zone.iso8601(T).unwrap(), "2024-01-01T21:34:05-05:30");
    }

    #[test]
    fn precedence() {
        assert_eq!(Zone::from_config(true, false, None).unwrap(), Zone::Local);
        assert_eq!(Zone::from_config(true, true, None).unwrap(), Zone::Utc);
        assert_eq!(Zone::from_config(false, false, None).unwrap(), Zone::Utc);
        assert!(matches!(Zone::from_config(false, false, Some("+00:00")).unwrap(), Zone::Fixed(_)));
    }

    #[test]
    fn rejects_bad_offsets() {
        for raw in ["09:00", "+9", "+09:60", "+0a:00", "+09:00:00", "", "+0:900", "+:0900", "+0900:", "+09-00", "+a€"] {
            let err = Zone::from_config(true, false, Some(raw)).unwrap_err();
            assert!(
                matches!(err, FileOutputError::InvalidParameter { param: "timezone", .. }),
                "{raw}"
            );
        }
    }

    #[test]
    fn utc_spellings_render_with_z() {
        for raw in ["Z", "z", "UTC", "utc"] {
            let zone = Zone::from_config(true, false, Some(raw)).unwrap();
            assert_eq!(zone, Zone::Utc, "{raw}");
            assert_eq!(zone.iso8601(0).unwrap(), "1970-01-01T00:00:00Z");
        }
    }

    #[test]
    fn out_of_range_timestamp() {
        assert_eq!(Zone::Utc.iso8601(i64::MAX), None);
    }

    #[test]
    fn strftime_slices() {
        assert_eq!(Zone::Utc.strftime(T, "%Y%m%d").unwrap(), "20240102");
        assert_eq!(Zone::Utc.strftime(T, "%Y%m%d%H").unwrap(), "2024010203");

        let tokyo = Zone::from_config(true, false, Some("+09:00")).unwrap();
        assert_eq!(tokyo.strftime(T, "%Y%m%d%H").unwrap(), "2024010212");
    }

    #[test]
    fn strftime_validation() {
        assert!(is_valid_strftime("%Y%m%d"));
        assert!(!is_valid_strftime("%Y%!"));
    }
}

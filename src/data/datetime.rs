// src/data/datetime.rs

//! Functions to transform access-log timestamp strings into chrono
//! [`DateTime`] instances.
//!
//! Each log family writes timestamps differently:
//! - Apache and Tomcat/JBoss use Common Log Format time,
//!   `dd/Mon/yyyy:HH:mm:ss ±HHMM`, e.g. `01/Aug/2014:00:01:33 -0300`
//! - IIS writes separate `date` and `time` fields, `yyyy-MM-dd` and
//!   `HH:mm:ss`, with no offset
//! - the tab-separated format writes `dd/MM/yyyy HH:mm:ss`, with no offset
//!
//! Values without an explicit offset take the run-wide default offset
//! (the `--tz-offset` command-line option).
//!
//! [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html

#![allow(non_camel_case_types)]

#[doc(hidden)]
pub use ::chrono::{
    DateTime,
    Datelike, // adds method `.year()` onto `DateTime`
    Duration,
    FixedOffset,
    Local,
    NaiveDateTime,
    Offset,
    TimeZone,
    Timelike,
    Utc,
};
use ::lazy_static::lazy_static;
use ::regex::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Crate `chrono` [`strftime`] formatting pattern, passed to
/// chrono [`DateTime::parse_from_str`].
///
/// [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html
/// [`DateTime::parse_from_str`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html#method.parse_from_str
pub type DateTimePattern_str = str;

/// A chrono [`DateTime`] type used in _alalib_.
///
/// [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
pub type DateTimeL = DateTime<FixedOffset>;
pub type DateTimeLOpt = Option<DateTimeL>;

/// Month name abbreviations as they appear in Common Log Format times,
/// paired with their numeric replacement.
const MONTH_REPLACEMENTS: [(&str, &str); 12] = [
    ("/Jan/", "/01/"),
    ("/Feb/", "/02/"),
    ("/Mar/", "/03/"),
    ("/Apr/", "/04/"),
    ("/May/", "/05/"),
    ("/Jun/", "/06/"),
    ("/Jul/", "/07/"),
    ("/Aug/", "/08/"),
    ("/Sep/", "/09/"),
    ("/Oct/", "/10/"),
    ("/Nov/", "/11/"),
    ("/Dec/", "/12/"),
];

/// Common Log Format datetime pattern, after month and colon normalization,
/// with a timezone offset.
const DTP_HTTPD_TZ: &DateTimePattern_str = "%d/%m/%Y %H:%M:%S %z";
/// Common Log Format datetime pattern, after month and colon normalization,
/// without a timezone offset.
const DTP_HTTPD: &DateTimePattern_str = "%d/%m/%Y %H:%M:%S";

/// IIS `date` + `time` fields joined with one space.
const DTP_IIS: &DateTimePattern_str = "%Y-%m-%d %H:%M:%S";

/// Datetime patterns accepted for the TIME field of the tab-separated
/// format, tried in order.
const DTP_GENERIC: [&DateTimePattern_str; 3] = [
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

lazy_static! {
    /// Matches the colon separating the day-portion from the time-portion of
    /// a Common Log Format time, e.g. the third colon of
    /// `01/08/2014:00:01:33`.
    static ref HTTPD_DAY_TIME_COLON: Regex =
        Regex::new(r"(\S+):(\d{2}:\d{2}:\d{2})").unwrap();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Replace the month name abbreviation of a Common Log Format time with its
/// numeric form, e.g. `01/Aug/2014:00:01:33` to `01/08/2014:00:01:33`.
///
/// A value with no recognized month abbreviation is returned unchanged.
pub fn month_abbrev_to_numeric(value: &str) -> String {
    for (abbrev, numeric) in MONTH_REPLACEMENTS.iter() {
        if value.contains(abbrev) {
            return value.replace(abbrev, numeric);
        }
    }

    value.to_string()
}

/// Parse a `NaiveDateTime` from `value` using `pattern` then resolve it in
/// timezone `tz_offset`.
fn datetime_parse_naive(
    value: &str,
    pattern: &DateTimePattern_str,
    tz_offset: &FixedOffset,
) -> DateTimeLOpt {
    let ndt: NaiveDateTime = match NaiveDateTime::parse_from_str(value, pattern) {
        Ok(ndt) => ndt,
        Err(_err) => {
            defñ!("NaiveDateTime::parse_from_str({:?}, {:?}) failed: {}", value, pattern, _err);
            return None;
        }
    };

    // a `FixedOffset` maps every local datetime to exactly one instant
    tz_offset.from_local_datetime(&ndt).single()
}

/// Parse an Apache or Tomcat/JBoss `%t` time value,
/// `dd/Mon/yyyy:HH:mm:ss ±HHMM`.
///
/// The month abbreviation is mapped to its numeric month and the colon
/// between the day-portion and the time-portion is replaced with a space
/// before the datetime is handed to chrono.
/// A value without a trailing offset resolves in `tz_offset`.
pub fn datetime_parse_httpd(value: &str, tz_offset: &FixedOffset) -> DateTimeLOpt {
    defn!("({:?})", value);
    let value_: String = month_abbrev_to_numeric(value);
    let value_: String = HTTPD_DAY_TIME_COLON.replace(&value_, "$1 $2").to_string();

    if let Ok(dt) = DateTime::parse_from_str(&value_, DTP_HTTPD_TZ) {
        defx!("return {:?}", dt);
        return Some(dt);
    }
    let dt: DateTimeLOpt = datetime_parse_naive(&value_, DTP_HTTPD, tz_offset);
    defx!("return {:?}", dt);

    dt
}

/// Parse an IIS timestamp from its separate `date` and `time` field values,
/// `yyyy-MM-dd` and `HH:mm:ss`, resolved in `tz_offset`.
pub fn datetime_parse_iis(date: &str, time: &str, tz_offset: &FixedOffset) -> DateTimeLOpt {
    let mut value: String = String::with_capacity(date.len() + time.len() + 1);
    value.push_str(date);
    value.push(' ');
    value.push_str(time);

    datetime_parse_naive(&value, DTP_IIS, tz_offset)
}

/// Parse a TIME field value of the tab-separated format, trying each
/// accepted pattern in order, resolved in `tz_offset`.
pub fn datetime_parse_generic(value: &str, tz_offset: &FixedOffset) -> DateTimeLOpt {
    for pattern in DTP_GENERIC {
        if let Some(dt) = datetime_parse_naive(value, pattern, tz_offset) {
            return Some(dt);
        }
    }
    defñ!("({:?}) matched no pattern", value);

    None
}

/// Truncate seconds and sub-seconds to zero; the start instant of a seeded
/// interval sequence.
pub fn datetime_truncate_to_minute(dt: &DateTimeL) -> DateTimeL {
    match dt.with_second(0).and_then(|dt_| dt_.with_nanosecond(0)) {
        Some(dt_) => dt_,
        // `0` is always in range for both fields
        None => *dt,
    }
}

/// Format a [`DateTimeL`] the way report listings print timestamps.
pub fn datetime_to_string(dt: &DateTimeL) -> String {
    dt.format("%Y-%m-%d %H:%M:%S %z").to_string()
}

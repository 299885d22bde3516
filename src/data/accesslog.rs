// src/data/accesslog.rs

//! Implements an [`AccessLog`] record, one parsed request line.
//!
//! [`AccessLog`]: crate::data::accesslog::AccessLog

use std::fmt;
use std::sync::Arc;

use crate::data::datetime::{datetime_to_string, DateTimeL};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An HTTP status code, e.g. `200`, `404`.
pub type RCode = u16;

/// lowest valid HTTP status code value
pub const RCODE_MIN: RCode = 100;
/// highest valid HTTP status code value
pub const RCODE_MAX: RCode = 599;

/// A response size in bytes.
pub type RSize = u64;

/// A response time magnitude; interpreted via a [`TimeUnit`].
/// Negative means "not set".
pub type RTime = f64;

/// Unit of measure of an [`AccessLog`] response time.
///
/// Fixed at format-compile time by the chosen response-time directive
/// (`%T` is seconds, `%D` is milliseconds, IIS `time-taken` is milliseconds,
/// the tab-separated format declares its unit with a trailing token).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TimeUnit {
    Seconds,
    #[default]
    Milliseconds,
    Microseconds,
}

impl TimeUnit {
    /// Divisor to normalize a response time in this unit to seconds.
    pub const fn divisor(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1_000.0,
            TimeUnit::Microseconds => 1_000_000.0,
        }
    }

    /// Short suffix for report listings.
    pub const fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Seconds => write!(f, "seconds"),
            TimeUnit::Milliseconds => write!(f, "milliseconds"),
            TimeUnit::Microseconds => write!(f, "microseconds"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thread-safe "clone" of an [`AccessLog`]; lets one record sit in a top-K
/// ranking and a 4xx/5xx listing of the same [`ServerSlice`] without
/// copying.
///
/// [`ServerSlice`]: crate::intervals::interval::ServerSlice
pub type AccessLogP = Arc<AccessLog>;

/// One parsed request line of an access log.
///
/// Created by a [`LineExtractor`], immutable afterward, owned by the
/// [`ServerSlice`] of the interval its timestamp falls in.
///
/// [`LineExtractor`]: crate::extractors::LineExtractor
/// [`ServerSlice`]: crate::intervals::interval::ServerSlice
#[derive(Clone, Debug, PartialEq)]
pub struct AccessLog {
    /// requesting or serving host, empty when the format carries no
    /// host-bearing directive
    pub host: String,
    /// request instant, with timezone offset
    pub dt: DateTimeL,
    /// requested URL; for request-line directives this is
    /// `METHOD path?query`
    pub url: String,
    /// HTTP status code, within `[RCODE_MIN, RCODE_MAX]`
    pub rcode: RCode,
    /// response time magnitude in `unit`; negative when not set
    pub rtime: RTime,
    /// response size in bytes; `0` when absent or logged as `-`
    pub rsize: RSize,
    /// unit of measure of `rtime`
    pub unit: TimeUnit,
    /// the IIS log stream carried a restart marker before this record
    /// (parsed, surfaced, not consumed by aggregation)
    pub contains_restart: bool,
    /// the unparsed input line
    pub line: String,
}

impl AccessLog {
    /// Response time normalized to seconds via the record's unit.
    ///
    /// A negative ("not set") response time is returned unchanged so
    /// callers can still recognize it.
    pub fn rtime_in_seconds(&self) -> f64 {
        if self.rtime < 0.0 {
            return self.rtime;
        }

        self.rtime / self.unit.divisor()
    }
}

impl fmt::Display for AccessLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}{}\t{}",
            datetime_to_string(&self.dt),
            self.host,
            self.url,
            self.rcode,
            self.rtime,
            self.unit.suffix(),
            self.rsize,
        )
    }
}

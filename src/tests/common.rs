// src/tests/common.rs

//! Shared fixtures for _alalib_ tests.

use ::lazy_static::lazy_static;

use crate::data::accesslog::{AccessLog, RCode, TimeUnit};
use crate::data::datetime::{DateTimeL, FixedOffset, TimeZone};

lazy_static! {
    /// UTC
    pub static ref FO_Z: FixedOffset = FixedOffset::east_opt(0).unwrap();
    /// timezone offset of the round-trip fixtures, `-0300`
    pub static ref FO_M3: FixedOffset = FixedOffset::west_opt(3 * 3600).unwrap();
    /// an arbitrary eastern offset, `+0200`
    pub static ref FO_P2: FixedOffset = FixedOffset::east_opt(2 * 3600).unwrap();
}

/// build a [`DateTimeL`] from parts in `fo`
pub fn ymdhms(
    fo: &FixedOffset,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> DateTimeL {
    fo.with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
}

/// an [`AccessLog`] with the fields aggregation cares about; the rest are
/// placeholders
pub fn accesslog(dt: DateTimeL, url: &str, rcode: RCode, rtime: f64, unit: TimeUnit) -> AccessLog {
    AccessLog {
        host: String::from("testhost"),
        dt,
        url: String::from(url),
        rcode,
        rtime,
        rsize: 0,
        unit,
        contains_restart: false,
        line: String::new(),
    }
}

// the round-trip fixture of the Tomcat family

pub const TOMCAT_FORMAT_FULL: &str = "%A %b %B %H %m %p %q %r %s %t %U %v %T %I";

pub const TOMCAT_LINE_FULL: &str = "10.7.1.27 1384 1384 HTTP/1.1 GET 80 \
?k1_wJacaF0ChzT3XyPtBDw== GET /seguridad/servlet/msjinhabilitado?k1_wJacaF0ChzT3XyPtBDw== \
HTTP/1.1 200 [01/Aug/2014:00:01:33 -0300] /seguridad/servlet/msjinhabilitado as1.fucacnet \
0.003 TP-Processor47";

// the round-trip fixture of the tab-separated format

pub const GENERIC_FORMAT: &str = "HOST TIME URL RCODE RTIME RSIZE SECOND";

pub const GENERIC_LINE: &str =
    "10.7.5.126\t01/08/2014 03:47:07\t\"GET /lafoto13.jpg\"\t404\t2\t15241";

// src/extractors/iis.rs

//! Implements an [`IisExtractor`] for IIS W3C extended-format logs.
//!
//! IIS is the odd one out: the field list is not configuration, it arrives
//! inside the log file on a `#Fields:` comment line, and may be redeclared
//! at any point in the stream (IIS rewrites the header when the service
//! restarts or the field selection changes). Until the first `#Fields:`
//! line every data line is skipped as format-unknown.
//!
//! A `#Date:` comment marks a logging restart; records after it carry
//! `contains_restart = true`. The flag is surfaced on the record and the
//! extractor but nothing downstream consumes it.
//!
//! [`IisExtractor`]: crate::extractors::iis::IisExtractor

use std::io::{Error, ErrorKind, Result};

use ::regex::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{CaptureIndex, ResultExtract, SkipReason};
use crate::data::accesslog::{AccessLog, RCode, TimeUnit, RCODE_MAX, RCODE_MIN};
use crate::data::datetime::{datetime_parse_iis, DateTimeL, FixedOffset};
use crate::extractors::httpd::capture_str;
use crate::extractors::{
    err_required_field,
    find_index_of,
    parse_response_size,
    FormatSpec,
    LineExtractor,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// IIS comment lines start with this.
pub const IIS_COMMENT_PREFIX: &str = "#";
/// In-band field list declaration, e.g.
/// `#Fields: date time c-ip cs-method cs-uri-stem sc-status time-taken`.
pub const IIS_FIELDS_PREFIX: &str = "#Fields:";
/// Written when logging (re)starts.
pub const IIS_RESTART_PREFIX: &str = "#Date:";

/// field value meaning "none", e.g. an empty query string
const EMPTY_VALUE: &str = "-";

/// A compiled `#Fields:` declaration.
#[derive(Debug)]
struct IisFormat {
    spec: FormatSpec,
    regex: Regex,
    line_format: String,
}

/// Line extractor for IIS logs. Stateful: the compiled format changes when
/// a new `#Fields:` line arrives, and the restart flag latches after a
/// `#Date:` line.
#[derive(Debug)]
pub struct IisExtractor {
    format: Option<IisFormat>,
    tz_offset: FixedOffset,
    contains_restart: bool,
}

impl IisExtractor {
    pub fn new(tz_offset: &FixedOffset) -> IisExtractor {
        IisExtractor {
            format: None,
            tz_offset: *tz_offset,
            contains_restart: false,
        }
    }

    /// Did a restart marker occur earlier in the stream?
    pub fn contains_restart(&self) -> bool {
        self.contains_restart
    }

    /// Compile one `#Fields:` value (the text after the prefix) into a
    /// [`FormatSpec`] and matching pattern.
    ///
    /// A declaration missing a required field is a fatal error; the file
    /// cannot be processed without it.
    fn compile_fields(fields: &str, for_format: &str) -> Result<IisFormat> {
        defn!("({:?})", fields);
        let names: Vec<&str> = fields.split_whitespace().collect();

        let spec: FormatSpec = FormatSpec {
            host: find_index_of(&names, &["c-ip", "cs-host"]),
            date: find_index_of(&names, &["date"]),
            time: find_index_of(&names, &["time"]),
            method: find_index_of(&names, &["cs-method"]),
            url: find_index_of(&names, &["cs-uri-stem"]),
            query: find_index_of(&names, &["cs-uri-query"]),
            rcode: find_index_of(&names, &["sc-status"]),
            rsize: find_index_of(&names, &["sc-bytes"]),
            rtime: find_index_of(&names, &["time-taken"]),
            unit: TimeUnit::Milliseconds,
        };

        if spec.method.is_none() {
            return Err(err_required_field("METHOD", "'cs-method'"));
        }
        if spec.date.is_none() {
            return Err(err_required_field("DATE", "'date'"));
        }
        spec.validate_required("'cs-uri-stem'", "'time'", "'time-taken'", "'sc-status'")?;

        // emit the pattern, one fragment per declared field; capture groups
        // number up in field-declaration order
        let digit_fields: [Option<usize>; 3] = [spec.rcode, spec.rsize, spec.rtime];
        let mut captured_fields: Vec<usize> = [
            spec.host, spec.date, spec.time, spec.method, spec.url, spec.query, spec.rcode,
            spec.rsize, spec.rtime,
        ]
        .iter()
        .flatten()
        .copied()
        .collect();
        captured_fields.sort_unstable();
        captured_fields.dedup();

        let mut pattern: String = String::with_capacity(names.len() * 8);
        for field_index in 0..names.len() {
            if field_index > 0 {
                pattern.push(' ');
            }
            if captured_fields.contains(&field_index) {
                match digit_fields.contains(&Some(field_index)) {
                    true => pattern.push_str(r"(\d+)"),
                    false => pattern.push_str(r"(\S+)"),
                }
            } else {
                pattern.push_str(r"\S+");
            }
        }

        // rewrite the spec from field indexes to capture-group indexes
        let to_group = |field: Option<usize>| -> Option<CaptureIndex> {
            field
                .and_then(|field_| captured_fields.iter().position(|captured| *captured == field_))
                .map(|position| position + 1)
        };
        let spec_remapped: FormatSpec = FormatSpec {
            host: to_group(spec.host),
            date: to_group(spec.date),
            time: to_group(spec.time),
            method: to_group(spec.method),
            url: to_group(spec.url),
            query: to_group(spec.query),
            rcode: to_group(spec.rcode),
            rsize: to_group(spec.rsize),
            rtime: to_group(spec.rtime),
            unit: spec.unit,
        };

        let regex: Regex = Regex::new(&pattern).map_err(|err| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("#Fields: {:?} compiled to an invalid pattern: {}", fields, err),
            )
        })?;
        defx!("pattern {:?}", regex.as_str());

        Ok(IisFormat {
            spec: spec_remapped,
            regex,
            line_format: for_format.to_string(),
        })
    }

    fn extract_data_line(&self, format: &IisFormat, line: &str) -> ResultExtract {
        let captures = match format.regex.captures(line) {
            Some(captures) => captures,
            None => return ResultExtract::Skipped(SkipReason::PatternMismatch),
        };

        let date: &str = match capture_str(&captures, format.spec.date) {
            Some(value) => value,
            None => return ResultExtract::Skipped(SkipReason::BadDateTime),
        };
        let time: &str = match capture_str(&captures, format.spec.time) {
            Some(value) => value,
            None => return ResultExtract::Skipped(SkipReason::BadDateTime),
        };
        let dt: DateTimeL = match datetime_parse_iis(date, time, &self.tz_offset) {
            Some(dt) => dt,
            None => return ResultExtract::Skipped(SkipReason::BadDateTime),
        };

        // URL is METHOD + stem, plus the query string when one was logged
        let method: &str = capture_str(&captures, format.spec.method).unwrap_or("");
        let stem: &str = match capture_str(&captures, format.spec.url) {
            Some(value) => value,
            None => return ResultExtract::Skipped(SkipReason::PatternMismatch),
        };
        let mut url: String = String::with_capacity(method.len() + stem.len() + 2);
        url.push_str(method);
        url.push(' ');
        url.push_str(stem);
        if let Some(query) = capture_str(&captures, format.spec.query) {
            if query != EMPTY_VALUE {
                url.push('?');
                url.push_str(query);
            }
        }

        let rcode: RCode = match capture_str(&captures, format.spec.rcode)
            .and_then(|value| value.parse::<RCode>().ok())
        {
            Some(rcode) if (RCODE_MIN..=RCODE_MAX).contains(&rcode) => rcode,
            _ => return ResultExtract::Skipped(SkipReason::BadStatusCode),
        };
        let rtime: f64 = match capture_str(&captures, format.spec.rtime)
            .and_then(|value| value.parse::<f64>().ok())
        {
            Some(rtime) => rtime,
            None => return ResultExtract::Skipped(SkipReason::BadResponseTime),
        };
        let host: String = capture_str(&captures, format.spec.host)
            .unwrap_or("")
            .to_string();
        let rsize: u64 = capture_str(&captures, format.spec.rsize)
            .map(parse_response_size)
            .unwrap_or(0);

        ResultExtract::Extracted(AccessLog {
            host,
            dt,
            url,
            rcode,
            rtime,
            rsize,
            unit: format.spec.unit,
            contains_restart: self.contains_restart,
            line: line.to_string(),
        })
    }
}

impl LineExtractor for IisExtractor {
    fn extract(&mut self, line: &str) -> Result<ResultExtract> {
        if line.starts_with(IIS_COMMENT_PREFIX) {
            if let Some(fields) = line.strip_prefix(IIS_FIELDS_PREFIX) {
                let fields: &str = fields.trim();
                self.format = Some(IisExtractor::compile_fields(fields, fields)?);
                return Ok(ResultExtract::Directive);
            }
            if line.starts_with(IIS_RESTART_PREFIX) {
                defñ!("restart marker");
                self.contains_restart = true;
            }
            return Ok(ResultExtract::Directive);
        }

        match &self.format {
            Some(format) => Ok(self.extract_data_line(format, line)),
            None => Ok(ResultExtract::Skipped(SkipReason::FormatUnknown)),
        }
    }

    fn time_unit(&self) -> TimeUnit {
        TimeUnit::Milliseconds
    }

    fn line_format(&self) -> &str {
        match &self.format {
            Some(format) => &format.line_format,
            None => "",
        }
    }
}

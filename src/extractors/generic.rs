// src/extractors/generic.rs

//! Implements a [`GenericExtractor`] for the tab-separated named-token
//! format.
//!
//! The format string is a space-separated list of literal tokens naming
//! each column, e.g. `HOST TIME URL RCODE RTIME RSIZE SECOND`. Data lines
//! are the column values joined with tabs. There is no pattern to compile:
//! a token's position in the format is its field's position in the line, so
//! resolution is purely index-based.
//!
//! A trailing `SECOND`, `MILLISECOND`, or `MICROSECOND` token declares the
//! response-time unit and names no column; absent, the unit is
//! milliseconds. `RENDTIME` is accepted as an alias for `RTIME`.
//!
//! [`GenericExtractor`]: crate::extractors::generic::GenericExtractor

use std::io::Result;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{ResultExtract, SkipReason};
use crate::data::accesslog::{AccessLog, RCode, TimeUnit, RCODE_MAX, RCODE_MIN};
use crate::data::datetime::{datetime_parse_generic, DateTimeL, FixedOffset};
use crate::extractors::{parse_response_size, FormatSpec, LineExtractor};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const TOKEN_HOST: &str = "HOST";
pub const TOKEN_TIME: &str = "TIME";
pub const TOKEN_URL: &str = "URL";
pub const TOKEN_RCODE: &str = "RCODE";
pub const TOKEN_RTIME: &str = "RTIME";
/// accepted alias for [`TOKEN_RTIME`]
pub const TOKEN_RENDTIME: &str = "RENDTIME";
pub const TOKEN_RSIZE: &str = "RSIZE";

pub const TOKEN_SECOND: &str = "SECOND";
pub const TOKEN_MILLISECOND: &str = "MILLISECOND";
pub const TOKEN_MICROSECOND: &str = "MICROSECOND";

/// Data lines are split on this.
pub const FIELD_DELIMITER: char = '\t';

/// Line extractor for the tab-separated named-token format.
#[derive(Debug)]
pub struct GenericExtractor {
    /// positions here are `0`-based field indexes, not capture groups
    spec: FormatSpec,
    /// fewest fields a data line must split into
    fields_needed: usize,
    line_format: String,
    tz_offset: FixedOffset,
}

impl GenericExtractor {
    /// Compile the token list. Fails when URL, TIME, RTIME, or RCODE names
    /// no column (configuration error).
    pub fn new(format: &str, tz_offset: &FixedOffset) -> Result<GenericExtractor> {
        defn!("({:?})", format);
        let mut tokens: Vec<&str> = format.split_whitespace().collect();

        let unit: TimeUnit = match tokens.last().copied() {
            Some(TOKEN_SECOND) => {
                tokens.pop();
                TimeUnit::Seconds
            }
            Some(TOKEN_MILLISECOND) => {
                tokens.pop();
                TimeUnit::Milliseconds
            }
            Some(TOKEN_MICROSECOND) => {
                tokens.pop();
                TimeUnit::Microseconds
            }
            _ => TimeUnit::Milliseconds,
        };

        let mut spec: FormatSpec = FormatSpec {
            unit,
            ..FormatSpec::default()
        };
        for (index, token) in tokens.iter().enumerate() {
            match *token {
                TOKEN_HOST => spec.host = Some(index),
                TOKEN_TIME => spec.time = Some(index),
                TOKEN_URL => spec.url = Some(index),
                TOKEN_RCODE => spec.rcode = Some(index),
                TOKEN_RTIME | TOKEN_RENDTIME => spec.rtime = Some(index),
                TOKEN_RSIZE => spec.rsize = Some(index),
                // unrecognized tokens still occupy a column
                _ => {}
            }
        }

        spec.validate_required("URL", "TIME", "RTIME or RENDTIME", "RCODE")?;

        let fields_needed: usize = [spec.host, spec.time, spec.url, spec.rcode, spec.rtime, spec.rsize]
            .iter()
            .flatten()
            .max()
            .map(|max_index| max_index + 1)
            .unwrap_or(0);
        defx!("fields_needed {}", fields_needed);

        Ok(GenericExtractor {
            spec,
            fields_needed,
            line_format: format.to_string(),
            tz_offset: *tz_offset,
        })
    }
}

/// The field value at `index`, when the role named a column and the line
/// has that many fields.
fn field_str<'l>(fields: &[&'l str], index: Option<usize>) -> Option<&'l str> {
    index.and_then(|index_| fields.get(index_)).copied()
}

impl LineExtractor for GenericExtractor {
    fn extract(&mut self, line: &str) -> Result<ResultExtract> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() < self.fields_needed {
            defñ!("{} fields, need {}: {:?}", fields.len(), self.fields_needed, line);
            return Ok(ResultExtract::Skipped(SkipReason::PatternMismatch));
        }

        let dt: DateTimeL = match field_str(&fields, self.spec.time)
            .and_then(|value| datetime_parse_generic(value, &self.tz_offset))
        {
            Some(dt) => dt,
            None => return Ok(ResultExtract::Skipped(SkipReason::BadDateTime)),
        };
        let url: String = match field_str(&fields, self.spec.url) {
            Some(value) => value.to_string(),
            None => return Ok(ResultExtract::Skipped(SkipReason::PatternMismatch)),
        };
        let rcode: RCode = match field_str(&fields, self.spec.rcode)
            .and_then(|value| value.parse::<RCode>().ok())
        {
            Some(rcode) if (RCODE_MIN..=RCODE_MAX).contains(&rcode) => rcode,
            _ => return Ok(ResultExtract::Skipped(SkipReason::BadStatusCode)),
        };
        let rtime: f64 = match field_str(&fields, self.spec.rtime)
            .and_then(|value| value.parse::<f64>().ok())
        {
            Some(rtime) => rtime,
            None => return Ok(ResultExtract::Skipped(SkipReason::BadResponseTime)),
        };
        let host: String = field_str(&fields, self.spec.host)
            .unwrap_or("")
            .to_string();
        let rsize: u64 = field_str(&fields, self.spec.rsize)
            .map(parse_response_size)
            .unwrap_or(0);

        Ok(ResultExtract::Extracted(AccessLog {
            host,
            dt,
            url,
            rcode,
            rtime,
            rsize,
            unit: self.spec.unit,
            contains_restart: false,
            line: line.to_string(),
        }))
    }

    fn time_unit(&self) -> TimeUnit {
        self.spec.unit
    }

    fn line_format(&self) -> &str {
        &self.line_format
    }
}

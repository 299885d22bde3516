// src/extractors/httpd.rs

//! Implements an [`HttpdExtractor`] for the `%x`-directive access-log
//! formats of the Apache and Tomcat/JBoss families.
//!
//! References:
//! - <https://httpd.apache.org/docs/current/mod/mod_log_config.html>
//! - <https://tomcat.apache.org/tomcat-7.0-doc/api/org/apache/catalina/valves/AccessLogValve.html>
//!
//! The format string is tokenized into directives with trailing literal
//! text. Several directives can supply the same field role; a fixed rank
//! table resolves each role to exactly one winning directive, and only
//! winning directives become capture groups (everything else matches as an
//! opaque wildcard so the pattern still aligns). Capture groups are
//! numbered in declaration order of the winners.
//!
//! Rank tables (highest rank present wins; on a repeated directive the
//! first occurrence wins):
//!
//! | role  | directives, rank ascending                      |
//! |-------|-------------------------------------------------|
//! | HOST  | `%A` local IP, `%v` server name, `%h` remote host, `%a` remote IP |
//! | URL   | `%U` path, `%r` request line                    |
//! | RCODE | `%s`, `%>s`                                     |
//! | RTIME | `%T` seconds, `%D` milliseconds                 |
//! | RSIZE | `%b` dash-for-zero bytes, `%B` bytes            |
//!
//! The RTIME winner also fixes the record's [`TimeUnit`].
//!
//! [`HttpdExtractor`]: crate::extractors::httpd::HttpdExtractor
//! [`TimeUnit`]: crate::data::accesslog::TimeUnit

use std::io::{Error, ErrorKind, Result};

use ::regex::{Captures, Regex};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{CaptureIndex, ResultExtract, SkipReason};
use crate::data::accesslog::{AccessLog, RCode, TimeUnit, RCODE_MAX, RCODE_MIN};
use crate::data::datetime::{datetime_parse_httpd, DateTimeL, FixedOffset};
use crate::extractors::{parse_response_size, FormatSpec, LineExtractor};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A field role a directive can supply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Role {
    Host,
    Time,
    Url,
    Rcode,
    Rtime,
    Rsize,
}

const ROLE_COUNT: usize = 6;

impl Role {
    const fn index(self) -> usize {
        match self {
            Role::Host => 0,
            Role::Time => 1,
            Role::Url => 2,
            Role::Rcode => 3,
            Role::Rtime => 4,
            Role::Rsize => 5,
        }
    }
}

/// The role a directive can supply and how strongly it claims it.
fn directive_role(directive: &str) -> Option<(Role, u8)> {
    match directive {
        // A - local IP address
        "%A" => Some((Role::Host, 1)),
        // v - local server name
        "%v" => Some((Role::Host, 2)),
        // h - remote host name (or IP address if resolveHosts is off)
        "%h" => Some((Role::Host, 3)),
        // a - remote IP address
        "%a" => Some((Role::Host, 4)),
        // t - date and time, in Common Log Format
        "%t" => Some((Role::Time, 1)),
        // U - requested URL path
        "%U" => Some((Role::Url, 1)),
        // r - first line of the request (method and request URI)
        "%r" => Some((Role::Url, 2)),
        // s - HTTP status code of the response
        "%s" => Some((Role::Rcode, 1)),
        // >s - status code of the final response, after redirections
        "%>s" => Some((Role::Rcode, 2)),
        // T - time taken to process the request, in seconds
        "%T" => Some((Role::Rtime, 1)),
        // D - time taken to process the request, in milliseconds
        "%D" => Some((Role::Rtime, 2)),
        // b - bytes sent, excluding HTTP headers, or '-' if zero
        "%b" => Some((Role::Rsize, 1)),
        // B - bytes sent, excluding HTTP headers
        "%B" => Some((Role::Rsize, 2)),
        _ => None,
    }
}

/// One `%x` directive and the literal text following it, up to the next
/// directive.
#[derive(Debug, Eq, PartialEq)]
pub(crate) struct FormatElement {
    pub(crate) directive: String,
    pub(crate) literal: String,
}

/// Tokenize a format string into directives with trailing literal text.
///
/// A directive is `%` followed by one character, by `>` and one character,
/// or by a braced name and one character (`%{User-Agent}i`). `%%` inside
/// literal text is an escaped percent sign. Literal text before the first
/// directive is dropped; the compiled pattern is applied unanchored.
pub(crate) fn split_percent_directives(format: &str) -> Vec<FormatElement> {
    let chars: Vec<char> = format.chars().collect();
    let len: usize = chars.len();
    let mut elements: Vec<FormatElement> = Vec::new();

    let mut i: usize = 0;
    while i < len && chars[i] != '%' {
        i += 1;
    }
    while i < len {
        // consume '%'
        i += 1;
        let mut directive: String = String::from("%");
        match chars.get(i) {
            Some('>') => {
                directive.push('>');
                i += 1;
                if let Some(c) = chars.get(i) {
                    directive.push(*c);
                    i += 1;
                }
            }
            Some('{') => {
                while let Some(c) = chars.get(i) {
                    directive.push(*c);
                    i += 1;
                    if *c == '}' {
                        break;
                    }
                }
                if let Some(c) = chars.get(i) {
                    directive.push(*c);
                    i += 1;
                }
            }
            Some(c) => {
                directive.push(*c);
                i += 1;
            }
            None => {}
        }
        let mut literal: String = String::new();
        while i < len {
            if chars[i] == '%' {
                if i + 1 < len && chars[i + 1] == '%' {
                    literal.push('%');
                    i += 2;
                    continue;
                }
                break;
            }
            literal.push(chars[i]);
            i += 1;
        }
        elements.push(FormatElement { directive, literal });
    }

    elements
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Line extractor for the Apache and Tomcat/JBoss `%x`-directive formats.
///
/// The format is compiled once, in [`HttpdExtractor::new`]; extraction then
/// runs one regex match per line.
pub struct HttpdExtractor {
    spec: FormatSpec,
    regex: Regex,
    line_format: String,
    tz_offset: FixedOffset,
}

impl std::fmt::Debug for HttpdExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpdExtractor")
            .field("line_format", &self.line_format)
            .field("pattern", &self.regex.as_str())
            .field("spec", &self.spec)
            .finish()
    }
}

impl HttpdExtractor {
    /// Compile `format` into a [`FormatSpec`] and matching pattern.
    ///
    /// Fails when the format supplies no directive for URL, TIME, RTIME, or
    /// RCODE, or when the assembled pattern does not compile; both are
    /// configuration errors.
    pub fn new(format: &str, tz_offset: &FixedOffset) -> Result<HttpdExtractor> {
        defn!("({:?})", format);
        let elements: Vec<FormatElement> = split_percent_directives(format);

        // resolve each role to its winning element
        let mut winners: [Option<(usize, u8)>; ROLE_COUNT] = [None; ROLE_COUNT];
        for (element_index, element) in elements.iter().enumerate() {
            let (role, rank) = match directive_role(&element.directive) {
                Some(candidate) => candidate,
                None => continue,
            };
            match winners[role.index()] {
                Some((_, held_rank)) if held_rank >= rank => {}
                _ => winners[role.index()] = Some((element_index, rank)),
            }
        }
        let winner_of = |role: Role, element_index: usize| -> bool {
            matches!(winners[role.index()], Some((index, _)) if index == element_index)
        };

        // emit the pattern; only winning elements capture
        let mut spec: FormatSpec = FormatSpec::default();
        let mut group: CaptureIndex = 0;
        let mut pattern: String = String::with_capacity(format.len() * 4);
        for (element_index, element) in elements.iter().enumerate() {
            let directive: &str = element.directive.as_str();
            match directive {
                "%r" if winner_of(Role::Url, element_index) => {
                    group += 1;
                    spec.url = Some(group);
                    pattern.push_str(r"(\S+ \S+) HTTP?/\S+");
                }
                "%r" => pattern.push_str(r"\S+ \S+ HTTP?/\S+"),
                "%t" if winner_of(Role::Time, element_index) => {
                    group += 1;
                    spec.time = Some(group);
                    pattern.push_str(r"\[(\S+ \S+)\]");
                }
                "%t" => pattern.push_str(r"\[\S+ \S+\]"),
                "%s" | "%>s" if winner_of(Role::Rcode, element_index) => {
                    group += 1;
                    spec.rcode = Some(group);
                    pattern.push_str(r"(\d+)");
                }
                "%s" | "%>s" => pattern.push_str(r"\d+"),
                // q - query string, empty unless present (prepended with '?')
                "%q" => pattern.push_str(r".*"),
                _ => match directive_role(directive) {
                    Some((role, _)) if winner_of(role, element_index) => {
                        group += 1;
                        pattern.push_str(r"(\S+)");
                        match role {
                            Role::Host => spec.host = Some(group),
                            // %U, when no %r is present
                            Role::Url => spec.url = Some(group),
                            Role::Rtime => spec.rtime = Some(group),
                            Role::Rsize => spec.rsize = Some(group),
                            // %t, %s, %>s, %r matched earlier arms
                            Role::Time | Role::Rcode => {}
                        }
                    }
                    Some(_) => pattern.push_str(r"\S+"),
                    // `%{name}X` directives log quoted free text
                    None if directive.starts_with("%{") => pattern.push_str(r#"[^"]*"#),
                    // unrecognized directives match as opaque wildcards
                    None => pattern.push_str(r"\S+"),
                },
            }
            pattern.push_str(&::regex::escape(&element.literal));
        }

        // the RTIME winner fixes the unit
        if let Some((element_index, _)) = winners[Role::Rtime.index()] {
            spec.unit = match elements[element_index].directive.as_str() {
                "%T" => TimeUnit::Seconds,
                _ => TimeUnit::Milliseconds,
            };
        }

        spec.validate_required("'%r' or '%U'", "'%t'", "'%D' or '%T'", "'%>s' or '%s'")?;

        let regex: Regex = Regex::new(&pattern).map_err(|err| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("format {:?} compiled to an invalid pattern: {}", format, err),
            )
        })?;
        defx!("pattern {:?}", regex.as_str());

        Ok(HttpdExtractor {
            spec,
            regex,
            line_format: format.to_string(),
            tz_offset: *tz_offset,
        })
    }

    /// The assembled matching pattern (for tests and debugging).
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// The capture-group value at `index`, when the role resolved and the group
/// participated in the match.
pub(crate) fn capture_str<'c>(
    captures: &'c Captures,
    index: Option<CaptureIndex>,
) -> Option<&'c str> {
    index
        .and_then(|index_| captures.get(index_))
        .map(|matched| matched.as_str())
}

impl LineExtractor for HttpdExtractor {
    fn extract(&mut self, line: &str) -> Result<ResultExtract> {
        let captures = match self.regex.captures(line) {
            Some(captures) => captures,
            None => {
                defñ!("no match: {:?}", line);
                return Ok(ResultExtract::Skipped(SkipReason::PatternMismatch));
            }
        };
        let dt: DateTimeL = match capture_str(&captures, self.spec.time) {
            Some(value) => match datetime_parse_httpd(value, &self.tz_offset) {
                Some(dt) => dt,
                None => return Ok(ResultExtract::Skipped(SkipReason::BadDateTime)),
            },
            None => return Ok(ResultExtract::Skipped(SkipReason::BadDateTime)),
        };
        let url: String = match capture_str(&captures, self.spec.url) {
            Some(value) => value.to_string(),
            None => return Ok(ResultExtract::Skipped(SkipReason::PatternMismatch)),
        };
        let rcode: RCode = match capture_str(&captures, self.spec.rcode)
            .and_then(|value| value.parse::<RCode>().ok())
        {
            Some(rcode) if (RCODE_MIN..=RCODE_MAX).contains(&rcode) => rcode,
            _ => return Ok(ResultExtract::Skipped(SkipReason::BadStatusCode)),
        };
        let rtime: f64 = match capture_str(&captures, self.spec.rtime)
            .and_then(|value| value.parse::<f64>().ok())
        {
            Some(rtime) => rtime,
            None => return Ok(ResultExtract::Skipped(SkipReason::BadResponseTime)),
        };
        let host: String = capture_str(&captures, self.spec.host)
            .unwrap_or("")
            .to_string();
        let rsize: u64 = capture_str(&captures, self.spec.rsize)
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

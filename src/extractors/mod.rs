// src/extractors/mod.rs

//! Format compilers and line extractors for _alalib_.
//!
//! ## Overview of extractors
//!
//! * An [`HttpdExtractor`] handles the `%x`-directive formats of the Apache
//!   and Tomcat/JBoss families.
//! * An [`IisExtractor`] handles IIS logs, whose field list arrives in-band
//!   on `#Fields:` header lines.
//! * A [`GenericExtractor`] handles the tab-separated named-token format.
//!
//! Each compiles its format description once, at construction
//! (or, for IIS, whenever a `#Fields:` line arrives), into a [`FormatSpec`]:
//! the mapping from field role to capture position, plus the declared
//! response-time unit. A format that does not provide the URL, TIME,
//! RTIME, and RCODE roles fails compilation; that is a configuration
//! error and aborts the run before any line is processed.
//!
//! Applying a compiled format to one line yields a [`ResultExtract`]:
//! a complete [`AccessLog`], a consumed in-band directive, or a per-line
//! skip that the processing loop logs and steps over.
//!
//! [`HttpdExtractor`]: crate::extractors::httpd::HttpdExtractor
//! [`IisExtractor`]: crate::extractors::iis::IisExtractor
//! [`GenericExtractor`]: crate::extractors::generic::GenericExtractor
//! [`FormatSpec`]: crate::extractors::FormatSpec
//! [`ResultExtract`]: crate::common::ResultExtract
//! [`AccessLog`]: crate::data::accesslog::AccessLog

use std::io::{Error, ErrorKind, Result};
use std::str::FromStr;

use crate::common::{CaptureIndex, ResultExtract};
use crate::data::accesslog::{RSize, TimeUnit};
use crate::data::datetime::FixedOffset;
use crate::extractors::generic::GenericExtractor;
use crate::extractors::httpd::HttpdExtractor;
use crate::extractors::iis::IisExtractor;

pub mod generic;
pub mod httpd;
pub mod iis;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The server family a log file was written by. Selects the format grammar
/// and the extractor implementation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ServerType {
    Apache,
    Tomcat,
    /// JBoss embeds Tomcat; same access-log grammar
    Jboss,
    Iis,
    /// the tab-separated named-token format
    Generic,
}

impl ServerType {
    /// Does this family require a format string from configuration?
    /// IIS declares its field list inside the log file itself.
    pub const fn needs_format(self) -> bool {
        !matches!(self, ServerType::Iis)
    }

    /// An example format string for `--help` text.
    pub const fn example_format(self) -> &'static str {
        match self {
            ServerType::Apache => "%h %l %u %t \"%r\" %>s %b %D",
            ServerType::Tomcat | ServerType::Jboss => "%A %b %B %H %m %p %q %r %s %t %U %v %T %I",
            ServerType::Iis => "(read from the log file's #Fields: header)",
            ServerType::Generic => "HOST TIME URL RCODE RTIME RSIZE MILLISECOND",
        }
    }
}

impl FromStr for ServerType {
    type Err = Error;

    fn from_str(value: &str) -> Result<ServerType> {
        match value.to_lowercase().as_str() {
            "apache" => Ok(ServerType::Apache),
            "tomcat" => Ok(ServerType::Tomcat),
            "jboss" => Ok(ServerType::Jboss),
            "iis" => Ok(ServerType::Iis),
            "generic" | "accesslogformat" => Ok(ServerType::Generic),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "unknown server type {:?}; expected one of apache, tomcat, jboss, iis, generic",
                    value
                ),
            )),
        }
    }
}

impl std::fmt::Display for ServerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerType::Apache => write!(f, "apache"),
            ServerType::Tomcat => write!(f, "tomcat"),
            ServerType::Jboss => write!(f, "jboss"),
            ServerType::Iis => write!(f, "iis"),
            ServerType::Generic => write!(f, "generic"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The compiled mapping from field role to capture position, plus the
/// declared response-time unit.
///
/// For the regex-backed extractors a position is a capture-group index
/// (`1`-based, in declaration order of the winning directives). For the
/// tab-separated format a position is a field index (`0`-based); resolution
/// there is purely index-based, no pattern is compiled.
///
/// Built once per server definition; immutable; read-only shared by every
/// extraction for that server.
#[derive(Clone, Debug, Default)]
pub struct FormatSpec {
    pub host: Option<CaptureIndex>,
    pub time: Option<CaptureIndex>,
    pub url: Option<CaptureIndex>,
    pub rcode: Option<CaptureIndex>,
    pub rtime: Option<CaptureIndex>,
    pub rsize: Option<CaptureIndex>,
    /// IIS-only: separate date field
    pub date: Option<CaptureIndex>,
    /// IIS-only: request method field, prepended to the URL
    pub method: Option<CaptureIndex>,
    /// IIS-only: query-string field, appended to the URL
    pub query: Option<CaptureIndex>,
    pub unit: TimeUnit,
}

impl FormatSpec {
    /// Fail compilation when a role every record needs is not present.
    ///
    /// The `*_directives` arguments name, per family, the directives that
    /// could have supplied the role; they only feed the error message.
    pub(crate) fn validate_required(
        &self,
        url_directives: &str,
        time_directives: &str,
        rtime_directives: &str,
        rcode_directives: &str,
    ) -> Result<()> {
        if self.url.is_none() {
            return Err(err_required_field("URL", url_directives));
        }
        if self.time.is_none() {
            return Err(err_required_field("TIME", time_directives));
        }
        if self.rtime.is_none() {
            return Err(err_required_field("RESPONSE TIME", rtime_directives));
        }
        if self.rcode.is_none() {
            return Err(err_required_field("RESPONSE CODE", rcode_directives));
        }

        Ok(())
    }
}

pub(crate) fn err_required_field(role: &str, directives: &str) -> Error {
    Error::new(
        ErrorKind::InvalidInput,
        format!("required field missing: {} (expected {})", role, directives),
    )
}

/// Size values log `-` for "none"; anything unparsable also counts as zero
/// bytes.
pub(crate) fn parse_response_size(value: &str) -> RSize {
    if value == "-" {
        return 0;
    }

    value.parse::<RSize>().unwrap_or(0)
}

/// First candidate found in `elements` wins; earlier candidates take
/// priority over later ones.
pub(crate) fn find_index_of(elements: &[&str], candidates: &[&str]) -> Option<usize> {
    for candidate in candidates.iter() {
        if let Some(position) = elements.iter().position(|element| element == candidate) {
            return Some(position);
        }
    }

    None
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One extractor per logical server, chosen by [`ServerType`].
///
/// `extract` is fallible two ways: a per-line problem is a
/// [`ResultExtract::Skipped`] (recoverable, the caller continues with the
/// next line); an `Err` is fatal to the run (only the IIS extractor can
/// produce one, from a malformed in-band `#Fields:` header).
pub trait LineExtractor {
    /// Apply the compiled format to one input line.
    fn extract(&mut self, line: &str) -> Result<ResultExtract>;

    /// The response-time unit fixed by the compiled format.
    fn time_unit(&self) -> TimeUnit;

    /// The format description this extractor was compiled from.
    /// Empty for an IIS extractor that has not yet seen a `#Fields:` line.
    fn line_format(&self) -> &str;
}

/// Construct the extractor for one server definition.
///
/// Compilation of `format` happens here; a format missing a required role
/// returns the error immediately (fail-fast, before any line is processed).
pub fn new_line_extractor(
    server_type: ServerType,
    format: &str,
    tz_offset: &FixedOffset,
) -> Result<Box<dyn LineExtractor>> {
    match server_type {
        ServerType::Apache | ServerType::Tomcat | ServerType::Jboss => {
            Ok(Box::new(HttpdExtractor::new(format, tz_offset)?))
        }
        ServerType::Iis => Ok(Box::new(IisExtractor::new(tz_offset))),
        ServerType::Generic => Ok(Box::new(GenericExtractor::new(format, tz_offset)?)),
    }
}

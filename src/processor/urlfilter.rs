// src/processor/urlfilter.rs

//! Implements the [`UrlFilter`] include/exclude rules and the
//! [`RecordFilter`] predicate built on them.
//!
//! Rules load from a plain-text file, one rule per line:
//!
//! ```text
//! ONLY:/shop/
//! DISCARD:/shop/healthcheck
//! ```
//!
//! A URL (query string stripped) passes when it substring-matches at least
//! one `ONLY:` rule (or no `ONLY:` rules exist) and matches no `DISCARD:`
//! rule. Any other line prefix in the file is a configuration error.
//!
//! [`UrlFilter`]: crate::processor::urlfilter::UrlFilter
//! [`RecordFilter`]: crate::processor::urlfilter::RecordFilter

use std::fmt;
use std::io::{BufRead, BufReader, Error, ErrorKind, Result};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{FPath, File, Path};
use crate::data::accesslog::AccessLog;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// prefix of an include rule
pub const ONLY_PREFIX: &str = "ONLY:";
/// prefix of an exclude rule
pub const DISCARD_PREFIX: &str = "DISCARD:";

/// URL suffixes treated as static resources, compared case-insensitively.
pub const STATIC_RESOURCE_SUFFIXES: [&str; 5] = [".jpg", ".png", ".css", ".js", ".gif"];

/// Why a successfully parsed record was discarded before aggregation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiscardReason {
    StaticResource,
    FilterRule,
    Redirect3xx,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::StaticResource => write!(f, "static resource filtered"),
            DiscardReason::FilterRule => write!(f, "URL filtered"),
            DiscardReason::Redirect3xx => write!(f, "URL filtered by 3xx"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Substring include/exclude rules over request URLs.
#[derive(Debug, Default)]
pub struct UrlFilter {
    only: Vec<String>,
    discard: Vec<String>,
}

impl UrlFilter {
    /// An empty filter; every URL passes.
    pub fn new() -> UrlFilter {
        UrlFilter::default()
    }

    /// Load rules from `path`. A missing file or a line with an unknown
    /// prefix is a configuration error.
    pub fn from_file(path: &FPath) -> Result<UrlFilter> {
        defn!("({:?})", path);
        if !Path::new(path).is_file() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("filter file does not exist: {}", path),
            ));
        }

        let mut filter: UrlFilter = UrlFilter::new();
        let reader: BufReader<File> = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line: String = line?;
            if line.is_empty() {
                continue;
            }
            if let Some(rule) = line.strip_prefix(ONLY_PREFIX) {
                filter.only.push(rule.trim().to_string());
            } else if let Some(rule) = line.strip_prefix(DISCARD_PREFIX) {
                filter.discard.push(rule.trim().to_string());
            } else {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!(
                        "malformed filter file {}: every rule must start with {:?} or {:?}",
                        path, ONLY_PREFIX, DISCARD_PREFIX
                    ),
                ));
            }
        }
        defx!("{} only rules, {} discard rules", filter.only.len(), filter.discard.len());

        Ok(filter)
    }

    /// The URL with its query string removed, for rule matching.
    pub fn strip_query(url: &str) -> &str {
        match url.find('?') {
            Some(index) => &url[..index],
            None => url,
        }
    }

    /// Case-insensitive suffix check against
    /// [`STATIC_RESOURCE_SUFFIXES`].
    pub fn is_static_resource(url: &str) -> bool {
        let url_lower: String = url.to_lowercase();

        STATIC_RESOURCE_SUFFIXES
            .iter()
            .any(|suffix| url_lower.ends_with(suffix))
    }

    /// Returns `true` when the URL is discarded by the loaded rules:
    /// it matches no `ONLY:` rule (when any exist), or it matches some
    /// `DISCARD:` rule.
    pub fn discard_by_rules(&self, url: &str) -> bool {
        let url: &str = UrlFilter::strip_query(url);

        let passes_only: bool =
            self.only.is_empty() || self.only.iter().any(|rule| url.contains(rule.as_str()));

        !passes_only || self.discard.iter().any(|rule| url.contains(rule.as_str()))
    }

    pub fn rule_count(&self) -> usize {
        self.only.len() + self.discard.len()
    }

    pub fn only_rules(&self) -> &[String] {
        &self.only
    }

    pub fn discard_rules(&self) -> &[String] {
        &self.discard
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The record-level discard predicate the processing loop consults between
/// extraction and aggregation.
#[derive(Debug, Default)]
pub struct RecordFilter {
    pub url_filter: UrlFilter,
    /// discard URLs ending in a static-resource suffix
    pub filter_static_resources: bool,
    /// discard records with a 3xx status code
    pub discard_redirects: bool,
}

impl RecordFilter {
    /// The reason to drop `accesslog`, or `None` to aggregate it.
    pub fn discard(&self, accesslog: &AccessLog) -> Option<DiscardReason> {
        if self.filter_static_resources && UrlFilter::is_static_resource(&accesslog.url) {
            return Some(DiscardReason::StaticResource);
        }
        if self.url_filter.discard_by_rules(&accesslog.url) {
            return Some(DiscardReason::FilterRule);
        }
        if self.discard_redirects && (300..400).contains(&accesslog.rcode) {
            return Some(DiscardReason::Redirect3xx);
        }

        None
    }
}

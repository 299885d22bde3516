// src/tests/urlfilter_tests.rs

//! tests for `urlfilter.rs`

use std::io::Write;

use crate::data::accesslog::{AccessLog, TimeUnit};
use crate::processor::urlfilter::{DiscardReason, RecordFilter, UrlFilter};
use crate::tests::common::{accesslog, ymdhms, FO_Z};

use ::tempfile::NamedTempFile;
use ::test_case::test_case;

fn record(url: &str, rcode: u16) -> AccessLog {
    accesslog(ymdhms(&FO_Z, 2014, 8, 1, 0, 0, 0), url, rcode, 1.0, TimeUnit::Seconds)
}

fn filter_file(content: &str) -> NamedTempFile {
    let mut file: NamedTempFile = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();

    file
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// static resources

#[test_case("GET /lafoto13.jpg", true)]
#[test_case("GET /LAFOTO13.JPG", true; "case insensitive")]
#[test_case("GET /styles/site.css", true)]
#[test_case("GET /app.js", true)]
#[test_case("GET /spinner.gif", true)]
#[test_case("GET /logo.png", true)]
#[test_case("GET /index.html", false)]
#[test_case("GET /lafoto13.jpg?v=2", false; "query suffix defeats the check")]
fn test_is_static_resource(url: &str, expect: bool) {
    assert_eq!(UrlFilter::is_static_resource(url), expect);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// query stripping and rules

#[test_case("GET /a/b?k=1", "GET /a/b")]
#[test_case("GET /a/b", "GET /a/b")]
#[test_case("?leading", "")]
fn test_strip_query(url: &str, expect: &str) {
    assert_eq!(UrlFilter::strip_query(url), expect);
}

#[test]
fn test_empty_filter_passes_everything() {
    let filter: UrlFilter = UrlFilter::new();
    assert!(!filter.discard_by_rules("GET /anything"));
}

#[test]
fn test_only_rules() {
    let file = filter_file("ONLY:/shop/\n");
    let filter: UrlFilter = UrlFilter::from_file(&file.path().display().to_string()).unwrap();

    assert!(!filter.discard_by_rules("GET /shop/cart"));
    assert!(filter.discard_by_rules("GET /admin/panel"));
}

#[test]
fn test_discard_rules() {
    let file = filter_file("DISCARD:/healthcheck\n");
    let filter: UrlFilter = UrlFilter::from_file(&file.path().display().to_string()).unwrap();

    assert!(filter.discard_by_rules("GET /shop/healthcheck"));
    assert!(!filter.discard_by_rules("GET /shop/cart"));
}

#[test]
fn test_discard_beats_only() {
    let file = filter_file("ONLY:/shop/\nDISCARD:/shop/internal\n");
    let filter: UrlFilter = UrlFilter::from_file(&file.path().display().to_string()).unwrap();

    assert!(!filter.discard_by_rules("GET /shop/cart"));
    assert!(filter.discard_by_rules("GET /shop/internal/stock"));
    assert_eq!(filter.rule_count(), 2);
}

#[test]
fn test_rules_match_before_the_query_only() {
    let file = filter_file("DISCARD:k=1\n");
    let filter: UrlFilter = UrlFilter::from_file(&file.path().display().to_string()).unwrap();

    // the rule text only appears inside the query string
    assert!(!filter.discard_by_rules("GET /a/b?k=1"));
}

#[test]
fn test_malformed_rule_file_is_fatal() {
    let file = filter_file("ONLY:/shop/\nBOGUS:/x\n");
    let err = UrlFilter::from_file(&file.path().display().to_string()).unwrap_err();
    assert!(err.to_string().contains("ONLY:"));
}

#[test]
fn test_missing_rule_file_is_fatal() {
    assert!(UrlFilter::from_file(&String::from("/no/such/filter/file")).is_err());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// the record predicate

#[test]
fn test_record_filter_static() {
    let filter: RecordFilter = RecordFilter {
        url_filter: UrlFilter::new(),
        filter_static_resources: true,
        discard_redirects: false,
    };

    assert_eq!(
        filter.discard(&record("GET /x.png", 200)),
        Some(DiscardReason::StaticResource)
    );
    assert_eq!(filter.discard(&record("GET /x.html", 200)), None);
}

#[test]
fn test_record_filter_static_off_by_default() {
    let filter: RecordFilter = RecordFilter::default();
    assert_eq!(filter.discard(&record("GET /x.png", 200)), None);
}

#[test]
fn test_record_filter_redirects() {
    let filter: RecordFilter = RecordFilter {
        url_filter: UrlFilter::new(),
        filter_static_resources: false,
        discard_redirects: true,
    };

    assert_eq!(
        filter.discard(&record("GET /moved", 302)),
        Some(DiscardReason::Redirect3xx)
    );
    assert_eq!(filter.discard(&record("GET /ok", 200)), None);
    assert_eq!(filter.discard(&record("GET /missing", 404)), None);
}

#[test]
fn test_record_filter_rules() {
    let file = filter_file("DISCARD:/internal\n");
    let filter: RecordFilter = RecordFilter {
        url_filter: UrlFilter::from_file(&file.path().display().to_string()).unwrap(),
        filter_static_resources: false,
        discard_redirects: false,
    };

    assert_eq!(
        filter.discard(&record("GET /internal/metrics", 200)),
        Some(DiscardReason::FilterRule)
    );
}

// src/tests/iis_tests.rs

//! tests for `iis.rs`, the IIS W3C extended-format extractor

use crate::common::{ResultExtract, SkipReason};
use crate::data::accesslog::{AccessLog, TimeUnit};
use crate::extractors::iis::IisExtractor;
use crate::extractors::LineExtractor;
use crate::tests::common::{ymdhms, FO_Z};

const FIELDS_FULL: &str = "#Fields: date time s-ip cs-method cs-uri-stem cs-uri-query s-port \
cs-username c-ip cs(User-Agent) sc-status sc-substatus sc-win32-status sc-bytes time-taken";

const DATA_FULL: &str = "2014-12-23 01:29:21 10.1.1.5 GET /foo/bar.aspx k=1 80 - 10.2.3.4 \
Mozilla/5.0 200 0 0 5120 187";

fn extract_ok(extractor: &mut IisExtractor, line: &str) -> AccessLog {
    match extractor.extract(line).unwrap() {
        ResultExtract::Extracted(accesslog) => accesslog,
        other => panic!("expected Extracted, got {}", other),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_data_line_before_fields_is_skipped() {
    let mut extractor = IisExtractor::new(&FO_Z);
    match extractor.extract(DATA_FULL).unwrap() {
        ResultExtract::Skipped(SkipReason::FormatUnknown) => {}
        other => panic!("expected Skipped(FormatUnknown), got {}", other),
    }
}

#[test]
fn test_fields_header_then_data() {
    let mut extractor = IisExtractor::new(&FO_Z);
    assert!(matches!(
        extractor.extract(FIELDS_FULL).unwrap(),
        ResultExtract::Directive
    ));
    let accesslog: AccessLog = extract_ok(&mut extractor, DATA_FULL);

    assert_eq!(accesslog.host, "10.2.3.4", "HOST is c-ip");
    assert_eq!(accesslog.url, "GET /foo/bar.aspx?k=1", "URL");
    assert_eq!(accesslog.rcode, 200, "RCODE");
    assert_eq!(accesslog.rsize, 5120, "RSIZE");
    assert_eq!(accesslog.rtime, 187.0, "RTIME");
    assert_eq!(accesslog.unit, TimeUnit::Milliseconds, "unit");
    assert_eq!(accesslog.dt, ymdhms(&FO_Z, 2014, 12, 23, 1, 29, 21), "TIME");
    assert!(!accesslog.contains_restart);
}

#[test]
fn test_dash_query_is_omitted_from_url() {
    let mut extractor = IisExtractor::new(&FO_Z);
    extractor.extract(FIELDS_FULL).unwrap();
    let line: &str = "2014-12-23 01:29:22 10.1.1.5 GET /plain.aspx - 80 - 10.2.3.4 \
Mozilla/5.0 200 0 0 100 3";
    let accesslog: AccessLog = extract_ok(&mut extractor, line);
    assert_eq!(accesslog.url, "GET /plain.aspx");
}

#[test]
fn test_restart_marker_latches() {
    let mut extractor = IisExtractor::new(&FO_Z);
    extractor.extract(FIELDS_FULL).unwrap();
    let first: AccessLog = extract_ok(&mut extractor, DATA_FULL);
    assert!(!first.contains_restart);
    assert!(!extractor.contains_restart());

    assert!(matches!(
        extractor.extract("#Date: 2014-12-23 02:00:00").unwrap(),
        ResultExtract::Directive
    ));
    assert!(extractor.contains_restart());

    let second: AccessLog = extract_ok(&mut extractor, DATA_FULL);
    assert!(second.contains_restart);
}

#[test]
fn test_other_comments_are_directives() {
    let mut extractor = IisExtractor::new(&FO_Z);
    assert!(matches!(
        extractor.extract("#Software: Microsoft Internet Information Services 7.5").unwrap(),
        ResultExtract::Directive
    ));
    assert!(matches!(
        extractor.extract("#Version: 1.0").unwrap(),
        ResultExtract::Directive
    ));
}

#[test]
fn test_fields_redeclaration_mid_stream() {
    let mut extractor = IisExtractor::new(&FO_Z);
    extractor.extract(FIELDS_FULL).unwrap();
    extract_ok(&mut extractor, DATA_FULL);

    // the format may change part-way through the stream
    extractor
        .extract("#Fields: date time cs-method cs-uri-stem sc-status time-taken")
        .unwrap();
    let accesslog: AccessLog =
        extract_ok(&mut extractor, "2014-12-23 03:00:00 POST /short.aspx 503 2500");
    assert_eq!(accesslog.url, "POST /short.aspx");
    assert_eq!(accesslog.rcode, 503);
    assert_eq!(accesslog.rtime, 2500.0);
    // the narrower field list names no host column
    assert_eq!(accesslog.host, "");
    assert_eq!(accesslog.rsize, 0);
}

#[test]
fn test_fields_missing_required_is_fatal() {
    let mut extractor = IisExtractor::new(&FO_Z);
    // no time-taken column
    let err = extractor
        .extract("#Fields: date time cs-method cs-uri-stem sc-status")
        .unwrap_err();
    assert!(err.to_string().contains("RESPONSE TIME"));
}

#[test]
fn test_mismatching_data_line_is_skipped() {
    let mut extractor = IisExtractor::new(&FO_Z);
    extractor.extract(FIELDS_FULL).unwrap();
    match extractor.extract("definitely not enough fields").unwrap() {
        ResultExtract::Skipped(SkipReason::PatternMismatch) => {}
        other => panic!("expected Skipped(PatternMismatch), got {}", other),
    }
}

#[test]
fn test_line_format_follows_declaration() {
    let mut extractor = IisExtractor::new(&FO_Z);
    assert_eq!(extractor.line_format(), "");
    extractor.extract(FIELDS_FULL).unwrap();
    assert!(extractor.line_format().contains("cs-uri-stem"));
}

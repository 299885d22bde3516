// src/tests/generic_tests.rs

//! tests for `generic.rs`, the tab-separated named-token extractor

use crate::common::{ResultExtract, SkipReason};
use crate::data::accesslog::{AccessLog, TimeUnit};
use crate::extractors::generic::GenericExtractor;
use crate::extractors::LineExtractor;
use crate::tests::common::{ymdhms, FO_Z, GENERIC_FORMAT, GENERIC_LINE};

use ::test_case::test_case;

fn new_extractor(format: &str) -> GenericExtractor {
    GenericExtractor::new(format, &FO_Z).unwrap()
}

fn extract_ok(extractor: &mut GenericExtractor, line: &str) -> AccessLog {
    match extractor.extract(line).unwrap() {
        ResultExtract::Extracted(accesslog) => accesslog,
        other => panic!("expected Extracted, got {}", other),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_round_trip() {
    let mut extractor = new_extractor(GENERIC_FORMAT);
    let accesslog: AccessLog = extract_ok(&mut extractor, GENERIC_LINE);

    assert_eq!(accesslog.host, "10.7.5.126", "HOST");
    assert_eq!(accesslog.rcode, 404, "RCODE");
    assert_eq!(accesslog.rsize, 15241, "RSIZE");
    assert_eq!(accesslog.rtime, 2.0, "RTIME");
    assert_eq!(accesslog.unit, TimeUnit::Seconds, "unit");
    assert_eq!(accesslog.url, "\"GET /lafoto13.jpg\"", "URL");
    assert_eq!(accesslog.dt, ymdhms(&FO_Z, 2014, 8, 1, 3, 47, 7), "TIME");
}

#[test_case("HOST TIME URL RCODE RTIME RSIZE SECOND", TimeUnit::Seconds)]
#[test_case("HOST TIME URL RCODE RTIME RSIZE MILLISECOND", TimeUnit::Milliseconds)]
#[test_case("HOST TIME URL RCODE RTIME RSIZE MICROSECOND", TimeUnit::Microseconds)]
#[test_case("HOST TIME URL RCODE RTIME RSIZE", TimeUnit::Milliseconds; "default unit")]
fn test_unit_token(format: &str, expect: TimeUnit) {
    let extractor = new_extractor(format);
    assert_eq!(extractor.time_unit(), expect);
}

#[test]
fn test_rendtime_is_an_rtime_alias() {
    let mut extractor = new_extractor("HOST TIME URL RCODE RENDTIME RSIZE SECOND");
    let accesslog: AccessLog = extract_ok(&mut extractor, GENERIC_LINE);
    assert_eq!(accesslog.rtime, 2.0);
}

#[test]
fn test_token_order_is_free() {
    let mut extractor = new_extractor("RCODE URL TIME RTIME MILLISECOND");
    let accesslog: AccessLog =
        extract_ok(&mut extractor, "404\t/a/b\t01/08/2014 03:47:07\t1500");

    assert_eq!(accesslog.rcode, 404);
    assert_eq!(accesslog.url, "/a/b");
    assert_eq!(accesslog.rtime, 1500.0);
    // no HOST and no RSIZE token: defaults
    assert_eq!(accesslog.host, "");
    assert_eq!(accesslog.rsize, 0);
}

#[test]
fn test_unknown_token_occupies_a_column() {
    let mut extractor = new_extractor("HOST SESSION TIME URL RCODE RTIME SECOND");
    let accesslog: AccessLog = extract_ok(
        &mut extractor,
        "10.0.0.1\tabc123\t01/08/2014 03:47:07\t/x\t200\t1",
    );
    assert_eq!(accesslog.host, "10.0.0.1");
    assert_eq!(accesslog.url, "/x");
}

#[test]
fn test_rsize_dash_is_zero() {
    let mut extractor = new_extractor(GENERIC_FORMAT);
    let accesslog: AccessLog = extract_ok(
        &mut extractor,
        "10.7.5.126\t01/08/2014 03:47:07\t/x\t404\t2\t-",
    );
    assert_eq!(accesslog.rsize, 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// configuration errors

#[test_case("HOST TIME URL RCODE RSIZE", "RESPONSE TIME")]
#[test_case("HOST TIME URL RTIME RSIZE", "RESPONSE CODE")]
#[test_case("HOST TIME RCODE RTIME RSIZE", "URL")]
#[test_case("HOST URL RCODE RTIME RSIZE", "TIME")]
fn test_required_token_missing(format: &str, role: &str) {
    let err = GenericExtractor::new(format, &FO_Z).unwrap_err();
    assert!(
        err.to_string().contains(role),
        "error {:?} does not name {:?}",
        err.to_string(),
        role
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// per-line failures

#[test]
fn test_too_few_fields_is_skipped() {
    let mut extractor = new_extractor(GENERIC_FORMAT);
    match extractor.extract("10.7.5.126\t01/08/2014 03:47:07").unwrap() {
        ResultExtract::Skipped(SkipReason::PatternMismatch) => {}
        other => panic!("expected Skipped(PatternMismatch), got {}", other),
    }
}

#[test]
fn test_bad_timestamp_is_skipped() {
    let mut extractor = new_extractor(GENERIC_FORMAT);
    match extractor
        .extract("10.7.5.126\tnot a time\t/x\t404\t2\t15241")
        .unwrap()
    {
        ResultExtract::Skipped(SkipReason::BadDateTime) => {}
        other => panic!("expected Skipped(BadDateTime), got {}", other),
    }
}

#[test]
fn test_bad_status_code_is_skipped() {
    let mut extractor = new_extractor(GENERIC_FORMAT);
    match extractor
        .extract("10.7.5.126\t01/08/2014 03:47:07\t/x\t6xx\t2\t15241")
        .unwrap()
    {
        ResultExtract::Skipped(SkipReason::BadStatusCode) => {}
        other => panic!("expected Skipped(BadStatusCode), got {}", other),
    }
}

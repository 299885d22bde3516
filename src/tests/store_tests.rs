// src/tests/store_tests.rs

//! tests for `store.rs`: seeding, forward and backward extension, and the
//! contiguity invariant

use crate::data::accesslog::TimeUnit;
use crate::data::datetime::{DateTimeL, Duration};
use crate::intervals::interval::{IntervalSize, TopSize};
use crate::intervals::store::IntervalStore;
use crate::tests::common::{accesslog, ymdhms, FO_Z};

fn new_store(size: IntervalSize) -> IntervalStore {
    IntervalStore::new(
        size,
        TopSize::Top5,
        vec![String::from("server1")],
        true,
        false,
    )
}

fn add_at(store: &mut IntervalStore, dt: DateTimeL) {
    store
        .add(0, accesslog(dt, "/x", 200, 1.0, TimeUnit::Seconds))
        .unwrap();
}

/// every adjacent pair must join exactly, every bucket must have the
/// configured width
fn assert_contiguous(store: &IntervalStore, size: IntervalSize) {
    for interval in store.intervals().iter() {
        assert_eq!(
            *interval.end() - *interval.start(),
            Duration::minutes(size.minutes() as i64),
            "bucket width"
        );
    }
    for pair in store.intervals().windows(2) {
        assert_eq!(*pair[0].end(), *pair[1].start(), "buckets must join exactly");
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_seed_aligns_to_minute() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 33));

    assert_eq!(store.len(), 1);
    assert_eq!(*store.intervals()[0].start(), ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 0));
    assert_eq!(*store.intervals()[0].end(), ymdhms(&FO_Z, 2014, 8, 1, 1, 12, 0));
    assert_eq!(store.intervals()[0].server(0).total_count(), 1);
}

#[test]
fn test_same_bucket_reused() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 33));
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 11, 59));

    assert_eq!(store.len(), 1);
    assert_eq!(store.intervals()[0].server(0).total_count(), 2);
}

#[test]
fn test_forward_extension() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 0));
    // 13 minutes past the last end: two new buckets
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 25, 0));

    assert_eq!(store.len(), 3);
    assert_contiguous(&store, IntervalSize::Minutes10);
    assert_eq!(store.intervals()[2].server(0).total_count(), 1);
    // the bucket in between is interior and empty
    assert!(store.intervals()[1].is_empty());
}

#[test]
fn test_forward_extension_exactly_at_end() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 0));
    // the end instant is exclusive: this needs a second bucket
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 12, 0));

    assert_eq!(store.len(), 2);
    assert_contiguous(&store, IntervalSize::Minutes10);
    assert_eq!(store.intervals()[1].server(0).total_count(), 1);
}

#[test]
fn test_backward_extension_lands_in_new_first_bucket() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 0));
    // 17 minutes of gap at width 10: ceil gives exactly 2 new buckets
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 0, 45, 0));

    assert_eq!(store.len(), 3);
    assert_contiguous(&store, IntervalSize::Minutes10);
    assert_eq!(*store.intervals()[0].start(), ymdhms(&FO_Z, 2014, 8, 1, 0, 42, 0));
    // the older record landed in the new bucket 0
    assert_eq!(store.intervals()[0].server(0).total_count(), 1);
}

#[test]
fn test_backward_extension_whole_gap() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 0, 0));
    // exactly two widths earlier
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 0, 40, 0));

    assert_eq!(store.len(), 3);
    assert_contiguous(&store, IntervalSize::Minutes10);
    assert_eq!(*store.intervals()[0].start(), ymdhms(&FO_Z, 2014, 8, 1, 0, 40, 0));
    assert_eq!(store.intervals()[0].server(0).total_count(), 1);
}

#[test]
fn test_out_of_order_arrivals_stay_contiguous() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes5);
    // a fixed shuffle of minutes across two hours
    for minute_offset in [67, 3, 119, 45, 0, 90, 22, 110, 5, 58, 33, 101, 14, 76] {
        add_at(
            &mut store,
            ymdhms(&FO_Z, 2014, 8, 1, 0, 0, 0) + Duration::minutes(minute_offset),
        );
    }

    assert_contiguous(&store, IntervalSize::Minutes5);
    // seeded at minute 67, so bucket starts stay at 2 modulo 5:
    // the sequence runs from minute -3 through minute 122, 25 buckets
    assert_eq!(store.len(), 25);
    let total: u64 = store
        .intervals()
        .iter()
        .map(|interval| interval.server(0).total_count())
        .sum();
    assert_eq!(total, 14);
}

#[test]
fn test_multiple_servers_share_the_timeline() {
    let mut store: IntervalStore = IntervalStore::new(
        IntervalSize::Minutes10,
        TopSize::Top5,
        vec![String::from("as1"), String::from("as2")],
        true,
        false,
    );
    store
        .add(0, accesslog(ymdhms(&FO_Z, 2014, 8, 1, 1, 2, 0), "/a", 200, 1.0, TimeUnit::Seconds))
        .unwrap();
    store
        .add(1, accesslog(ymdhms(&FO_Z, 2014, 8, 1, 1, 3, 0), "/b", 500, 2.0, TimeUnit::Seconds))
        .unwrap();

    assert_eq!(store.len(), 1);
    let interval = &store.intervals()[0];
    assert_eq!(interval.server(0).total_count(), 1);
    assert_eq!(interval.server(1).total_count(), 1);
    assert_eq!(interval.server(0).count_http500(), 0);
    assert_eq!(interval.server(1).count_http500(), 1);
}

#[test]
fn test_len_without_trailing_empty() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 0, 0));
    // grow the sequence without adding records: trailing buckets stay empty
    store
        .locate_or_extend(&ymdhms(&FO_Z, 2014, 8, 1, 1, 45, 0))
        .unwrap();

    assert_eq!(store.len(), 5);
    assert_eq!(store.len_without_trailing_empty(), 1);
}

#[test]
fn test_len_without_trailing_empty_keeps_interior_gaps() {
    let mut store: IntervalStore = new_store(IntervalSize::Minutes10);
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 0, 0));
    add_at(&mut store, ymdhms(&FO_Z, 2014, 8, 1, 1, 35, 0));

    // bucket layout: [filled, empty, empty, filled]
    assert_eq!(store.len(), 4);
    assert_eq!(store.len_without_trailing_empty(), 4);
}

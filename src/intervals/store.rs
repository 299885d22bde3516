// src/intervals/store.rs

//! Implements the [`IntervalStore`], the gap-aware sequence of time
//! buckets.
//!
//! Invariant: the buckets form a contiguous, non-overlapping, strictly
//! increasing sequence of fixed width; `bucket[i].end == bucket[i+1].start`
//! for every adjacent pair. Input order is arbitrary: a record older than
//! the earliest bucket extends the sequence backward, a record at or past
//! the last bucket's end extends it forward. Lookup inside the covered
//! range is O(1); an extension is O(gap width in buckets).
//!
//! [`IntervalStore`]: crate::intervals::store::IntervalStore

use std::io::{Error, ErrorKind, Result};
use std::sync::Arc;

use ::more_asserts::debug_assert_lt;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::ServerIndex;
use crate::data::accesslog::{AccessLog, AccessLogP};
use crate::data::datetime::{datetime_truncate_to_minute, DateTimeL, Duration};
use crate::intervals::interval::{Interval, IntervalSize, TopSize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The ordered sequence of [`Interval`] buckets for one run, shared by all
/// configured servers. Each bucket keeps an independent aggregation slice
/// per server.
#[derive(Debug)]
pub struct IntervalStore {
    intervals: Vec<Interval>,
    size: IntervalSize,
    top: TopSize,
    server_names: Vec<String>,
    keep_http500: bool,
    keep_http400: bool,
}

impl IntervalStore {
    pub fn new(
        size: IntervalSize,
        top: TopSize,
        server_names: Vec<String>,
        keep_http500: bool,
        keep_http400: bool,
    ) -> IntervalStore {
        IntervalStore {
            intervals: Vec::new(),
            size,
            top,
            server_names,
            keep_http500,
            keep_http400,
        }
    }

    pub fn interval_size(&self) -> IntervalSize {
        self.size
    }

    pub fn top_size(&self) -> TopSize {
        self.top
    }

    pub fn server_names(&self) -> &[String] {
        &self.server_names
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Resolve `server`'s record to its bucket, creating buckets as needed,
    /// and fold it in.
    pub fn add(&mut self, server: ServerIndex, accesslog: AccessLog) -> Result<()> {
        let accesslog: AccessLogP = Arc::new(accesslog);
        let index: usize = self.locate_or_extend(&accesslog.dt)?;
        self.intervals[index].add(server, accesslog);

        Ok(())
    }

    /// Index of the bucket covering `dt`, extending the sequence backward
    /// or forward when `dt` falls outside it.
    ///
    /// The first record seeds bucket 0 at its own timestamp with seconds
    /// truncated to zero. A timestamp that still resolves outside the
    /// sequence after extension means the contiguity invariant broke;
    /// that is an internal defect and fatal to the run.
    pub(crate) fn locate_or_extend(&mut self, dt: &DateTimeL) -> Result<usize> {
        defn!("({:?})", dt);
        if self.intervals.is_empty() {
            let start: DateTimeL = datetime_truncate_to_minute(dt);
            defo!("seed interval 0 at {:?}", start);
            self.intervals.push(self.new_interval(start));

            defx!("return 0");
            return Ok(0);
        }

        let width_seconds: i64 = self.size.seconds();
        let first_start: DateTimeL = *self.intervals[0].start();
        let last_end: DateTimeL = *self.intervals[self.intervals.len() - 1].end();

        if *dt < first_start {
            // whole widths needed to reach at or before `dt`
            let gap_seconds: i64 = (first_start - *dt).num_seconds();
            let needed: i64 = (gap_seconds + width_seconds - 1) / width_seconds;
            defo!("extend backward {} intervals", needed);
            let new_first_start: DateTimeL =
                first_start - Duration::seconds(needed * width_seconds);
            let mut prepend: Vec<Interval> = Vec::with_capacity(needed as usize);
            for i in 0..needed {
                let start: DateTimeL = new_first_start + Duration::seconds(i * width_seconds);
                prepend.push(self.new_interval(start));
            }
            self.intervals.splice(0..0, prepend);
        } else if *dt >= last_end {
            let gap_seconds: i64 = (*dt - last_end).num_seconds();
            let needed: i64 = gap_seconds / width_seconds + 1;
            defo!("extend forward {} intervals", needed);
            for i in 0..needed {
                let start: DateTimeL = last_end + Duration::seconds(i * width_seconds);
                self.intervals.push(self.new_interval(start));
            }
        }

        let first_start: DateTimeL = *self.intervals[0].start();
        let index: i64 = (*dt - first_start).num_seconds() / width_seconds;
        if index < 0 || index as usize >= self.intervals.len() {
            // the sequence no longer covers a timestamp it was just
            // extended for; aggregated state cannot be trusted
            return Err(Error::new(
                ErrorKind::Other,
                format!("interval sequence corrupted, cannot place record at {}", dt),
            ));
        }
        debug_assert_lt!((index as usize), self.intervals.len());
        defx!("return {}", index);

        Ok(index as usize)
    }

    fn new_interval(&self, start: DateTimeL) -> Interval {
        Interval::new(
            start,
            self.size,
            self.server_names.len(),
            self.top,
            self.keep_http500,
            self.keep_http400,
        )
    }

    /// Index one past the last non-empty bucket; the bucket count a
    /// renderer uses when trailing empty buckets are hidden. Interior empty
    /// buckets are never excluded.
    pub fn len_without_trailing_empty(&self) -> usize {
        let mut len: usize = self.intervals.len();
        while len > 0 && self.intervals[len - 1].is_empty() {
            len -= 1;
        }

        len
    }
}

// src/intervals/interval.rs

//! Implements an [`Interval`] time bucket and the per-server
//! [`ServerSlice`] aggregation state inside it.
//!
//! [`Interval`]: crate::intervals::interval::Interval
//! [`ServerSlice`]: crate::intervals::interval::ServerSlice

use std::io::{Error, ErrorKind, Result};

use ::more_asserts::debug_assert_le;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{Count, ServerIndex};
use crate::data::accesslog::AccessLogP;
use crate::data::datetime::{DateTimeL, Duration};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IntervalSize, TopSize
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Width of every time bucket in a run; fixed when processing starts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IntervalSize {
    Minutes1,
    Minutes5,
    #[default]
    Minutes10,
    Minutes15,
    Minutes30,
    Minutes60,
    Minutes120,
}

impl IntervalSize {
    pub const fn minutes(self) -> u32 {
        match self {
            IntervalSize::Minutes1 => 1,
            IntervalSize::Minutes5 => 5,
            IntervalSize::Minutes10 => 10,
            IntervalSize::Minutes15 => 15,
            IntervalSize::Minutes30 => 30,
            IntervalSize::Minutes60 => 60,
            IntervalSize::Minutes120 => 120,
        }
    }

    pub const fn seconds(self) -> i64 {
        self.minutes() as i64 * 60
    }

    pub fn from_minutes(minutes: u32) -> Result<IntervalSize> {
        match minutes {
            1 => Ok(IntervalSize::Minutes1),
            5 => Ok(IntervalSize::Minutes5),
            10 => Ok(IntervalSize::Minutes10),
            15 => Ok(IntervalSize::Minutes15),
            30 => Ok(IntervalSize::Minutes30),
            60 => Ok(IntervalSize::Minutes60),
            120 => Ok(IntervalSize::Minutes120),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "unrecognized interval size {} minutes; expected one of 1, 5, 10, 15, 30, 60, 120",
                    minutes
                ),
            )),
        }
    }
}

impl std::fmt::Display for IntervalSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} minutes", self.minutes())
    }
}

/// How many of the slowest requests each server keeps per bucket.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TopSize {
    #[default]
    Top5,
    Top10,
    Top20,
}

impl TopSize {
    pub const fn count(self) -> usize {
        match self {
            TopSize::Top5 => 5,
            TopSize::Top10 => 10,
            TopSize::Top20 => 20,
        }
    }

    pub fn from_count(count: usize) -> Result<TopSize> {
        match count {
            5 => Ok(TopSize::Top5),
            10 => Ok(TopSize::Top10),
            20 => Ok(TopSize::Top20),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("unrecognized top size {}; expected one of 5, 10, 20", count),
            )),
        }
    }
}

impl std::fmt::Display for TopSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.count())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// response-time histogram
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Upper boundary points of the response-time histogram, in seconds,
/// ascending. The last entry is the open-ended catch-all.
pub const HISTOGRAM_BOUNDARIES: [u32; 14] =
    [2, 4, 6, 8, 10, 15, 20, 30, 40, 60, 80, 100, 120, u32::MAX];

/// The histogram slot for a response time in seconds: the first boundary
/// strictly greater than the value. `None` for a negative ("not set")
/// response time.
pub fn histogram_index(rtime_seconds: f64) -> Option<usize> {
    if rtime_seconds < 0.0 {
        return None;
    }

    Some(HISTOGRAM_BOUNDARIES.partition_point(|boundary| (*boundary as f64) <= rtime_seconds))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ServerSlice
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One server's aggregation state within one [`Interval`].
#[derive(Debug)]
pub struct ServerSlice {
    total_count: Count,
    count_http500: Count,
    count_http400: Count,
    count_http300: Count,
    /// counts per [`HISTOGRAM_BOUNDARIES`] slot
    histogram: [Count; HISTOGRAM_BOUNDARIES.len()],
    /// the slowest requests seen, ascending by response time, at most
    /// `top_capacity` entries
    top: Vec<AccessLogP>,
    top_capacity: usize,
    logs_http500: Vec<AccessLogP>,
    logs_http400: Vec<AccessLogP>,
    keep_http500: bool,
    keep_http400: bool,
}

impl ServerSlice {
    pub fn new(top: TopSize, keep_http500: bool, keep_http400: bool) -> ServerSlice {
        ServerSlice {
            total_count: 0,
            count_http500: 0,
            count_http400: 0,
            count_http300: 0,
            histogram: [0; HISTOGRAM_BOUNDARIES.len()],
            top: Vec::with_capacity(top.count()),
            top_capacity: top.count(),
            logs_http500: Vec::new(),
            logs_http400: Vec::new(),
            keep_http500,
            keep_http400,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn total_count(&self) -> Count {
        self.total_count
    }

    pub fn count_http500(&self) -> Count {
        self.count_http500
    }

    pub fn count_http400(&self) -> Count {
        self.count_http400
    }

    pub fn count_http300(&self) -> Count {
        self.count_http300
    }

    pub fn histogram(&self) -> &[Count; HISTOGRAM_BOUNDARIES.len()] {
        &self.histogram
    }

    /// The retained slowest requests, ascending by response time.
    pub fn top_of_interval(&self) -> &[AccessLogP] {
        &self.top
    }

    pub fn logs_http500_of_interval(&self) -> &[AccessLogP] {
        &self.logs_http500
    }

    pub fn logs_http400_of_interval(&self) -> &[AccessLogP] {
        &self.logs_http400
    }

    /// Fold one record into this slice.
    pub fn add(&mut self, accesslog: AccessLogP) {
        self.top_insert(accesslog.clone());

        if accesslog.rcode >= 500 {
            if self.keep_http500 {
                self.logs_http500.push(accesslog.clone());
            }
            self.count_http500 += 1;
        } else if accesslog.rcode >= 400 {
            if self.keep_http400 {
                self.logs_http400.push(accesslog.clone());
            }
            self.count_http400 += 1;
        } else if accesslog.rcode >= 300 {
            self.count_http300 += 1;
        }

        self.total_count += 1;

        if let Some(slot) = histogram_index(accesslog.rtime_in_seconds()) {
            self.histogram[slot] += 1;
        }
    }

    /// Sorted insert keeping only the slowest `top_capacity` records.
    ///
    /// `top[0]` is the least slow retained record; it is evicted when a
    /// strictly slower record arrives and the ranking is full. Ties keep
    /// insertion order.
    fn top_insert(&mut self, accesslog: AccessLogP) {
        if self.top.len() < self.top_capacity {
            let index: usize = self
                .top
                .partition_point(|retained| retained.rtime <= accesslog.rtime);
            self.top.insert(index, accesslog);
        } else if let Some(least_slow) = self.top.first() {
            if least_slow.rtime < accesslog.rtime {
                self.top.remove(0);
                let index: usize = self
                    .top
                    .partition_point(|retained| retained.rtime <= accesslog.rtime);
                self.top.insert(index, accesslog);
            }
            // otherwise the record is counted but not retained
        }
        debug_assert_le!(self.top.len(), self.top_capacity);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Interval
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One time bucket: the half-open instant range `[start, end)` and one
/// [`ServerSlice`] per configured server.
#[derive(Debug)]
pub struct Interval {
    start: DateTimeL,
    end: DateTimeL,
    servers: Vec<ServerSlice>,
}

impl Interval {
    /// Create an empty bucket starting at `start` (already aligned by the
    /// caller) spanning one `size` width.
    pub fn new(
        start: DateTimeL,
        size: IntervalSize,
        server_count: usize,
        top: TopSize,
        keep_http500: bool,
        keep_http400: bool,
    ) -> Interval {
        let end: DateTimeL = start + Duration::minutes(size.minutes() as i64);
        let mut servers: Vec<ServerSlice> = Vec::with_capacity(server_count);
        for _ in 0..server_count {
            servers.push(ServerSlice::new(top, keep_http500, keep_http400));
        }

        Interval { start, end, servers }
    }

    /// Start instant, inclusive.
    pub fn start(&self) -> &DateTimeL {
        &self.start
    }

    /// End instant, exclusive.
    pub fn end(&self) -> &DateTimeL {
        &self.end
    }

    /// A bucket is empty iff every per-server slice is empty.
    pub fn is_empty(&self) -> bool {
        self.servers.iter().all(ServerSlice::is_empty)
    }

    pub fn server(&self, server: ServerIndex) -> &ServerSlice {
        &self.servers[server]
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Fold one record into `server`'s slice of this bucket.
    pub fn add(&mut self, server: ServerIndex, accesslog: AccessLogP) {
        self.servers[server].add(accesslog);
    }

    /// The retained slowest requests of `server`, ascending by response
    /// time.
    pub fn get_top_of_interval(&self, server: ServerIndex) -> &[AccessLogP] {
        self.servers[server].top_of_interval()
    }

    /// Every 5xx record of `server`, when retention is enabled.
    pub fn get_logs_http500_of_interval(&self, server: ServerIndex) -> &[AccessLogP] {
        self.servers[server].logs_http500_of_interval()
    }

    /// Every 4xx record of `server`, when retention is enabled.
    pub fn get_logs_http400_of_interval(&self, server: ServerIndex) -> &[AccessLogP] {
        self.servers[server].logs_http400_of_interval()
    }
}

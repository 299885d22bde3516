// src/intervals/mod.rs

//! The interval aggregation engine of _alalib_.
//!
//! ## Overview
//!
//! * An [`IntervalStore`] owns a contiguous, ascending sequence of
//!   fixed-width [`Interval`]s covering exactly the observed record
//!   timestamps, growing the sequence at either end as out-of-order
//!   records arrive.
//! * An [`Interval`] is one time bucket, holding one [`ServerSlice`] per
//!   configured server.
//! * A [`ServerSlice`] accumulates one server's records within one bucket:
//!   running counters by status-code class, a response-time histogram, the
//!   bounded ranking of the slowest requests, and the optional full 4xx/5xx
//!   listings.
//!
//! All of it is single-threaded; the processing loop is the only writer.
//!
//! [`IntervalStore`]: crate::intervals::store::IntervalStore
//! [`Interval`]: crate::intervals::interval::Interval
//! [`ServerSlice`]: crate::intervals::interval::ServerSlice

pub mod interval;
pub mod store;

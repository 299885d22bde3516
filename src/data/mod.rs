// src/data/mod.rs

//! The `data` module is the passive data containers of _alalib_:
//! [`AccessLog`] records and the datetime parsing helpers that build their
//! timestamps.
//!
//! ## Definitions of data
//!
//! ### AccessLog
//!
//! An `AccessLog` is one successfully parsed request line of a web-server
//! access log: the requesting/serving host, the request timestamp, the URL,
//! the HTTP status code, the response size, and the response time with its
//! unit of measure.
//!
//! An `AccessLog` is produced by a [`LineExtractor`] and aggregated into a
//! [`ServerSlice`] of an [`Interval`].
//!
//! [`AccessLog`]: crate::data::accesslog::AccessLog
//! [`LineExtractor`]: crate::extractors::LineExtractor
//! [`ServerSlice`]: crate::intervals::interval::ServerSlice
//! [`Interval`]: crate::intervals::interval::Interval

pub mod accesslog;
pub mod datetime;

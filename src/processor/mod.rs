// src/processor/mod.rs

//! The batch processing layer of _alalib_.
//!
//! ## Overview
//!
//! * An [`AccessLogProcessor`] drives one run: per server, per file, per
//!   line, it applies the server's [`LineExtractor`], consults the
//!   [`RecordFilter`], and folds surviving records into the shared
//!   [`IntervalStore`].
//! * A [`RecordFilter`] decides which extracted records are discarded
//!   (static resources, URL filter rules, 3xx suppression).
//! * A [`SkipLog`] is the verbose trail of every skipped line and discarded
//!   record, written next to the report at the end of the run.
//!
//! The run configuration is one explicitly constructed [`RunConfig`] owned
//! by the caller and passed by reference; there is no global state.
//!
//! [`AccessLogProcessor`]: crate::processor::logprocessor::AccessLogProcessor
//! [`LineExtractor`]: crate::extractors::LineExtractor
//! [`RecordFilter`]: crate::processor::urlfilter::RecordFilter
//! [`IntervalStore`]: crate::intervals::store::IntervalStore
//! [`SkipLog`]: crate::processor::skiplog::SkipLog
//! [`RunConfig`]: crate::processor::logprocessor::RunConfig

pub mod logprocessor;
pub mod skiplog;
pub mod urlfilter;

// src/processor/logprocessor.rs

//! Implements the [`AccessLogProcessor`], the single-threaded batch driver
//! of a run.
//!
//! One run reads every configured server's log files sequentially,
//! line-by-line, driving the extract → filter → locate → aggregate
//! pipeline for each line. Configuration problems (missing file, unknown
//! server type, format missing a required field) abort before the first
//! line is read; problems with an individual line are logged to the
//! [`SkipLog`] and skipped.
//!
//! [`AccessLogProcessor`]: crate::processor::logprocessor::AccessLogProcessor
//! [`SkipLog`]: crate::processor::skiplog::SkipLog

use std::io::{BufRead, BufReader, Error, ErrorKind, Result};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{Count, FPath, FPaths, File, Path, Percent, ResultExtract, ServerIndex, SkipReason};
use crate::data::accesslog::AccessLog;
use crate::data::datetime::FixedOffset;
use crate::extractors::{new_line_extractor, LineExtractor, ServerType};
use crate::intervals::interval::{IntervalSize, TopSize};
use crate::intervals::store::IntervalStore;
use crate::processor::skiplog::SkipLog;
use crate::processor::urlfilter::{DiscardReason, RecordFilter};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Files below this many lines report no progress; counting them first
/// costs more than the feedback is worth.
pub const PROGRESS_LINES_MIN: usize = 100_000;

/// Fire-and-forget progress observer, called with each whole percent
/// completed. Carries no correctness obligation.
pub type ProgressFn<'a> = dyn Fn(Percent) + 'a;

/// One logical server: a name for the report, the family grammar, the
/// format string (ignored by IIS), and the log files to read.
#[derive(Clone, Debug)]
pub struct ServerDef {
    pub name: String,
    pub server_type: ServerType,
    pub format: String,
    pub paths: FPaths,
}

/// The strongly-typed configuration of one run, built once by the caller
/// (the command-line front-end or a test) and passed by reference.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub interval: IntervalSize,
    pub top: TopSize,
    /// retain full 5xx records per interval
    pub keep_http500_list: bool,
    /// retain full 4xx records per interval
    pub keep_http400_list: bool,
    pub filter_static_resources: bool,
    pub discard_redirects: bool,
    /// hide trailing empty intervals in the rendered report
    pub hide_empty_intervals: bool,
    pub verbose: bool,
    /// offset applied to timestamps that carry none of their own
    pub tz_offset: FixedOffset,
}

impl RunConfig {
    /// Defaults: 10-minute intervals, top 5, keep the 5xx list, everything
    /// else off.
    pub fn new(tz_offset: FixedOffset) -> RunConfig {
        RunConfig {
            interval: IntervalSize::default(),
            top: TopSize::default(),
            keep_http500_list: true,
            keep_http400_list: false,
            filter_static_resources: false,
            discard_redirects: false,
            hide_empty_intervals: false,
            verbose: false,
            tz_offset,
        }
    }
}

/// Per-cause line counts of one run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    pub lines_read: Count,
    /// lines that parsed to a complete record
    pub records_extracted: Count,
    /// records that survived filtering and were aggregated
    pub records_aggregated: Count,
    /// IIS in-band `#`-comment lines
    pub directive_lines: Count,
    pub skipped_pattern_mismatch: Count,
    pub skipped_bad_datetime: Count,
    pub skipped_bad_status_code: Count,
    pub skipped_bad_response_time: Count,
    pub skipped_format_unknown: Count,
    pub discarded_static_resource: Count,
    pub discarded_filter_rule: Count,
    pub discarded_redirect: Count,
}

impl RunSummary {
    pub fn skipped_total(&self) -> Count {
        self.skipped_pattern_mismatch
            + self.skipped_bad_datetime
            + self.skipped_bad_status_code
            + self.skipped_bad_response_time
            + self.skipped_format_unknown
    }

    pub fn discarded_total(&self) -> Count {
        self.discarded_static_resource + self.discarded_filter_rule + self.discarded_redirect
    }

    fn note_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::PatternMismatch => self.skipped_pattern_mismatch += 1,
            SkipReason::BadDateTime => self.skipped_bad_datetime += 1,
            SkipReason::BadStatusCode => self.skipped_bad_status_code += 1,
            SkipReason::BadResponseTime => self.skipped_bad_response_time += 1,
            SkipReason::FormatUnknown => self.skipped_format_unknown += 1,
        }
    }

    fn note_discard(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::StaticResource => self.discarded_static_resource += 1,
            DiscardReason::FilterRule => self.discarded_filter_rule += 1,
            DiscardReason::Redirect3xx => self.discarded_redirect += 1,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The batch driver. Owns the record filter; borrows the configuration and
/// the optional progress observer.
pub struct AccessLogProcessor<'a> {
    config: &'a RunConfig,
    filter: RecordFilter,
    progress: Option<&'a ProgressFn<'a>>,
}

impl<'a> AccessLogProcessor<'a> {
    pub fn new(
        config: &'a RunConfig,
        filter: RecordFilter,
        progress: Option<&'a ProgressFn<'a>>,
    ) -> AccessLogProcessor<'a> {
        AccessLogProcessor {
            config,
            filter,
            progress,
        }
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Process every file of every server into one shared timeline.
    ///
    /// Fails fast: every input file is checked and every format compiled
    /// before the first line is read.
    pub fn process(
        &self,
        servers: &[ServerDef],
        skiplog: &mut SkipLog,
    ) -> Result<(IntervalStore, RunSummary)> {
        defn!("{} servers", servers.len());
        if servers.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "no servers configured",
            ));
        }
        for server in servers.iter() {
            for path in server.paths.iter() {
                if !Path::new(path).is_file() {
                    return Err(Error::new(
                        ErrorKind::NotFound,
                        format!("file does not exist: {}", path),
                    ));
                }
            }
        }
        let mut extractors: Vec<Box<dyn LineExtractor>> = Vec::with_capacity(servers.len());
        for server in servers.iter() {
            extractors.push(new_line_extractor(
                server.server_type,
                &server.format,
                &self.config.tz_offset,
            )?);
        }

        let server_names: Vec<String> = servers.iter().map(|server| server.name.clone()).collect();
        let mut store: IntervalStore = IntervalStore::new(
            self.config.interval,
            self.config.top,
            server_names,
            self.config.keep_http500_list,
            self.config.keep_http400_list,
        );
        let mut summary: RunSummary = RunSummary::default();

        for (server_index, server) in servers.iter().enumerate() {
            let extractor: &mut Box<dyn LineExtractor> = &mut extractors[server_index];
            for path in server.paths.iter() {
                self.process_file(server_index, path, extractor.as_mut(), &mut store, &mut summary, skiplog)?;
            }
        }
        defx!("{} intervals, {} records", store.len(), summary.records_aggregated);

        Ok((store, summary))
    }

    fn process_file(
        &self,
        server_index: ServerIndex,
        path: &FPath,
        extractor: &mut dyn LineExtractor,
        store: &mut IntervalStore,
        summary: &mut RunSummary,
        skiplog: &mut SkipLog,
    ) -> Result<()> {
        defn!("({:?})", path);

        // feedback for very large files: one callback per whole percent
        let one_percent: Option<usize> = match self.progress {
            Some(_) => {
                let total_lines: usize = BufReader::new(File::open(path)?).lines().count();
                match total_lines > PROGRESS_LINES_MIN {
                    true => Some(total_lines / 100),
                    false => None,
                }
            }
            None => None,
        };

        let reader: BufReader<File> = BufReader::new(File::open(path)?);
        let mut lines_processed: usize = 0;
        for line in reader.lines() {
            let line: String = line?;
            summary.lines_read += 1;

            match extractor.extract(&line)? {
                ResultExtract::Extracted(accesslog) => {
                    summary.records_extracted += 1;
                    match self.filter.discard(&accesslog) {
                        Some(reason) => {
                            summary.note_discard(reason);
                            skiplog.add(format!("{}: {}", reason, accesslog.url));
                        }
                        None => {
                            store.add(server_index, accesslog)?;
                            summary.records_aggregated += 1;
                        }
                    }
                }
                ResultExtract::Directive => {
                    summary.directive_lines += 1;
                }
                ResultExtract::Skipped(reason) => {
                    summary.note_skip(reason);
                    skiplog.add(format!("{}: {}", reason, line));
                }
            }

            lines_processed += 1;
            if let (Some(one_percent), Some(progress)) = (one_percent, self.progress) {
                if one_percent > 0 && lines_processed % one_percent == 0 {
                    progress((lines_processed / one_percent) as Percent);
                }
            }
        }
        defx!("({:?}) {} lines", path, lines_processed);

        Ok(())
    }
}

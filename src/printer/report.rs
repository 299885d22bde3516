// src/printer/report.rs

//! Renders a finished [`IntervalStore`] into the flat-text report.
//!
//! Columns are tab-separated so the report pastes into a spreadsheet.
//! When several servers share the timeline, each interval row carries one
//! column group per server.
//!
//! Trailing empty intervals are trimmed when the run asked to hide empty
//! intervals; interior empty intervals always render, so gaps in traffic
//! stay visible.
//!
//! [`IntervalStore`]: crate::intervals::store::IntervalStore

use std::collections::HashMap;
use std::io::{BufWriter, Result, Write};

use ::itertools::Itertools;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

use crate::common::{Count, FPath, File, ServerIndex};
use crate::data::datetime::datetime_to_string;
use crate::intervals::interval::{Interval, HISTOGRAM_BOUNDARIES};
use crate::intervals::store::IntervalStore;
use crate::processor::logprocessor::RunConfig;
use crate::processor::urlfilter::{UrlFilter, DISCARD_PREFIX, ONLY_PREFIX};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// column separator of the interval summary table
const SEP: char = '\t';

/// underlines each section heading
const SECTION_RULE: &str =
    "------------------------------------------------------------------------------------------";

/// Render the report to `writer`.
pub fn write_report<W: Write>(
    writer: &mut W,
    store: &IntervalStore,
    config: &RunConfig,
    filter: &UrlFilter,
) -> Result<()> {
    defn!();
    // trailing empty intervals are dropped on request; interior empty
    // intervals always render
    let rendered: &[Interval] = match config.hide_empty_intervals {
        true => &store.intervals()[..store.len_without_trailing_empty()],
        false => store.intervals(),
    };

    writeln!(writer, "Interval Size: {}", store.interval_size())?;
    writeln!(writer, "Top: {}", store.top_size())?;
    writeln!(writer, "Intervals: {}", rendered.len())?;

    writeln!(writer)?;
    writeln!(writer, "Filters:")?;
    writeln!(writer, "{}", SECTION_RULE)?;
    for rule in filter.only_rules().iter() {
        writeln!(writer, "{}{}", ONLY_PREFIX, rule)?;
    }
    for rule in filter.discard_rules().iter() {
        writeln!(writer, "{}{}", DISCARD_PREFIX, rule)?;
    }

    writeln!(writer)?;
    writeln!(writer, "Statistical Information")?;
    writeln!(writer, "{}", SECTION_RULE)?;
    write_summary_table(writer, store, rendered)?;

    writeln!(writer)?;
    writeln!(writer, "TOP slowest URLs")?;
    writeln!(writer, "{}", SECTION_RULE)?;
    let mut url_counts: HashMap<String, Count> = HashMap::new();
    for interval in rendered.iter() {
        for server in 0..store.server_names().len() {
            for accesslog in interval.get_top_of_interval(server).iter() {
                writeln!(writer, "{}", accesslog)?;
                *url_counts.entry(accesslog.url.clone()).or_insert(0) += 1;
            }
        }
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "URLs in the top lists of all intervals, and their count there"
    )?;
    writeln!(writer, "{}", SECTION_RULE)?;
    let sorted_urls: Vec<(&String, &Count)> = url_counts
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .collect();
    writeln!(writer, "{}", sorted_urls.iter().map(|(url, _)| url.as_str()).join("\t"))?;
    writeln!(writer, "{}", sorted_urls.iter().map(|(_, count)| count.to_string()).join("\t"))?;

    if config.keep_http500_list {
        writeln!(writer)?;
        writeln!(writer, "All URLs with response code HTTP 5xx")?;
        writeln!(writer, "{}", SECTION_RULE)?;
        write_retained_logs(writer, store, rendered, Interval::get_logs_http500_of_interval)?;
    }

    if config.keep_http400_list {
        writeln!(writer)?;
        writeln!(writer, "All URLs with response code HTTP 4xx")?;
        writeln!(writer, "{}", SECTION_RULE)?;
        write_retained_logs(writer, store, rendered, Interval::get_logs_http400_of_interval)?;
    }
    defx!();

    Ok(())
}

/// Render the report into a newly created file at `path`.
pub fn save_report_to_file(
    path: &FPath,
    store: &IntervalStore,
    config: &RunConfig,
    filter: &UrlFilter,
) -> Result<()> {
    let mut writer: BufWriter<File> = BufWriter::new(File::create(path)?);
    write_report(&mut writer, store, config, filter)?;
    writer.flush()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Headers of the histogram columns, one per
/// [`HISTOGRAM_BOUNDARIES`] slot.
fn histogram_headers() -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(HISTOGRAM_BOUNDARIES.len());
    headers.push(format!("between 0 and {} secs", HISTOGRAM_BOUNDARIES[0]));
    for i in 1..HISTOGRAM_BOUNDARIES.len() - 1 {
        headers.push(format!(
            "between {} and {} secs",
            HISTOGRAM_BOUNDARIES[i - 1],
            HISTOGRAM_BOUNDARIES[i]
        ));
    }
    headers.push(format!(
        "more than {} secs",
        HISTOGRAM_BOUNDARIES[HISTOGRAM_BOUNDARIES.len() - 2]
    ));

    headers
}

/// The interval summary table: a server-name banner row, a column-header
/// row, then one row per interval with one column group per server.
fn write_summary_table<W: Write>(
    writer: &mut W,
    store: &IntervalStore,
    rendered: &[Interval],
) -> Result<()> {
    let histogram_headers: Vec<String> = histogram_headers();
    // the first server's group carries the StartInterval column
    let group_width: usize = 4 + histogram_headers.len();

    let mut banner: String = String::new();
    for (server, name) in store.server_names().iter().enumerate() {
        let padding: usize = match server {
            0 => group_width + 1,
            _ => group_width,
        };
        banner.push_str(name);
        for _ in 0..padding {
            banner.push(SEP);
        }
    }
    writeln!(writer, "{}", banner.trim_end_matches(SEP))?;

    let mut header: String = String::new();
    for server in 0..store.server_names().len() {
        if server == 0 {
            header.push_str("StartInterval");
            header.push(SEP);
        }
        header.push_str("TotalCount");
        header.push(SEP);
        header.push_str("HTTP_5xx");
        header.push(SEP);
        header.push_str("HTTP_4xx");
        header.push(SEP);
        header.push_str("HTTP_3xx");
        header.push(SEP);
        header.push_str(&histogram_headers.join("\t"));
        header.push(SEP);
    }
    writeln!(writer, "{}", header.trim_end_matches(SEP))?;

    for interval in rendered.iter() {
        let mut row: String = String::new();
        row.push_str(&datetime_to_string(interval.start()));
        for server in 0..store.server_names().len() {
            let slice = interval.server(server);
            row.push(SEP);
            row.push_str(&format!(
                "{}{}{}{}{}{}{}",
                slice.total_count(),
                SEP,
                slice.count_http500(),
                SEP,
                slice.count_http400(),
                SEP,
                slice.count_http300(),
            ));
            for count in slice.histogram().iter() {
                row.push(SEP);
                row.push_str(&count.to_string());
            }
        }
        writeln!(writer, "{}", row)?;
    }

    Ok(())
}

/// One line per retained 4xx/5xx record, across every rendered interval and
/// server.
fn write_retained_logs<W: Write>(
    writer: &mut W,
    store: &IntervalStore,
    rendered: &[Interval],
    logs_of: impl Fn(&Interval, ServerIndex) -> &[crate::data::accesslog::AccessLogP],
) -> Result<()> {
    for interval in rendered.iter() {
        for server in 0..store.server_names().len() {
            for accesslog in logs_of(interval, server).iter() {
                writeln!(writer, "{}", accesslog)?;
            }
        }
    }

    Ok(())
}

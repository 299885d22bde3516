// src/printer/summary.rs

//! Prints the end-of-run [`RunSummary`] to stderr, alongside the shape of
//! the finished timeline.
//!
//! [`RunSummary`]: crate::processor::logprocessor::RunSummary

use crate::intervals::store::IntervalStore;
use crate::processor::logprocessor::RunSummary;

/// Print per-cause line counts and the resulting interval count.
/// Everything goes to stderr; the report file is the program's output.
pub fn print_summary(summary: &RunSummary, store: &IntervalStore) {
    eprintln!("Summary:");
    eprintln!("  lines read                {}", summary.lines_read);
    eprintln!("  records extracted         {}", summary.records_extracted);
    eprintln!("  records aggregated        {}", summary.records_aggregated);
    eprintln!("  directive lines           {}", summary.directive_lines);
    eprintln!("  lines skipped             {}", summary.skipped_total());
    if summary.skipped_total() > 0 {
        eprintln!("    format mismatch         {}", summary.skipped_pattern_mismatch);
        eprintln!("    unparsable timestamp    {}", summary.skipped_bad_datetime);
        eprintln!("    invalid status code     {}", summary.skipped_bad_status_code);
        eprintln!("    invalid response time   {}", summary.skipped_bad_response_time);
        eprintln!("    format unknown          {}", summary.skipped_format_unknown);
    }
    eprintln!("  records discarded         {}", summary.discarded_total());
    if summary.discarded_total() > 0 {
        eprintln!("    static resources        {}", summary.discarded_static_resource);
        eprintln!("    filter rules            {}", summary.discarded_filter_rule);
        eprintln!("    3xx suppressed          {}", summary.discarded_redirect);
    }
    eprintln!("  intervals                 {}", store.len());
    if let (Some(first), Some(last)) = (store.intervals().first(), store.intervals().last()) {
        eprintln!("  timeline                  {} to {}", first.start(), last.end());
    }
}

// src/bin/ala.rs

//! Driver program _ala_ drives the [_alalib_].
//!
//! Processes user-passed command-line arguments into a [`RunConfig`] and
//! one [`ServerDef`], runs the [`AccessLogProcessor`] over the passed log
//! files, renders the report file, and, when verbose, writes the skip
//! trail next to it.
//!
//! `ala.rs` is the only code that prints to STDOUT.
//!
//! [_alalib_]: alalib
//! [`RunConfig`]: alalib::processor::logprocessor::RunConfig
//! [`ServerDef`]: alalib::processor::logprocessor::ServerDef
//! [`AccessLogProcessor`]: alalib::processor::logprocessor::AccessLogProcessor

#![allow(non_camel_case_types)]

use std::io::IsTerminal;
use std::process::ExitCode;
use std::str::FromStr;

use ::anyhow::Context;
use ::chrono::{DateTime, FixedOffset, Local};
use ::clap::Parser;
use ::const_format::concatcp;
use ::lazy_static::lazy_static;

use ::alalib::common::{FPath, Percent};
use ::alalib::debug::printers::e_err;
use ::alalib::extractors::ServerType;
use ::alalib::intervals::interval::{IntervalSize, TopSize};
use ::alalib::printer::report::save_report_to_file;
use ::alalib::printer::summary::print_summary;
use ::alalib::processor::logprocessor::{
    AccessLogProcessor,
    ProgressFn,
    RunConfig,
    ServerDef,
};
use ::alalib::processor::skiplog::{SkipLog, SKIPLOG_FILE_SUFFIX};
use ::alalib::processor::urlfilter::{RecordFilter, UrlFilter};

// --------------------
// command-line parsing

/// appended to the first input path when `--output` is not passed
const OUTPUT_FILE_SUFFIX: &str = "_reportResult.txt";

lazy_static! {
    /// the local system timezone offset, the default for `--tz-offset`
    static ref LOCAL_OFFSET: FixedOffset = *Local::now().offset();
}

const CLI_HELP_AFTER: &str = concatcp!(
    r#"Server types and example formats:
  apache   "#,
    "%h %l %u %t \"%r\" %>s %b %D",
    r#"
  tomcat   %A %b %B %H %m %p %q %r %s %t %U %v %T %I
  jboss    (same grammar as tomcat)
  iis      field list is read from the log file's own #Fields: header
  generic  HOST TIME URL RCODE RTIME RSIZE MILLISECOND
           (tab-separated data; trailing unit token optional)

The report file is tab-separated text: an interval summary table, the
slowest requests per interval, and optional full 4xx/5xx listings.

Version: "#,
    env!("CARGO_PKG_VERSION"),
    "\nLicense: ",
    env!("CARGO_PKG_LICENSE"),
);

/// clap command-line arguments build-time definitions.
//
// Note:
// * the `about` is taken from `Cargo.toml:[package]:description`.
#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    name = "ala",
    version = concatcp!(
        "(Access Log Analyzer)\n",
        "Version: ", env!("CARGO_PKG_VERSION"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
    ),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
)]
struct CLI_Args {
    /// Path(s) of access-log files, all written by the same server.
    #[clap(required = true)]
    paths: Vec<String>,

    /// Server family that wrote the log files.
    /// One of: apache, tomcat, jboss, iis, generic.
    #[clap(
        short = 's',
        long,
        verbatim_doc_comment,
        value_parser = cli_parse_server_type,
    )]
    server_type: ServerType,

    /// Access-log format string for the chosen server type.
    /// Required for every server type except iis.
    #[clap(short = 'f', long, verbatim_doc_comment)]
    format: Option<String>,

    /// Server name shown in the report.
    #[clap(long, default_value = "server1")]
    server_name: String,

    /// Interval width in minutes.
    /// One of: 1, 5, 10, 15, 30, 60, 120.
    #[clap(
        short = 'i',
        long,
        verbatim_doc_comment,
        default_value = "10",
        value_parser = cli_parse_interval,
    )]
    interval: IntervalSize,

    /// How many of the slowest requests to keep per interval.
    /// One of: 5, 10, 20.
    #[clap(
        short = 'k',
        long,
        verbatim_doc_comment,
        default_value = "5",
        value_parser = cli_parse_top,
    )]
    top: TopSize,

    /// Report file path.
    /// Defaults to the first input path plus "_reportResult.txt".
    #[clap(short = 'o', long, verbatim_doc_comment)]
    output: Option<String>,

    /// Path of a URL filter-rule file; one ONLY: or DISCARD: rule per line.
    #[clap(long)]
    filter_file: Option<String>,

    /// Also list every 4xx record per interval in the report.
    #[clap(long = "http400-list")]
    http400_list: bool,

    /// Do not list every 5xx record per interval in the report.
    /// By default the full 5xx listing is kept.
    #[clap(long = "no-http500-list", verbatim_doc_comment)]
    no_http500_list: bool,

    /// Discard static resources (.jpg .png .css .js .gif).
    #[clap(long)]
    filter_static: bool,

    /// Discard records with a 3xx status code.
    #[clap(long = "discard-3xx")]
    discard_3xx: bool,

    /// Hide trailing empty intervals in the report.
    #[clap(long)]
    hide_empty: bool,

    /// Timezone offset applied to log timestamps that carry none of their
    /// own, e.g. "-0300", "+02:00".
    /// If not passed then the local system timezone offset is used.
    /// To pass a value with leading "-" use "=" notation, e.g. "-t=-0300".
    #[clap(
        short = 't',
        long,
        verbatim_doc_comment,
        value_parser = cli_process_tz_offset,
        default_value_t = *LOCAL_OFFSET,
    )]
    tz_offset: FixedOffset,

    /// Keep a trail of skipped lines and discarded records, written to
    /// "<report path>-LOG.txt".
    #[clap(short = 'v', long, verbatim_doc_comment)]
    verbose: bool,

    /// Print a summary of the run to stderr.
    #[clap(long)]
    summary: bool,
}

/// `clap` argument processor for `--server-type`.
fn cli_parse_server_type(value: &str) -> std::result::Result<ServerType, String> {
    ServerType::from_str(value).map_err(|err| err.to_string())
}

/// `clap` argument processor for `--interval`.
fn cli_parse_interval(value: &str) -> std::result::Result<IntervalSize, String> {
    let minutes: u32 = value
        .parse::<u32>()
        .map_err(|err| format!("{:?}: {}", value, err))?;

    IntervalSize::from_minutes(minutes).map_err(|err| err.to_string())
}

/// `clap` argument processor for `--top`.
fn cli_parse_top(value: &str) -> std::result::Result<TopSize, String> {
    let count: usize = value
        .parse::<usize>()
        .map_err(|err| format!("{:?}: {}", value, err))?;

    TopSize::from_count(count).map_err(|err| err.to_string())
}

/// `clap` argument processor for `--tz-offset`.
///
/// Transforms the offset string to a [`FixedOffset`] instance by parsing a
/// dummy datetime carrying it.
fn cli_process_tz_offset(tzo: &str) -> std::result::Result<FixedOffset, String> {
    let mut data: String = String::from("2000-01-02 03:04:05 ");
    data.push_str(tzo);
    for pattern in [
        "%Y-%m-%d %H:%M:%S %:z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S %#z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(data.as_str(), pattern) {
            return Ok(*dt.offset());
        }
    }

    Err(format!("Unable to parse a timezone offset for --tz-offset {:?}", tzo))
}

// --------------------
// the program

pub fn main() -> ExitCode {
    let args: CLI_Args = CLI_Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            e_err!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CLI_Args) -> anyhow::Result<()> {
    if args.server_type.needs_format() && args.format.is_none() {
        anyhow::bail!(
            "server type {} requires --format, e.g. {:?}",
            args.server_type,
            args.server_type.example_format(),
        );
    }

    let config: RunConfig = RunConfig {
        interval: args.interval,
        top: args.top,
        keep_http500_list: !args.no_http500_list,
        keep_http400_list: args.http400_list,
        filter_static_resources: args.filter_static,
        discard_redirects: args.discard_3xx,
        hide_empty_intervals: args.hide_empty,
        verbose: args.verbose,
        tz_offset: args.tz_offset,
    };

    let url_filter: UrlFilter = match &args.filter_file {
        Some(path) => UrlFilter::from_file(path).context("loading the filter file failed")?,
        None => UrlFilter::new(),
    };
    let filter: RecordFilter = RecordFilter {
        url_filter,
        filter_static_resources: config.filter_static_resources,
        discard_redirects: config.discard_redirects,
    };

    let server: ServerDef = ServerDef {
        name: args.server_name.clone(),
        server_type: args.server_type,
        format: args.format.clone().unwrap_or_default(),
        paths: args.paths.clone(),
    };

    // progress is visual feedback only; skip it when stderr is not a
    // terminal
    let show_progress: bool = std::io::stderr().is_terminal();
    let progress_print = |percent: Percent| {
        eprint!("\rprocessed {:3}%", percent);
    };
    let progress: Option<&ProgressFn> = match show_progress {
        true => Some(&progress_print),
        false => None,
    };

    let mut skiplog: SkipLog = SkipLog::new(config.verbose);
    let processor: AccessLogProcessor = AccessLogProcessor::new(&config, filter, progress);
    let (store, summary) = processor
        .process(&[server], &mut skiplog)
        .context("processing failed")?;
    if show_progress {
        eprint!("\r");
    }

    let report_path: FPath = match args.output {
        Some(path) => path,
        None => format!("{}{}", args.paths[0], OUTPUT_FILE_SUFFIX),
    };
    save_report_to_file(&report_path, &store, &config, &processor.filter().url_filter)
        .with_context(|| format!("writing the report to {} failed", report_path))?;
    println!("Report written to {}", report_path);

    if config.verbose {
        let skiplog_path: FPath = format!("{}{}", report_path, SKIPLOG_FILE_SUFFIX);
        skiplog
            .save_to_file(&skiplog_path)
            .with_context(|| format!("writing the skip trail to {} failed", skiplog_path))?;
        println!("Skip trail written to {}", skiplog_path);
    }

    if args.summary {
        print_summary(&summary, &store);
    }

    Ok(())
}

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use mysql_slowlog_json::config::{OutputTarget, ParserConfig};
use mysql_slowlog_json::error::config_error;
use mysql_slowlog_json::output::JsonLinesWriter;
use mysql_slowlog_json::pipeline::{process_file_with_progress, RunStats};
use mysql_slowlog_json::{Result, RuleSet};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[clap(
    name = "slowlog-json",
    version,
    about = "Convert a MySQL slow query log into line-delimited JSON"
)]
struct Arguments {
    /// Slow log file to convert. May be given several times.
    #[clap(short = 'f', long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Output file. Records are appended. Use - for stdout. Defaults to the
    /// input path with a .json extension.
    #[clap(short = 'o', long, value_name = "PATH")]
    output: Option<String>,

    /// Stop at the first metric value that cannot be parsed
    #[clap(long)]
    strict: bool,

    /// Join query lines without line breaks
    #[clap(long)]
    join_lines: bool,

    /// Only log warnings and errors, and hide the progress spinner
    #[clap(short = 'q', long)]
    quiet: bool,
}

fn main() {
    let args = Arguments::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(args: &Arguments) -> anyhow::Result<()> {
    if args.files.is_empty() {
        debug!("No input file given, nothing to do");
        return Ok(());
    }

    validate_arguments(args)?;

    let rules = RuleSet::standard().context("rule table is invalid")?;
    let config = ParserConfig::default()
        .with_strict(args.strict)
        .with_line_breaks(!args.join_lines);

    let start_time = Instant::now();
    let mut total = RunStats::default();

    // An explicit output is shared by every input, in order
    let mut shared = match args.output.as_deref() {
        Some(output) => {
            let target = OutputTarget::resolve(Some(output), Path::new(""));
            Some(JsonLinesWriter::open(&target).with_context(|| format!("cannot open output {}", output))?)
        }
        None => None,
    };

    for file in &args.files {
        let progress_bar = if args.quiet { None } else { Some(create_progress_bar(file)) };
        let on_record = |count: usize| {
            if let Some(pb) = &progress_bar {
                pb.set_position(count as u64);
            }
        };

        let stats = match shared.as_mut() {
            Some(writer) => process_file_with_progress(file, &rules, config, writer, on_record),
            None => {
                let target = OutputTarget::resolve(None, file);
                let mut writer = JsonLinesWriter::open(&target)
                    .with_context(|| format!("cannot open output for {}", file.display()))?;
                process_file_with_progress(file, &rules, config, &mut writer, on_record)
            }
        }
        .with_context(|| format!("failed to convert {}", file.display()))?;

        if let Some(pb) = &progress_bar {
            pb.finish_and_clear();
        }
        total.merge(&stats);
    }

    info!(
        "Converted {} records from {} file(s) in {:.2}s ({} dropped, {} fields skipped, {} orphan lines)",
        total.records_emitted,
        args.files.len(),
        start_time.elapsed().as_secs_f64(),
        total.records_dropped,
        total.fields_skipped,
        total.orphan_lines
    );

    Ok(())
}

fn validate_arguments(args: &Arguments) -> Result<()> {
    for file in &args.files {
        if !file.is_file() {
            return Err(config_error(
                format!("input file does not exist or is not a file: {}", file.display()),
                Some("file"),
            ));
        }

        // Appending to the file being read would never terminate
        if let OutputTarget::File(output) = OutputTarget::resolve(args.output.as_deref(), file) {
            if same_file(&output, file) {
                return Err(config_error(
                    format!("output would overwrite the input {}", file.display()),
                    Some("output"),
                ));
            }
        }
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn create_progress_bar(file: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} records {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(file.display().to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// `AppiumCrab` - Appium server log timeline explorer
///
/// Copyright (C) 2026 Daniel Freiermuth
///
/// This program is free software: you can redistribute it and/or modify
/// it under the terms of the GNU General Public License as published by
/// the Free Software Foundation, either version 3 of the License, or
/// (at your option) any later version.
///
/// This program is distributed in the hope that it will be useful,
/// but WITHOUT ANY WARRANTY; without even the implied warranty of
/// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
/// GNU General Public License for more details.
///
/// You should have received a copy of the GNU General Public License
/// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use anyhow::{Context, Result};
use appiumcrab::config::GlobalConfig;
use appiumcrab::core::filter::{
    build_regex, category_is, contains_text, context_indices, matches_regex, slower_than,
};
use appiumcrab::export::{write_diagnostics, write_json, write_text, View};
use appiumcrab::{parse_log, LogEntry, LogModel};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "appiumcrab")]
#[command(author = "AppiumCrab Team")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Reconstruct Appium server logs into a timeline of HTTP exchanges", long_about = None)]
struct Args {
    /// Appium server log files to read
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Only show entries containing this text (plus context)
    #[arg(short, long)]
    search: Option<String>,

    /// Interpret --search as a regular expression
    #[arg(long, requires = "search")]
    regex: bool,

    /// Match --search case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Number of entries to show around every match
    #[arg(short = 'C', long, value_name = "N")]
    context: Option<usize>,

    /// Only show entries of this category, e.g. HTTP or "WD Proxy"
    #[arg(long, value_name = "NAME")]
    category: Option<String>,

    /// Only show HTTP lines of requests slower than this many milliseconds
    #[arg(long, value_name = "MS")]
    slower_than: Option<i64>,

    /// How many distinct recent lines to remember when collapsing repeats
    #[arg(long, value_name = "N")]
    window: Option<usize>,

    /// Keep repeated runs instead of collapsing them
    #[arg(long)]
    no_collapse: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Store the effective window, context and collapse settings as defaults
    #[arg(long)]
    save_config: bool,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json"
    )]
    profile_output: PathBuf,
}

fn main() -> Result<()> {
    // Logs go to stderr, stdout carries the timeline
    // Set RUST_LOG environment variable to override (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(
        "AppiumCrab starting up (version {})",
        env!("CARGO_PKG_VERSION")
    );

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", args.profile_output);
        dhat::Profiler::builder()
            .file_name(args.profile_output.clone())
            .build()
    };

    #[cfg(feature = "cpu-profiling")]
    {
        tracing::info!("CPU profiling enabled with Tracy - run Tracy profiler to connect");
    }

    let config = effective_config(&args, GlobalConfig::load());
    if args.save_config {
        let path = config.save()?;
        tracing::info!("Saved defaults to {}", path.display());
    }

    // Files are independent, so reconstruct them in parallel
    let options = config.pipeline_options();
    let models: Vec<Result<LogModel>> = args
        .files
        .par_iter()
        .map(|path| read_log(path).map(|content| parse_log(&content, &options)))
        .collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut stderr = std::io::stderr();
    for (path, model) in args.files.iter().zip(models) {
        let model = model?;
        if args.files.len() > 1 && matches!(args.format, OutputFormat::Text) {
            writeln!(out, "==> {} <==", path.display())?;
        }
        let indices = select(&args, &config, &model)?;
        let view = View::new(&model, &indices);
        match args.format {
            OutputFormat::Text => {
                write_text(&mut out, &view)?;
                write_diagnostics(&mut stderr, &model.diagnostics)?;
            }
            OutputFormat::Json => write_json(&mut out, &view)?,
        }
    }
    out.flush()?;
    Ok(())
}

/// Command line flags override the stored configuration.
fn effective_config(args: &Args, mut config: GlobalConfig) -> GlobalConfig {
    if let Some(window) = args.window {
        config.duplicate_window = window;
    }
    if let Some(context) = args.context {
        config.context_lines = context;
    }
    if args.no_collapse {
        config.collapse_duplicates = false;
    }
    if args.case_sensitive {
        config.case_sensitive = true;
    }
    config
}

fn read_log(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Cannot read file {}", path.display()))?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    // Lossy conversion, stray bytes must not abort a run
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Indices of the entries to print: every given predicate must hold.
fn select(args: &Args, config: &GlobalConfig, model: &LogModel) -> Result<Vec<usize>> {
    let mut predicates: Vec<Box<dyn Fn(&LogEntry) -> bool + '_>> = Vec::new();

    if let Some(search) = &args.search {
        if args.regex {
            let regex = build_regex(search, config.case_sensitive)
                .map_err(|e| anyhow::anyhow!("Invalid search pattern '{search}': {e}"))?;
            predicates.push(Box::new(matches_regex(regex)));
        } else {
            predicates.push(Box::new(contains_text(search, config.case_sensitive)));
        }
    }
    if let Some(category) = &args.category {
        predicates.push(Box::new(category_is(category)));
    }
    if let Some(threshold) = args.slower_than {
        predicates.push(Box::new(slower_than(model, threshold)));
    }

    if predicates.is_empty() {
        return Ok((0..model.entries.len()).collect());
    }
    let context = isize::try_from(config.context_lines).unwrap_or(isize::MAX);
    Ok(context_indices(
        &model.entries,
        |entry| predicates.iter().all(|p| p(entry)),
        context,
    ))
}

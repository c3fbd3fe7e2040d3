//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use scorepull_core::{PageOutcome, PageStatus, RunProgress, RunReport};
use scorepull_shared::{
    AppConfig, RunConfig, config_file_path, init_config, load_config, load_config_from,
    output_file_name, render_config,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// scorepull: pull a paginated score listing into one table.
#[derive(Parser)]
#[command(
    name = "scorepull",
    version,
    about = "Fetch every page of a paginated score listing and merge it into one CSV file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.scorepull/scorepull.toml.
    #[arg(long, global = true, env = "SCOREPULL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch all pages and write the merged table.
    Fetch {
        /// Exam year to extract.
        #[arg(short, long)]
        year: Option<i32>,

        /// Number of pages to request, starting at page 0.
        #[arg(short, long)]
        pages: Option<u32>,

        /// Maximum page fetches in flight.
        #[arg(short, long)]
        concurrency: Option<u32>,

        /// Output CSV path (defaults to <output_dir>/data_score_<year>.csv).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "scorepull=info",
        1 => "scorepull=debug",
        _ => "scorepull=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Fetch {
            year,
            pages,
            concurrency,
            out,
        } => {
            let overrides = FetchOverrides {
                year,
                pages,
                concurrency,
                out,
            };
            cmd_fetch(config_path, overrides).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn resolve_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(&path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// `fetch` flags that override config file values.
struct FetchOverrides {
    year: Option<i32>,
    pages: Option<u32>,
    concurrency: Option<u32>,
    out: Option<PathBuf>,
}

impl FetchOverrides {
    fn apply(self, app: &AppConfig) -> RunConfig {
        let mut config = RunConfig::from(app);
        if let Some(year) = self.year {
            config.year = year;
            // The default file name carries the year.
            config.output_path = PathBuf::from(&app.run.output_dir).join(output_file_name(year));
        }
        if let Some(pages) = self.pages {
            config.page_count = pages;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(out) = self.out {
            config.output_path = out;
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fetch(config_path: Option<PathBuf>, overrides: FetchOverrides) -> Result<()> {
    let app = resolve_config(config_path)?;
    let config = overrides.apply(&app);
    config.validate()?;

    info!(
        year = config.year,
        pages = config.page_count,
        concurrency = config.concurrency,
        out = %config.output_path.display(),
        "fetching score listing"
    );

    let progress = Arc::new(CliProgress::new(config.page_count as u64));
    let result = scorepull_core::extract(&config, progress).await?;
    let report = &result.report;

    for failure in report.failures() {
        if let PageStatus::Failed { kind, message } = &failure.status {
            warn!(page = failure.page_index, %kind, "{message}");
        }
    }

    println!();
    println!("  Extraction finished.");
    println!("  Run:      {}", report.run_id);
    println!("  Written:  {} pages", report.pages_written());
    println!("  Empty:    {} pages", report.pages_empty());
    println!("  Failed:   {} pages", report.pages_failed());
    println!("  Records:  {}", report.records_written());
    println!("  Output:   {}", result.output_path.display());
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    if let Some(e) = &report.finalize_error {
        return Err(eyre!("final write of {} failed: {e}", result.output_path.display()));
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = config_file_path()?;
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    let path = init_config()?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config_path)?;
    print!("{}", render_config(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar, one tick per finished page.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} pages {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl RunProgress for CliProgress {
    fn page_finished(&self, outcome: &PageOutcome, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
        let msg = match &outcome.status {
            PageStatus::Written { records } => {
                format!("page {}: {records} records", outcome.page_index)
            }
            PageStatus::Empty => format!("page {}: empty", outcome.page_index),
            PageStatus::Failed { kind, .. } => {
                format!("page {}: {kind} failure", outcome.page_index)
            }
        };
        self.bar.set_message(msg);
    }

    fn finished(&self, _report: &RunReport) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> FetchOverrides {
        FetchOverrides {
            year: None,
            pages: None,
            concurrency: None,
            out: None,
        }
    }

    #[test]
    fn defaults_pass_through() {
        let config = no_overrides().apply(&AppConfig::default());
        assert_eq!(config.year, 2015);
        assert_eq!(config.page_count, 200);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.output_path, PathBuf::from(".").join("data_score_2015.csv"));
    }

    #[test]
    fn year_flag_renames_default_output() {
        let overrides = FetchOverrides {
            year: Some(2017),
            ..no_overrides()
        };
        let config = overrides.apply(&AppConfig::default());
        assert_eq!(config.year, 2017);
        assert!(config.output_path.ends_with("data_score_2017.csv"));
    }

    #[test]
    fn explicit_out_wins_over_year() {
        let overrides = FetchOverrides {
            year: Some(2017),
            concurrency: Some(4),
            out: Some(PathBuf::from("/tmp/scores.csv")),
            ..no_overrides()
        };
        let config = overrides.apply(&AppConfig::default());
        assert_eq!(config.output_path, PathBuf::from("/tmp/scores.csv"));
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn cli_parses_fetch_flags() {
        let cli = Cli::try_parse_from([
            "scorepull", "-v", "fetch", "--year", "2016", "--pages", "10", "-c", "3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Fetch {
                year,
                pages,
                concurrency,
                out,
            } => {
                assert_eq!(year, Some(2016));
                assert_eq!(pages, Some(10));
                assert_eq!(concurrency, Some(3));
                assert!(out.is_none());
            }
            Command::Config { .. } => panic!("expected fetch"),
        }
    }
}

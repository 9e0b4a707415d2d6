use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use scrollfeed::api::{self, HttpPageSource, MockApi, initial_page};
use scrollfeed::calendar::{self, Week};
use scrollfeed::loader::{InfiniteLoader, LoadOutcome, PageSource, SkipReason};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

/// Poll interval while the loop guard is cooling off
const COOLDOWN_POLL: Duration = Duration::from_millis(250);

fn setup_logging(level: Option<log::LevelFilter>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scrollfeed")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("scrollfeed.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the config level
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.unwrap_or(log::LevelFilter::Info));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Serve {
            addr,
            delay_ms,
            failure_rate,
        } => handle_serve_command(addr.as_deref(), *delay_ms, *failure_rate, config).await,
        Commands::Scroll { url, max_retries } => handle_scroll_command(url.as_deref(), *max_retries, config).await,
        Commands::Calendar { start, weeks, json } => handle_calendar_command(start.as_deref(), *weeks, *json, config),
    }
}

async fn handle_serve_command(
    addr: Option<&str>,
    delay_ms: Option<u64>,
    failure_rate: Option<f64>,
    config: &Config,
) -> Result<()> {
    let mut server = config.server.clone();
    if let Some(addr) = addr {
        server.addr = addr.to_string();
    }
    if let Some(delay_ms) = delay_ms {
        server.delay_ms = delay_ms;
    }
    if let Some(failure_rate) = failure_rate {
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(eyre!("failure rate must be between 0.0 and 1.0, got {}", failure_rate));
        }
        server.failure_rate = failure_rate;
    }

    info!("Serving mock API on {}", server.addr);
    println!(
        "{} http://{} (delay {}ms, failure rate {:.0}%)",
        "Serving mock API on".green(),
        server.addr,
        server.delay_ms,
        server.failure_rate * 100.0
    );
    println!("  POST/GET /api/data, GET /api/initial, GET /health. Ctrl-C to stop.");

    api::run_serve(&server.addr, MockApi::new(server.mock_api_config()))
        .await
        .context(format!("Mock API server on {} failed", server.addr))
}

async fn handle_scroll_command(url: Option<&str>, max_retries: u32, config: &Config) -> Result<()> {
    match url {
        Some(url) => {
            info!("Scrolling remote feed at {}", url);
            let source = HttpPageSource::new(url).context("Failed to build HTTP client")?;
            scroll_feed(source, max_retries, config).await
        }
        None => {
            info!("Scrolling in-process mock feed");
            scroll_feed(MockApi::new(config.server.mock_api_config()), max_retries, config).await
        }
    }
}

/// Keep triggering loads until the feed completes, retrying failed pages.
async fn scroll_feed<S: PageSource>(source: S, max_retries: u32, config: &Config) -> Result<()> {
    let mut loader = InfiniteLoader::new(source, config.loader.guard_config(), config.loader.page_size)
        .with_initial(initial_page().items);
    loader.mount();
    println!("{} {} items already on the page", "Start:".cyan(), loader.items().len());

    let mut retries = 0;
    let mut cooling_reported = false;
    loop {
        let outcome = if loader.state().is_error() {
            loader.retry().await
        } else {
            loader.attempt_load().await
        };

        match outcome {
            LoadOutcome::Loaded { added } => {
                retries = 0;
                cooling_reported = false;
                println!(
                    "{} +{} items ({}/{})",
                    "Loaded:".green(),
                    added,
                    loader.items().len(),
                    loader.total_count().unwrap_or_default()
                );
            }
            LoadOutcome::Complete { added } => {
                println!(
                    "{} +{} items, all {} loaded",
                    "Complete:".green(),
                    added,
                    loader.items().len()
                );
                break;
            }
            LoadOutcome::Skipped(SkipReason::Complete | SkipReason::Unmounted) => break,
            LoadOutcome::Skipped(SkipReason::CoolingOff) => {
                if !cooling_reported {
                    println!("{} too many loads in a row, cooling off", "Loop guard:".yellow());
                    cooling_reported = true;
                }
                tokio::time::sleep(COOLDOWN_POLL).await;
            }
            LoadOutcome::Skipped(reason) => {
                log::debug!("Scroll trigger skipped: {:?}", reason);
                tokio::time::sleep(COOLDOWN_POLL).await;
            }
            LoadOutcome::Failed(e) => {
                println!("{} {}", "Failed:".red(), e);
                if retries >= max_retries {
                    loader.unmount();
                    return Err(eyre!(
                        "giving up after {} retries at item {}: {}",
                        retries,
                        loader.items().len(),
                        e
                    ));
                }
                retries += 1;
                println!("  retrying ({}/{})", retries, max_retries);
            }
        }
    }

    loader.unmount();
    Ok(())
}

fn handle_calendar_command(start: Option<&str>, weeks: Option<usize>, json: bool, config: &Config) -> Result<()> {
    let count = weeks.unwrap_or(config.calendar.weeks);
    let generated = match start {
        Some(start) => {
            let date = calendar::parse_date(start).context("Invalid --start date")?;
            calendar::generate_calendar_weeks_from(date, count)?
        }
        None => calendar::generate_calendar_weeks_from_current(count)?,
    };
    info!("Generated {} calendar weeks", generated.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&generated)?);
    } else {
        for week in &generated {
            print_week(week);
        }
    }
    Ok(())
}

fn print_week(week: &Week) {
    println!(
        "{} {}  {} .. {}",
        "Week".cyan(),
        format!("{:>2}", week.week_number).bold(),
        week.start_date,
        week.end_date
    );
    for day in &week.days {
        println!("  {} {:<9} {} activities", day.date, day.day_name, day.activities);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging at the configured level
    setup_logging(config.level_filter()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

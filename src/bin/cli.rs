//! gradewatch CLI
//!
//! Local execution entry point: one-off checks, stored-grade listings and
//! the periodic monitor.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gradewatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{
        self, CheckOutcome, CheckSession, ExamOutcome, MonitorOptions, render_changes,
        render_exams, render_full, render_status, render_summary,
    },
    services::{ConsoleNotifier, HttpScraper, Notifier, PortalScraper, SavedPageScraper, TelegramNotifier},
    storage::{LocalStorage, SnapshotStore},
};

/// gradewatch - Student Portal Grade Watcher
#[derive(Parser, Debug)]
#[command(
    name = "gradewatch",
    version,
    about = "Watches a student portal for new grades and exam dates"
)]
struct Cli {
    /// Path to storage directory containing config.toml and the snapshot
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one check cycle and print the changes
    Check {
        /// Read the grades page from a saved HTML file instead of the portal
        #[arg(long)]
        grades_html: Option<PathBuf>,

        /// Read the exam schedule from a saved HTML file instead of the portal
        #[arg(long)]
        exams_html: Option<PathBuf>,

        /// Also deliver the result through Telegram
        #[arg(long)]
        notify: bool,
    },

    /// List every stored course with its components
    Show,

    /// Show the stored grade summary
    Status,

    /// Check periodically and notify on changes; prints the session status
    /// when the loop ends
    Monitor {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Validate configuration
    Validate,

    /// Show storage info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_scraper(
    config: &Config,
    grades_html: Option<PathBuf>,
    exams_html: Option<PathBuf>,
) -> Result<Box<dyn PortalScraper>> {
    if grades_html.is_some() || exams_html.is_some() {
        log::info!("Using saved portal pages");
        return Ok(Box::new(SavedPageScraper::new(grades_html, exams_html)));
    }
    Ok(Box::new(HttpScraper::new(&config.portal)?))
}

fn build_notifier(config: &Config, use_telegram: bool) -> Result<Box<dyn Notifier>> {
    if use_telegram && config.telegram.is_configured() {
        return Ok(Box::new(TelegramNotifier::new(
            &config.telegram,
            config.portal.timeout_secs,
        )?));
    }
    if use_telegram {
        log::warn!("Telegram is not configured; printing notifications instead");
    }
    Ok(Box::new(ConsoleNotifier))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    config.apply_env();
    init_logging(cli.verbose, &config.logging.level);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let grades_path = config.grades_path(&cli.storage_dir);

    match cli.command {
        Command::Check {
            grades_html,
            exams_html,
            notify,
        } => {
            let store = LocalStorage::open(&grades_path)?;
            let scraper = build_scraper(&config, grades_html, exams_html)?;
            let notifier = build_notifier(&config, notify)?;
            let mut session = CheckSession::new();

            match pipeline::run_check(&mut session, scraper.as_ref(), &store).await? {
                CheckOutcome::ScrapeFailed => {
                    log::error!("Login failed or the grades page was unavailable");
                    return Err(AppError::validation("grade scrape produced no result"));
                }
                CheckOutcome::Completed { events, snapshot } => {
                    if events.is_empty() {
                        log::info!("No grade changes");
                    } else {
                        notifier.send(&render_changes(&events)).await?;
                    }
                    if !notify {
                        println!("{}", render_full(&snapshot));
                    }
                }
            }

            if config.monitor.notify_exams {
                match pipeline::run_exam_check(&mut session, scraper.as_ref()).await {
                    ExamOutcome::Published { exams } => {
                        notifier.send(&render_exams(&exams)).await?
                    }
                    ExamOutcome::Unchanged { count } => log::info!("{} exams listed", count),
                    ExamOutcome::ScrapeFailed => log::info!("No exam schedule available"),
                }
            }
        }

        Command::Show => {
            let store = LocalStorage::new(&grades_path);
            println!("{}", render_full(&store.load()));
        }

        Command::Status => {
            let store = LocalStorage::new(&grades_path);
            println!("{}", render_summary(&store.load()));
        }

        Command::Monitor { once } => {
            config.validate()?;
            let store = LocalStorage::open(&grades_path)?;
            let scraper = build_scraper(&config, None, None)?;
            let notifier = build_notifier(&config, true)?;
            let mut session = CheckSession::new();

            let mut options = MonitorOptions::from(&config.monitor);
            if once {
                options.max_cycles = Some(1);
            }

            pipeline::run_monitor(
                &options,
                &mut session,
                scraper.as_ref(),
                &store,
                notifier.as_ref(),
            )
            .await;

            println!(
                "{}",
                render_status(&session, config.monitor.check_interval_secs, &store.load())
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let missing = config.missing_credentials();
            if missing.is_empty() {
                log::info!("All validations passed!");
            } else {
                log::warn!("Missing settings: {}", missing.join(", "));
            }
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Snapshot file: {}", grades_path.display());

            if grades_path.exists() {
                let snapshot = LocalStorage::new(&grades_path).load();
                log::info!(
                    "Stored: {} courses, {} components",
                    snapshot.len(),
                    snapshot.component_count()
                );
            } else {
                log::info!("No snapshot found yet.");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

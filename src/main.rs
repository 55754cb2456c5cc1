use anyhow::Context;
use clap::Parser;
use ddwatch::alerts::RunSummary;
use ddwatch::config::TelegramCredentials;
use ddwatch::Monitor;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;

/// Command-line arguments for the outage monitor
#[derive(Parser)]
#[command(
    name = "ddwatch",
    about = "Poll Downdetector for configured services and alert on Telegram",
    long_about = "Runs a single polling pass: fetches the latest Downdetector report counts for \
                  each configured service, sends a Telegram alert when a count exceeds the \
                  threshold and the service is off cooldown, then saves the alert state and exits. \
                  Requires TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID unless --dry-run is given."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "services.json",
        help = "Configuration file path (JSON, or TOML with a .toml extension)"
    )]
    config: PathBuf,

    /// Path to state file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "state.json",
        help = "Alert state file path, created on first run"
    )]
    state: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging output (debug level)")]
    verbose: bool,

    /// Log alerts instead of sending them
    #[arg(
        long,
        help = "Evaluate services and log alerts without sending them or saving state"
    )]
    dry_run: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if self.config.exists() && !self.config.is_file() {
            return Err(format!(
                "Configuration path is not a file: {}",
                self.config.display()
            ));
        }

        if let Some(extension) = self.config.extension() {
            if extension != "json" && extension != "toml" {
                warn!(
                    "Configuration file has neither .json nor .toml extension, parsing as JSON: {}",
                    self.config.display()
                );
            }
        }

        if self.state.is_dir() {
            return Err(format!(
                "State path is a directory: {}",
                self.state.display()
            ));
        }

        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

/// Load everything that can fail fatally, then run the polling pass
async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    cli.validate().map_err(anyhow::Error::msg)?;

    let config = Monitor::load_config(&cli.config)
        .with_context(|| format!("cannot load configuration {}", cli.config.display()))?;

    let credentials = if cli.dry_run {
        info!("Dry run: alerts will be logged, not sent");
        None
    } else {
        Some(TelegramCredentials::from_env()?)
    };

    let monitor = Monitor::live(config, cli.state.clone(), credentials)?;
    let summary = monitor
        .run_once()
        .await
        .with_context(|| format!("cannot save state {}", cli.state.display()))?;

    Ok(summary)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(summary) => {
            println!("Done. Alerts sent: {}", summary.alerts_sent);
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

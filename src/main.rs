use std::io::IsTerminal;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use check_jitsi::config_generator::icinga_command_config_from_env;
use check_jitsi::{
    CheckConfig, CheckEngine, CheckError, HttpTransport, Mode, Resource, Runner, ServiceState,
};

/// Check command for JVB via API
#[derive(Debug, Parser)]
#[command(name = "check_jitsi", version)]
struct Cli {
    /// JVB private api hostname
    #[arg(short = 'H', long, default_value = "localhost")]
    hostname: String,
    /// JVB private api port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    /// Check mode
    #[arg(short, long, value_enum)]
    mode: Mode,
    /// Warning threshold for check value
    #[arg(short, long, value_name = "THRESHOLD", default_value = "")]
    warning: String,
    /// Critical threshold for check value
    #[arg(short, long, value_name = "THRESHOLD", default_value = "")]
    critical: String,
    /// Add all metrics to the performance data
    #[arg(long)]
    all_metrics: bool,
    /// Ignore this metric in the performance data
    #[arg(long = "ignore-metric", value_name = "METRIC")]
    ignore_metrics: Vec<String>,
    /// Append this metric in the performance data
    #[arg(long = "append-metric", value_name = "METRIC")]
    append_metrics: Vec<String>,
    /// Connect and read timeout in seconds
    #[arg(short, long, value_name = "SECONDS", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
    /// Log debug information to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<CheckConfig, CheckError> {
        let mut config = CheckConfig::new(&self.hostname, self.port, self.mode)
            .with_thresholds(&self.warning, &self.critical)?;
        config.all_metrics = self.all_metrics;
        config.ignore_metrics = self.ignore_metrics;
        config.append_metrics = self.append_metrics;
        config.timeout = Duration::from_secs(self.timeout);
        Ok(config)
    }
}

fn main() {
    match icinga_command_config_from_env("check-jitsi", &Cli::command()) {
        Ok(Some(out)) => {
            println!("{}", out.trim());
            std::process::exit(0);
        }
        Ok(None) => {}
        Err(e) => {
            println!("{} - {e}", ServiceState::Unknown);
            std::process::exit(ServiceState::Unknown.exit_code());
        }
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors must not be mistaken for CRITICAL (clap exits with 2).
            let _ = e.print();
            std::process::exit(ServiceState::Unknown.exit_code());
        }
    };

    init_logging(cli.verbose);

    Runner::new(ServiceState::Unknown)
        .safe_run(|| run(cli))
        .print_and_exit()
}

fn run(cli: Cli) -> Result<Resource, CheckError> {
    let config = cli.into_config()?;
    debug!(?config, "starting check");

    let transport = HttpTransport::new(config.timeout)?;
    CheckEngine::new(config, &transport).run()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        // monitoring systems may fold stderr into the plugin output
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

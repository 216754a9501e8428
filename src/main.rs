//! Command-line entry point for the scheduled license request.
//!
//! Credentials come from the environment (see `RequesterConfig::from_env`).
//! The exit code is the contract with the scheduler: 0 on success, a
//! distinct nonzero code per failure kind otherwise.

use clap::{ArgAction, Parser};
use nexacro_license::{logging, LicenseRequester, RequesterConfig, RequesterError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Exit code for failures outside the request workflow.
const EXIT_INTERNAL: u8 = 1;

/// Request a Nexacro license email from the TOBESOFT support portal.
#[derive(Debug, Parser)]
#[command(name = "nexacro-license", version, about)]
struct Cli {
    /// Also write logs to a file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Total attempts per step for network failures (overrides NEXACRO_MAX_ATTEMPTS)
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Per-request timeout in seconds (overrides NEXACRO_REQUEST_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.log_dir.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_INTERNAL);
    }

    let requester = match load_config(&cli).and_then(LicenseRequester::new) {
        Ok(requester) => requester,
        Err(e) => {
            error!(kind = %e.kind(), "{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let report = requester.run();

    if let Some(path) = &cli.summary {
        match report.write_json(path) {
            Ok(()) => info!(path = %path.display(), "Run report written"),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write run report");
                if report.success {
                    return ExitCode::from(EXIT_INTERNAL);
                }
            }
        }
    }

    ExitCode::from(report.exit_code())
}

/// Load the environment config and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<RequesterConfig, RequesterError> {
    let mut config = RequesterConfig::from_env()?;
    if let Some(max_attempts) = cli.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    config.validate()?;
    Ok(config)
}

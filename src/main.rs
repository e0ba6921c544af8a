use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use spamtroll_panel::api::{ApiClient, ApiResponse};
use spamtroll_panel::args::Command;
use spamtroll_panel::config::Settings;
use spamtroll_panel::dashboard::{print_stats, Dashboard};
use spamtroll_panel::utils::{setup_logging, validate_args};
use spamtroll_panel::Args;

fn print_api_response(response: &ApiResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if !response.success {
        if let Some(message) = &response.error {
            error!(action = "complete", component = "api_client", error = %message, "API call failed");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;

    match args.command {
        Command::Stats {
            no_cache,
            json,
            top,
            redact,
        } => {
            let snapshot = Dashboard::new(&settings).get_stats(!no_cache);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_stats(&snapshot, top, redact);
            }
        }
        Command::Logs { count } => {
            for line in Dashboard::new(&settings).get_recent_logs(count) {
                println!("{line}");
            }
        }
        Command::ClearCache => {
            Dashboard::new(&settings).clear_cache();
            println!("Statistics cache cleared");
        }
        Command::TestConnection => {
            print_api_response(&ApiClient::new(&settings).test_connection())?;
        }
        Command::Usage => {
            print_api_response(&ApiClient::new(&settings).get_account_usage())?;
        }
        Command::Check { content, source } => {
            print_api_response(&ApiClient::new(&settings).check_spam(&content, &source))?;
        }
    }

    Ok(())
}

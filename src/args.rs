use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "spamtroll-panel",
    about = "Spam filter dashboard statistics and remote API checks",
    version,
    long_about = None
)]
pub struct Args {
    /// Path to the TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show statistics derived from the filter log
    Stats {
        /// Ignore the cached snapshot and re-parse the log
        #[arg(long)]
        no_cache: bool,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Number of top blocked domains to display
        #[arg(short, long, default_value_t = 10)]
        top: usize,

        /// Redact domain names for privacy
        #[arg(long)]
        redact: bool,
    },

    /// Print the most recent raw log lines, newest first
    Logs {
        /// Number of lines
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,
    },

    /// Drop the cached statistics
    ClearCache,

    /// Check connectivity to the scoring API
    TestConnection,

    /// Show account usage reported by the scoring API
    Usage,

    /// Submit sample content for a spam check
    Check {
        /// Content to score
        content: String,

        /// Source tag sent with the content
        #[arg(short, long, default_value = "email")]
        source: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stats_flags() {
        let args = Args::try_parse_from(["spamtroll-panel", "stats", "--no-cache", "--top", "3"]).unwrap();
        match args.command {
            Command::Stats { no_cache, top, json, .. } => {
                assert!(no_cache);
                assert!(!json);
                assert_eq!(top, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_defaults_to_email_source() {
        let args =
            Args::try_parse_from(["spamtroll-panel", "-c", "/etc/spamtroll.toml", "check", "buy now"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/spamtroll.toml")));
        match args.command {
            Command::Check { content, source } => {
                assert_eq!(content, "buy now");
                assert_eq!(source, "email");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn zero_counts_are_rejected() {
        let args = Args::try_parse_from(["spamtroll-panel", "logs", "-n", "0"]).unwrap();
        assert!(crate::utils::validate_args(&args).is_err());

        let args = Args::try_parse_from(["spamtroll-panel", "logs"]).unwrap();
        assert!(crate::utils::validate_args(&args).is_ok());
    }
}

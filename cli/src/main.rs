//! sttk: replay staking/vendor scenarios and quote rewards.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sttk_cli::{quote, run, Scenario};
use sttk_staking::StakingConfig;
use sttk_types::{Amount, BasisPoints};
use sttk_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "sttk", about = "STTK staking rewards and token vendor toolkit")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, default_value = "info", env = "STTK_LOG_LEVEL")]
    log_level: String,

    /// Log output format: "human" or "json".
    #[arg(long, default_value = "human", env = "STTK_LOG_FORMAT")]
    log_format: LogFormat,

    /// Path to a TOML staking configuration. Defaults apply when omitted.
    #[arg(long, env = "STTK_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file and print its events as JSON lines.
    Replay {
        /// Scenario TOML file.
        scenario: PathBuf,

        /// Abort on the first rejected step.
        #[arg(long)]
        strict: bool,

        /// Pretty-print the final summary.
        #[arg(long)]
        pretty: bool,
    },
    /// Quote the reward for a stake held from the start of a window.
    Quote {
        #[arg(long)]
        amount: Amount,

        /// Annual rate in basis points (800 = 8%).
        #[arg(long)]
        rate: u32,

        /// Reward window length in days.
        #[arg(long)]
        window_days: u64,

        /// Holding time in days; defaults to the window length.
        #[arg(long)]
        held_days: Option<u64>,
    },
    /// Print the effective staking configuration as TOML.
    Config,
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    let config = match &cli.config {
        Some(path) => {
            let config = StakingConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded staking config");
            config
        }
        None => StakingConfig::default(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Replay {
            scenario,
            strict,
            pretty,
        } => {
            let parsed = Scenario::from_toml_file(&scenario)?;
            let outcome = run(&parsed, config, strict)
                .with_context(|| format!("replaying {}", scenario.display()))?;
            for record in &outcome.records {
                print_json(&mut out, record, false)?;
            }
            print_json(&mut out, &outcome.summary, pretty)?;
        }
        Command::Quote {
            amount,
            rate,
            window_days,
            held_days,
        } => {
            let held_days = held_days.unwrap_or(window_days);
            let q = quote(&config, amount, BasisPoints::new(rate), window_days, held_days)?;
            print_json(&mut out, &q, true)?;
        }
        Command::Config => {
            write!(out, "{}", config.to_toml_string()?)?;
        }
    }

    Ok(())
}

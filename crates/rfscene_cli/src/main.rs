//! rfscene CLI
//!
//! Runs scenario requests (JSON) through the allocation engine and prints
//! the configuration schema.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "rfscene")]
#[command(about = "Allocate spectrum, power and activity for simulated wireless scenes", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run a scenario request file
    Run {
        /// Scenario request JSON
        #[arg(long)]
        request: PathBuf,

        /// Write the frames here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of frames (overrides the request)
        #[arg(long)]
        frames: Option<u32>,

        /// Scenario seed (overrides the request)
        #[arg(long)]
        seed: Option<u64>,

        /// Print a per-transmitter summary instead of the frames
        #[arg(long, default_value = "false")]
        summary: bool,
    },

    /// Print the JSON schema of the scenario configuration
    Schema,
}

#[cfg(feature = "cli")]
fn init_logging(format: LogFormat) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr so stdout stays clean for JSON output.
    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init(),
        LogFormat::Pretty => {
            registry.with(fmt::layer().pretty().with_writer(std::io::stderr)).try_init()
        }
        LogFormat::Compact => {
            registry.with(fmt::layer().compact().with_writer(std::io::stderr)).try_init()
        }
    };
    let _ = result;
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.command {
        Commands::Run { request, out, frames, seed, summary } => {
            let loaded = rfscene_cli::load_request(&request)?;
            let response =
                rfscene_cli::run_request(loaded, rfscene_cli::RunOverrides { frames, seed })?;

            if summary {
                print!("{}", rfscene_cli::summarize(&response));
            }
            match out {
                Some(path) => {
                    rfscene_cli::write_response(&path, &response)?;
                    tracing::info!(path = %path.display(), "frames written");
                }
                None if !summary => println!("{}", serde_json::to_string_pretty(&response)?),
                None => {}
            }
        }

        Commands::Schema => {
            println!("{}", rfscene_core::config_schema_json()?);
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("rfscene CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}

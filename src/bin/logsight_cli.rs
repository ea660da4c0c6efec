use std::path::PathBuf;
use structopt::StructOpt;

use logsight::analysis::Analyzer;
use logsight::config::AnalysisConfig;
use logsight::output::{OutputFormat, OutputHandler};

/// API request-log analytics command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "logsight", about = "API request-log analytics CLI")]
pub enum Cli {
    /// Analyze a batch of request logs
    Analyze {
        /// Path to the log batch (JSON array or JSON Lines)
        #[structopt(short, long)]
        input: PathBuf,
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Report format: "json" or "console"
        #[structopt(short, long, default_value = "console")]
        format: String,
        /// Write the report to a file instead of stdout
        #[structopt(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Analyze {
            input,
            config,
            format,
            output,
        } => {
            let config = if config.exists() {
                AnalysisConfig::from_file(&config)?
            } else {
                log::warn!("Config file not found, using default thresholds");
                AnalysisConfig::default()
            };

            let logs = logsight::input::read_records(&input)?;
            log::info!("Loaded {} raw record(s) from {:?}", logs.len(), input);

            let result = Analyzer::with_config(config).analyze(&logs);
            if result.skipped_records > 0 {
                log::warn!("Skipped {} malformed record(s)", result.skipped_records);
            }

            let mut handler = OutputHandler::new(OutputFormat::from_str(&format), output)?;
            handler.write_report(&result)?;
        }
        Cli::Config { output } => {
            let config = AnalysisConfig::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
    }

    Ok(())
}

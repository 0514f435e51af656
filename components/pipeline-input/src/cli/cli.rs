use crate::{
    helpers::load_config::Config, input::input::validate_input_config, runtime,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pipeline-input",
    long_about = "Reads messages from a configured input and writes them to stdout. \
    A read_until input ends the stream once a message satisfying its condition is written.",
    about = "Pipeline inputs with read_until termination",
    version,
    term_width = 100,
    color = clap::ColorChoice::Always,
    after_help = "\
    EXAMPLES:
        pipeline-input run --config /etc/pipeline_input.toml
        pipeline-input validate --config ./your_config.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured input, writing every message to stdout
    Run {
        #[arg(short, long, default_value = "/etc/pipeline_input.toml")]
        config: PathBuf,
    },

    /// Validate the configuration file before running
    Validate {
        #[arg(short, long, default_value = "/etc/pipeline_input.toml")]
        config: PathBuf,
    },

    /// Display version information
    Version,
}

/// Entry function for CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => runtime::runtime::run_pipeline(config).await?,
        Commands::Validate { config } => validate_config(config)?,
        Commands::Version => show_version(),
    }

    Ok(())
}

//
// ------------------------ Command Implementations ------------------------------
//

/// Validate configuration file, no input is started
fn validate_config(config: PathBuf) -> Result<()> {
    eprintln!("Validating configuration file: {:?}", config);
    let cfg = Config::load(&config)?;
    validate_input_config(&cfg.input).context("Invalid input configuration")?;

    let rendered = serde_json::to_string_pretty(&cfg)?;
    println!("{rendered}");
    eprintln!("Configuration valid");
    Ok(())
}

/// Show version information
fn show_version() {
    println!("Pipeline Input {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_config() {
        let cli = Cli::try_parse_from(["pipeline-input", "run", "--config", "./p.toml"]).unwrap();
        match cli.command {
            Commands::Run { config } => assert_eq!(config, PathBuf::from("./p.toml")),
            _ => panic!("expected run"),
        }
    }
}

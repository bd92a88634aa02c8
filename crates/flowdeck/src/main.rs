// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flowdeck - administrative dashboard for a scientific workflow engine.
//!
//! This is the binary entry point for the dashboard server.

use clap::{Parser, Subcommand};

mod serve;

/// Flowdeck - administrative dashboard for a scientific workflow engine.
#[derive(Parser, Debug)]
#[command(name = "flowdeck", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dashboard server.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match flowdeck_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            flowdeck_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(error) = serve::run_serve(config).await {
                eprintln!("flowdeck serve failed: {error}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => {
                eprintln!("failed to render configuration: {error}");
                std::process::exit(1);
            }
        },
        None => {
            println!("flowdeck: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config = flowdeck_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn cli_parses_serve_subcommand() {
        use clap::Parser;
        let cli = super::Cli::parse_from(["flowdeck", "serve"]);
        assert!(matches!(cli.command, Some(super::Commands::Serve)));
    }
}

//! Blackbar command-line interface.
//!
//! `blackbar extract` catalogues redactions across a directory of PDFs;
//! `blackbar identify` ranks candidate strings against a written catalogue.
//! Exit codes: 0 on success, 1 on internal error, 130 on operator
//! interrupt. Progress goes to stderr via `tracing`.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{extract::ExtractArgs, identify::IdentifyArgs};

#[derive(Parser)]
#[command(
    name = "blackbar",
    version,
    about = "Catalogue and identify black-bar redactions in PDF documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a structured catalogue of every redaction in a PDF corpus
    Extract(ExtractArgs),
    /// Rank candidate strings against an extracted catalogue
    Identify(IdentifyArgs),
}

/// Exit code for an operator interrupt, by Unix convention 128 + SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

fn init_tracing(verbose: bool) {
    let default = if verbose { "blackbar=debug,blackbar_cli=debug" } else { "blackbar=info,blackbar_cli=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Extract(args) => {
            init_tracing(args.verbose);
            commands::extract::run(args)
        }
        Command::Identify(args) => {
            init_tracing(args.verbose);
            commands::identify::run(args)
        }
    };

    match result {
        Ok(commands::Outcome::Completed) => ExitCode::SUCCESS,
        Ok(commands::Outcome::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn extract_flags_parse() {
        let cli = Cli::try_parse_from([
            "blackbar", "extract", "--input", "in", "--output", "out", "--threshold", "40",
            "--workers", "8", "--dpi", "300", "--subset", "5", "--no-images", "--verbose",
        ])
        .unwrap();
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.threshold, 40);
                assert_eq!(args.workers, 8);
                assert_eq!(args.dpi, 300);
                assert_eq!(args.subset, Some(5));
                assert!(args.no_images);
                assert!(args.verbose);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn identify_flags_parse_with_repeated_lists() {
        let cli = Cli::try_parse_from([
            "blackbar", "identify", "--catalogue", "out/catalogue.json", "--pdf-dir", "in",
            "--output", "out", "--candidates", "a.txt", "--candidates", "b.json", "--top", "10",
        ])
        .unwrap();
        match cli.command {
            Command::Identify(args) => {
                assert_eq!(args.candidates.len(), 2);
                assert_eq!(args.top, 10);
                assert_eq!(args.min_width, 10.0);
            }
            _ => panic!("expected identify"),
        }
    }
}

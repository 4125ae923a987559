// Copyright 2026 cadastro-ie contributors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use cadastro_ie::cli::{lookup_cmd, output, search_cmd};
use cadastro_ie::config::ClientConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cadastro",
    about = "cadastro — query the Bahia SEFAZ state-registration registry",
    version,
    after_help = "Run 'cadastro <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, default_value = "15000")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up registrations by state registration number (IE)
    Ie {
        /// IE number; punctuation is stripped before submission
        number: String,
    },
    /// Look up registrations by CNPJ
    Cnpj {
        /// CNPJ; punctuation is stripped before submission
        number: String,
    },
    /// Search with any combination of filters
    Search {
        /// CNPJ filter
        #[arg(long)]
        cnpj: Option<String>,
        /// IE filter
        #[arg(long)]
        ie: Option<String>,
        /// State code filter (e.g. "BA")
        #[arg(long)]
        uf: Option<String>,
        /// Status code filter ("99" = all)
        #[arg(long)]
        situacao: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("CADASTRO_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("CADASTRO_QUIET", "1");
    }

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("cadastro_ie=debug".parse().unwrap()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = ClientConfig::default().with_timeout_ms(cli.timeout);

    let result = match cli.command {
        Commands::Ie { number } => lookup_cmd::run_ie(&number, config).await,
        Commands::Cnpj { number } => lookup_cmd::run_cnpj(&number, config).await,
        Commands::Search {
            cnpj,
            ie,
            uf,
            situacao,
        } => search_cmd::run(cnpj, ie, uf, situacao, config).await,
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }
    Ok(())
}

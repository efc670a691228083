//! Sift CLI
//!
//! Command-line tools for inspecting Sift query texts.
//!
//! # Commands
//!
//! - `parse` - Parse a query and print its canonical text
//! - `classify` - Count clauses and list the fields a query touches
//! - `relocate` - Move settings keywords to the end of a query
//! - `substitute` - Fill `@N` placeholders of a template
//! - `fragments` - List the nested `{{ }}` queries of a text

mod commands;

use clap::{Parser, Subcommand};
use commands::Format;
use tracing_subscriber::EnvFilter;

/// Sift command-line query tools.
#[derive(Parser)]
#[command(name = "sift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its canonical text
    Parse {
        /// Query text
        query: String,

        /// Inject the implicit filters before printing
        #[arg(short, long)]
        prepare: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Count clauses and list the fields a query touches
    Classify {
        /// Query text
        query: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Move settings keywords to the end of a query
    Relocate {
        /// Query text
        query: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Fill `@N` placeholders of a template
    Substitute {
        /// Template text
        template: String,

        /// Parameters in order; JSON values are taken as typed, anything else as text
        params: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the nested `{{ }}` queries of a text
    Fragments {
        /// Query text
        query: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse {
            query,
            prepare,
            format,
        } => commands::parse::run(&query, prepare, format)?,
        Commands::Classify { query, format } => commands::classify::run(&query, format)?,
        Commands::Relocate { query, format } => commands::relocate::run(&query, format)?,
        Commands::Substitute {
            template,
            params,
            format,
        } => commands::substitute::run(&template, &params, format)?,
        Commands::Fragments { query, format } => commands::fragments::run(&query, format)?,
        Commands::Version => {
            println!("Sift CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Sift Core v{}", sift_core::VERSION);
        }
    }

    Ok(())
}

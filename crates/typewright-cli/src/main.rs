use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use typewright::boxing::{self, BoxingOptions};
use typewright::consolidate::{self, ConsolidateOptions};

#[derive(Parser)]
#[command(name = "typewright")]
#[command(about = "Post-process generated message-type definitions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply heap indirection to deeply nested or recursive fields
    #[command(name = "box")]
    Boxing {
        /// Directory containing generated source files
        directory: PathBuf,

        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save the effective configuration to a JSON file
        #[arg(long)]
        save_config: Option<PathBuf>,

        /// Show what would change without modifying files
        #[arg(long)]
        dry_run: bool,

        /// Override the minimum-fields threshold
        #[arg(long)]
        min_fields: Option<usize>,

        /// Override the maximum nesting depth
        #[arg(long)]
        max_depth: Option<u32>,

        /// Disable the pattern strategies
        #[arg(long)]
        no_patterns: bool,

        /// Disable the size heuristic
        #[arg(long)]
        no_size: bool,

        /// Disable the nesting-depth analysis
        #[arg(long)]
        no_nesting: bool,
    },

    /// Move duplicated type definitions into the shared module
    Consolidate {
        /// Directory containing generated source files
        directory: PathBuf,

        /// File-count floor beyond which a type is relocated
        #[arg(default_value_t = 1)]
        typecount: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug)
        .init();

    match cli.command {
        Commands::Boxing {
            directory,
            config,
            save_config,
            dry_run,
            min_fields,
            max_depth,
            no_patterns,
            no_size,
            no_nesting,
        } => {
            boxing::run(&BoxingOptions {
                directory,
                config,
                save_config,
                dry_run,
                verbose: cli.verbose,
                min_fields,
                max_depth,
                no_patterns,
                no_size,
                no_nesting,
            })?;
        }
        Commands::Consolidate {
            directory,
            typecount,
        } => {
            consolidate::run(&ConsolidateOptions {
                directory,
                typecount,
            })?;
        }
    }
    Ok(())
}

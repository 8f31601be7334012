mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fibrespec",
    version,
    about = "Turn fibre-optic cable datasheets into per-fibre-count specifications"
)]
struct Cli {
    /// Learned-parameter overlay file
    #[arg(
        long,
        global = true,
        env = "FIBRESPEC_REGISTRY",
        default_value = "dynamic_parameters.json",
        value_name = "FILE"
    )]
    registry: PathBuf,

    /// Learn parameters for this run only, never write the overlay
    #[arg(long, global = true)]
    no_persist: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract specifications from one or more PDF datasheets
    Extract {
        /// PDF files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write one JSON file per variant into this directory
        #[arg(short = 'O', long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Processing date stamped into metadata (YYYY-MM-DD, default today)
        #[arg(long, value_name = "DATE")]
        date: Option<chrono::NaiveDate>,

        /// Leave page heading text out of the output
        #[arg(long)]
        no_text: bool,
    },
    /// Inspect and maintain the parameter registry
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// List sections with parameter counts and keywords
    List,
    /// Show which section a parameter name or text fragment falls under
    Classify {
        /// Parameter name or free text
        name: String,
    },
    /// Register a parameter
    Add {
        /// Parameter name
        name: String,

        /// Section (default: classified from the name)
        #[arg(short, long)]
        section: Option<String>,

        /// Regex with capture groups (default: generated from the name)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Print every label pattern, built-in first
    Patterns,
    /// Validate an overlay file
    Validate {
        /// Path to overlay JSON file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Extract {
            files,
            output,
            out_dir,
            date,
            no_text,
        } => commands::extract::run(
            files,
            &output,
            out_dir,
            date,
            no_text,
            &cli.registry,
            cli.no_persist,
        ),
        Commands::Registry { action } => {
            commands::registry::open(&cli.registry, cli.no_persist).and_then(|registry| {
                match action {
                    RegistryAction::List => commands::registry::list(&registry),
                    RegistryAction::Classify { name } => {
                        commands::registry::classify(&registry, &name)
                    }
                    RegistryAction::Add {
                        name,
                        section,
                        pattern,
                        description,
                    } => commands::registry::add(
                        &registry,
                        &name,
                        section.as_deref(),
                        pattern.as_deref(),
                        description.as_deref(),
                    ),
                    RegistryAction::Patterns => commands::registry::patterns(&registry),
                    RegistryAction::Validate { file } => commands::registry::validate(&file),
                }
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

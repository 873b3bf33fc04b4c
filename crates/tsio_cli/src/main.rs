//! tsio CLI
//!
//! Command-line tools for a tsio entity store.
//!
//! # Commands
//!
//! - `import` - Load entities from a JSON file
//! - `show` - Read entities with their components
//! - `select` - Find entities by attribute
//! - `remove` - Delete entities, optionally with their components
//! - `attributes` - List stored attribute names
//! - `values` - List distinct stored attribute values
//! - `index` - Create attribute indexes

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// tsio command-line store tools.
#[derive(Parser)]
#[command(name = "tsio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Collection name (a subdirectory of the store path)
    #[arg(global = true, long, default_value = "timeseries")]
    collection: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load entities from a JSON array of documents
    Import {
        /// JSON file to read
        file: PathBuf,

        /// Write attributes only, leaving stored values untouched
        #[arg(short, long)]
        attributes_only: bool,
    },

    /// Read entities and their components
    Show {
        /// Entity names
        #[arg(required = true)]
        names: Vec<String>,

        /// Maximum number of levels to read (unbounded if omitted)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Only follow these component types (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        components: Option<Vec<String>>,

        /// Include value series
        #[arg(long)]
        values: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Find entities whose attributes match
    Select {
        /// Predicate as ATTRIBUTE=VALUE; repeat an attribute to accept several values
        #[arg(short = 'w', long = "where")]
        predicates: Vec<String>,

        /// How predicates combine (and, or, all)
        #[arg(short, long, default_value = "and")]
        mode: String,

        /// Keep entities carrying a FIELD attribute
        #[arg(short, long)]
        all_fields: bool,

        /// Only keep entities with an observation on one of these dates
        #[arg(short, long)]
        date: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete entities from the store
    Remove {
        /// Entity names
        #[arg(required = true)]
        names: Vec<String>,

        /// Also remove components found on the stored entities
        #[arg(short, long)]
        components: bool,

        /// Maximum number of component levels to follow
        #[arg(short, long)]
        depth: Option<usize>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List stored attribute names
    Attributes {
        /// Only inspect these entities
        names: Vec<String>,
    },

    /// List the distinct stored values of attributes
    Values {
        /// Attributes to list (all if omitted)
        attributes: Vec<String>,
    },

    /// Create indexes on attributes
    Index {
        /// Attributes to index
        #[arg(required = true)]
        attributes: Vec<String>,
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

    let store_dir = |command: &str| -> Result<PathBuf, String> {
        cli.path
            .as_ref()
            .map(|path| path.join(&cli.collection))
            .ok_or_else(|| format!("Store path required for {command}"))
    };

    match &cli.command {
        Commands::Import {
            file,
            attributes_only,
        } => {
            commands::import::run(&store_dir("import")?, &cli.collection, file, *attributes_only)?;
        }
        Commands::Show {
            names,
            depth,
            components,
            values,
            format,
        } => {
            let expansion = commands::expansion(components.as_deref(), *depth, true);
            commands::show::run(
                &store_dir("show")?,
                &cli.collection,
                names,
                expansion,
                *values,
                format,
            )?;
        }
        Commands::Select {
            predicates,
            mode,
            all_fields,
            date,
            format,
        } => {
            commands::select::run(
                &store_dir("select")?,
                &cli.collection,
                predicates,
                mode,
                *all_fields,
                date,
                format,
            )?;
        }
        Commands::Remove {
            names,
            components,
            depth,
            yes,
        } => {
            let expansion = commands::expansion(None, *depth, *components);
            commands::remove::run(&store_dir("remove")?, &cli.collection, names, expansion, *yes)?;
        }
        Commands::Attributes { names } => {
            commands::attributes::run(&store_dir("attributes")?, &cli.collection, names)?;
        }
        Commands::Values { attributes } => {
            commands::values::run(&store_dir("values")?, &cli.collection, attributes)?;
        }
        Commands::Index { attributes } => {
            commands::index::run(&store_dir("index")?, &cli.collection, attributes)?;
        }
        Commands::Version => {
            println!("tsio CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

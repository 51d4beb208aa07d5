use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use classnav::config::{load_config, Config};
use classnav::LocationKind;

mod cli;

use cli::OutputFormat;

#[derive(Parser)]
#[command(name = "classnav")]
#[command(version)]
#[command(about = "Symbol navigation index for decompiled Java classes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to .classnav.toml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory of decompiled sources against their archive
    Inspect {
        /// Jar, zip, class directory or class file the sources came from
        #[arg(short, long)]
        archive: PathBuf,

        /// Directory of decompiled .java files
        #[arg(short, long)]
        sources: PathBuf,

        /// Decompiler tag appended to class names
        #[arg(long)]
        decompiler: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the locations recorded for a symbol
    Query {
        /// Kind: field, method, parameter, local, reference
        kind: LocationKind,

        /// Simple name
        key: String,

        #[arg(short, long)]
        archive: PathBuf,

        /// Decompiled .java file
        #[arg(short, long)]
        source: PathBuf,

        /// Class name, e.g. com/acme/Foo.class-CFR
        #[arg(long)]
        class: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the type declaring a referenced member
    Owner {
        /// Member name
        member: String,

        #[arg(short, long)]
        archive: PathBuf,

        /// Decompiled .java file
        #[arg(short, long)]
        source: PathBuf,

        /// Class name, e.g. com/acme/Foo.class-CFR
        #[arg(long)]
        class: Option<String>,
    },
}

fn init_logging(debug: bool, verbose: bool, config: &Config) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.logging.format == "pretty" {
        builder.pretty().init();
    } else {
        builder.compact().init();
    }
}

fn load(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => load_config("."),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;

    init_logging(cli.debug, cli.verbose, &config);
    info!("classnav v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Inspect {
            archive,
            sources,
            decompiler,
            format,
        } => {
            cli::inspect::inspect_sources(archive, sources, decompiler, format, config).await?;
        }

        Commands::Query {
            kind,
            key,
            archive,
            source,
            class,
            format,
        } => {
            tokio::task::spawn_blocking(move || {
                cli::query::query_locations(archive, source, class, kind, key, format, config)
            })
            .await??;
        }

        Commands::Owner {
            member,
            archive,
            source,
            class,
        } => {
            tokio::task::spawn_blocking(move || cli::query::find_owner(archive, source, class, member, config))
                .await??;
        }
    }

    Ok(())
}

//! csarkit CLI - Inspect, validate and query TOSCA service CSARs

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "csarkit")]
#[command(author = "csarkit Contributors")]
#[command(version)]
#[command(about = "Inspect, validate and query TOSCA service CSARs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Severity configuration file (default: built-in)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Node,
    Group,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSAR and report its validation issues
    Validate {
        /// CSAR directory or archive
        csar: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Strict mode - treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show the service template of a CSAR
    Show {
        /// CSAR directory or archive
        csar: PathBuf,

        /// Output the template as JSON
        #[arg(long)]
        json: bool,
    },

    /// List node templates or groups by type and metadata
    Query {
        /// CSAR directory or archive
        csar: PathBuf,

        /// Entity kind
        #[arg(short, long, value_enum, default_value = "node")]
        kind: KindArg,

        /// Exact type name
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Metadata filter (key=value)
        #[arg(short, long)]
        metadata: Option<String>,

        /// Search the nested template of this service-level node
        #[arg(short, long)]
        within: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a property or input path
    #[command(group(ArgGroup::new("target").required(true).args(["node", "group", "input"])))]
    Get {
        /// CSAR directory or archive
        csar: PathBuf,

        /// Path, e.g. nf_naming#ecomp_generated_naming or vnf_config#default#image
        path: String,

        /// Read a node template property
        #[arg(long)]
        node: Option<String>,

        /// Read a group property
        #[arg(long)]
        group: Option<String>,

        /// Read a service input default
        #[arg(long)]
        input: bool,

        /// Look inside the nested template of this service-level node
        #[arg(short, long)]
        within: Option<String>,

        /// Print the resolved value as JSON instead of its leaf form
        #[arg(long)]
        raw: bool,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(report) = run(cli) {
        let code = report
            .downcast_ref::<CliError>()
            .map_or(exit_codes::ERROR, CliError::exit_code);
        eprintln!("{:?}", report);
        std::process::exit(code);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = util::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { csar, json, strict } => {
            commands::validate::run(&csar, &config, json, strict)
        }

        Commands::Show { csar, json } => commands::show::run(&csar, &config, json),

        Commands::Query {
            csar,
            kind,
            type_name,
            metadata,
            within,
            json,
        } => commands::query::run(
            &csar,
            &config,
            matches!(kind, KindArg::Group),
            type_name.as_deref(),
            metadata.as_deref(),
            within.as_deref(),
            json,
        ),

        Commands::Get {
            csar,
            path,
            node,
            group,
            input,
            within,
            raw,
        } => {
            let target = match (node, group) {
                (Some(name), _) => commands::get::Target::Node(name),
                (None, Some(name)) => commands::get::Target::Group(name),
                (None, None) if input => commands::get::Target::Input,
                (None, None) => return Err(CliError::input("one of --node, --group or --input is required").into()),
            };
            commands::get::run(&csar, &config, &target, &path, within.as_deref(), raw)
        }
    }
}

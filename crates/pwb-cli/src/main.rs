use clap::{Parser, Subcommand};
use pwb::{
    commands::{config, doctor, init, list, run},
    GlobalOpts,
};
use pwb_logger as logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pwb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Prompt workbench",
    long_about = "pwb is a prompt-engineering workbench. Features are self-contained contributions discovered from a contrib directory, validated, dependency-ordered, and run on demand."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered features, grouped by category
    List {
        /// Only show one category (CORE, AI, STORAGE, EXPORT, UTILITY)
        #[arg(long)]
        category: Option<String>,
        /// Include disabled features
        #[arg(long)]
        all: bool,
    },
    /// Run one feature by name
    Run {
        /// Feature name as registered (see `pwb list`)
        feature: String,
    },
    /// Show discovery errors and warnings
    Doctor,
    /// Scaffold a new contrib feature directory
    Init {
        /// Feature name (lowercase, digits, '-' and '_')
        name: String,
        /// Category for the scaffolded manifest (default: UTILITY)
        #[arg(long)]
        category: Option<String>,
        /// Create the feature under this directory instead of the contrib root
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Inspect or edit the workbench configuration
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<config::ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbosity = cli.global.verbosity_level();
    if let Err(err) = logger::init_with_verbosity(verbosity) {
        eprintln!("warning: logger not initialized: {}", err);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let outcome = match cli.command {
        Commands::List { category, all } => list::list_features(&cli.global, category, all),
        Commands::Run { feature } => run::run_feature(&cli.global, &feature),
        Commands::Doctor => doctor::doctor(&cli.global),
        Commands::Init {
            name,
            category,
            dir,
        } => init::handle_init(&cli.global, &name, category, dir),
        Commands::Config { action } => config::handle_config(action),
    };

    if let Err(message) = outcome {
        logger::error(&message);
        std::process::exit(1);
    }
}

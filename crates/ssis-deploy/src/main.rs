use clap::{Parser, Subcommand};
use ssis_deploy::{
    commands::{
        batch::{self, BatchCommand},
        build::{self, BuildCommand},
        config::{self, ConfigAction},
        init,
        inspect::{self, InspectCommand},
    },
    config_manager, logger, GlobalOpts,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ssis-deploy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "SSIS deployment manifest builder",
    long_about = "Copies the packages, configuration files and miscellaneous items of an SSIS project into a deployment folder and writes its deployment manifest."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one project into a deployment folder
    Build(BuildCommand),
    /// Compile every project of a batch file
    Batch(BatchCommand),
    /// Configure ssis-deploy
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Write a batch file template
    Init {
        /// Optional filename for the batch file (default: ssis-batch.yaml)
        file: Option<String>,
        /// Overwrite an existing file without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Print a written manifest
    Inspect(InspectCommand),
}

fn init_logging(global: &GlobalOpts) {
    // Keep the log file next to the config file so SSIS_DEPLOY_CONFIG isolates both
    let log_dir = config_manager::Config::path()
        .ok()
        .and_then(|path| path.parent().map(std::path::Path::to_path_buf));
    if let Err(e) = logger::init_with_verbosity(global.verbosity_level(), log_dir.as_deref()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logger::verbosity_to_filter().into());
    let registry = tracing_subscriber::registry().with(filter);
    let result = if global.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("Warning: Failed to initialize tracing: {}", e);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);
    let verbose = cli.global.verbosity_level() > 0;

    let result = match cli.command {
        Commands::Build(cmd) => build::handle_build(cmd, cli.global),
        Commands::Batch(cmd) => batch::handle_batch(cmd, cli.global),
        Commands::Config { action } => {
            config::handle_config(action.unwrap_or(ConfigAction::Show), cli.global)
        }
        Commands::Init { file, yes } => init::handle_init(file, yes, cli.global),
        Commands::Inspect(cmd) => inspect::handle_inspect(cmd, cli.global),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        if verbose {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}

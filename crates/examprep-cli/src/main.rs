use clap::{Parser, Subcommand};
use examprep_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "examprep", version, about = "ExamPrep study tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First-time setup
    Setup(commands::setup::SetupArgs),
    /// Show all tracked state
    Status,
    /// Record study activity
    Study {
        #[command(subcommand)]
        action: commands::study::StudyAction,
    },
    /// Streak rescue
    Rescue {
        #[command(subcommand)]
        action: commands::rescue::RescueAction,
    },
    /// User settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Mock tests, reminders, doubts and other records
    Record {
        #[command(subcommand)]
        action: commands::record::RecordAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Erase all data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Setup(args) => commands::setup::run(args, &config),
        Commands::Status => commands::status::run(&config),
        Commands::Study { action } => commands::study::run(action, &config),
        Commands::Rescue { action } => commands::rescue::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Record { action } => commands::record::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reset { yes } => commands::reset::run(yes, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

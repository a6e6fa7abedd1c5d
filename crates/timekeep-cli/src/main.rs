use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use timekeep_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "timekeep", version, about = "timekeep - ten timers that keep counting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Run the timers live until interrupted
    Watch(commands::watch::WatchArgs),
    /// Render a page of the app
    Show {
        /// Page path (e.g. "/", "/pomodoro", "/stats")
        #[arg(default_value = "/")]
        path: String,
    },
    /// Session history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Usage statistics and achievements
    Stats,
    /// User preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Export, import or clear all stored data
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// World-clock alarms
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Print the current time and date
    Clock,
    /// Serve the timer-state API and static assets
    Serve(commands::serve::ServeArgs),
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Config::load_or_default().log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Show { path } => commands::show::run(&path),
        Commands::History { action } => commands::history::run(action),
        Commands::Stats => commands::stats::run(),
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Data { action } => commands::data::run(action),
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Clock => commands::clock::run(),
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Completions { shell } => {
            let mut cli = Cli::command();
            clap_complete::generate(shell, &mut cli, "timekeep", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod state;

#[derive(Parser)]
#[command(name = "daybeat-cli", version, about = "Daybeat CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activity management
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Reminder management
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Project management
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Weekly time budget
    Budget {
        #[command(subcommand)]
        action: commands::budget::BudgetAction,
    },
    /// Analytics reports
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Upcoming schedule views
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Run the live trigger loop
    Watch(commands::watch::WatchArgs),
    /// Send a message to the natural-language webhook
    Chat(commands::chat::ChatArgs),
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Activity { action } => commands::activity::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Project { action } => commands::project::run(action),
        Commands::Budget { action } => commands::budget::run(action),
        Commands::Report { action } => commands::report::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Watch(args) => commands::watch::run(args).await,
        Commands::Chat(args) => commands::chat::run(args).await,
        Commands::Completions { shell } => commands::completions::run(shell, Cli::command()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

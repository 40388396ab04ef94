use anyhow::Result;
use clap::{Parser, Subcommand};

use lms_console::api::ProcessAction;
use lms_console::cli::{self, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "lms-console")]
#[command(about = "Terminal dashboard for the LMS Manager backend")]
struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive dashboard with periodic refresh (default)
    Dashboard,
    /// Log in and store the session token
    Login {
        #[arg(long, short)]
        username: Option<String>,
        /// Read from stdin when omitted
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Log out and clear the stored token
    Logout,
    /// Show system stats and Moodle status
    Status {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List recent alerts
    Alerts {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List recent log entries
    Logs {
        /// Number of entries (default: dashboard.log_limit)
        #[arg(long)]
        limit: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Start Moodle
    Start,
    /// Stop Moodle
    Stop {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Restart Moodle
    Restart {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the theme, or set it: light, dark, toggle
    Theme { choice: Option<String> },
    /// Check config, backend reachability and session
    Health,
    /// Show recent API activity
    Activity {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.lms-console/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `config set dashboard.log_limit 100`
    Set { key: String, value: String },
    /// Overwrite the global config with defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => cli::run_dashboard(),
        Commands::Login { username, password } => cli::run_login(username, password),
        Commands::Logout => cli::run_logout(),
        Commands::Status { format } => {
            cli::run_status(OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Alerts { format } => {
            cli::run_alerts(OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Logs { limit, format } => {
            cli::run_logs(limit, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Start => cli::run_process_action(ProcessAction::Start, true),
        Commands::Stop { yes } => cli::run_process_action(ProcessAction::Stop, yes),
        Commands::Restart { yes } => cli::run_process_action(ProcessAction::Restart, yes),
        Commands::Theme { choice } => cli::run_theme(choice.as_deref()),
        Commands::Health => cli::run_health(),
        Commands::Activity { limit, format } => {
            cli::run_activity(limit, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

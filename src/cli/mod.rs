//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `lms-console dashboard`: the interactive dashboard (default)
//! - `lms-console login | logout`: session management
//! - `lms-console status | alerts | logs`: one-shot reads
//! - `lms-console start | stop | restart`: process control
//! - `lms-console theme`: show or switch the stored theme
//! - `lms-console health`: check config, backend and session
//! - `lms-console activity`: read back the API activity log
//! - `lms-console config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};
use std::thread;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::activity::{ActivityEntry, ActivityLog};
use crate::api::{ApiClient, ApiError, DashboardSnapshot, MoodleStatus, ProcessAction};
use crate::app::{Console, LOGIN_FAILED, LOGIN_SUCCESS, event_loop};
use crate::config::{self, schema::ConsoleConfig};
use crate::render::{self, Bar, BarTier, Tone};
use crate::session::{Session, Theme};
use crate::theme::ThemeController;

/// Output format for read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Everything a one-shot command needs.
struct Backend {
    config: ConsoleConfig,
    client: ApiClient,
}

fn open() -> Backend {
    let config = config::load();
    let activity = ActivityLog::from_config(config.logging.activity_log);
    let client = ApiClient::new(&config.server, Session::open_default(), activity);
    Backend { config, client }
}

/// Turn an API failure into a CLI error with the same wording the
/// dashboard would toast.
fn api_failure(err: ApiError, fallback: &str) -> anyhow::Error {
    let message = render::sanitize_text(&err.user_message(fallback)).into_owned();
    if matches!(err, ApiError::Unauthorized) {
        anyhow::anyhow!("{message} Run `lms-console login` first.")
    } else {
        anyhow::anyhow!(message)
    }
}

// ---------------------------------------------------------------------------
// lms-console dashboard
// ---------------------------------------------------------------------------

/// Run the interactive dashboard until the operator quits.
pub fn run_dashboard() -> Result<()> {
    let config = config::load();
    let activity = ActivityLog::from_config(config.logging.activity_log);
    let mut console = Console::new(config, Session::open_default(), activity);
    event_loop::run(&mut console)
}

// ---------------------------------------------------------------------------
// lms-console login | logout
// ---------------------------------------------------------------------------

pub fn run_login(username: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = open();
    let username = match username {
        Some(u) => u,
        None => prompt_line("Username: ")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ")?,
    };

    let response = ctx
        .client
        .login(&username, &password)
        .map_err(|e| api_failure(e, LOGIN_FAILED))?;

    println!("{} {}", "✓".green().bold(), LOGIN_SUCCESS);
    if let Some(user) = response.user {
        println!(
            "  {} {} ({})",
            "Signed in as".dimmed(),
            render::sanitize_text(&user.username).bold(),
            render::sanitize_text(&user.role)
        );
    }
    if let Some(expires) = response.expires_at {
        println!(
            "  {} {}",
            "Expires:".dimmed(),
            render::format_timestamp(&expires)
        );
    }
    Ok(())
}

pub fn run_logout() -> Result<()> {
    let ctx = open();
    ctx.client.logout();
    println!("{} Logged out", "✓".green().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// lms-console status | alerts | logs
// ---------------------------------------------------------------------------

pub fn run_status(format: OutputFormat) -> Result<()> {
    let ctx = open();
    let mut stats = ctx
        .client
        .fetch_stats()
        .map_err(|e| api_failure(e, "Failed to load dashboard data"))?;
    if stats.moodle_status.is_none() {
        // Not every backend embeds the process status in the stats payload.
        stats.moodle_status = ctx.client.fetch_moodle_status().ok();
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Table => print_status_table(&stats),
    }
    Ok(())
}

fn print_status_table(stats: &DashboardSnapshot) {
    println!("{}", "LMS Manager Status".bold().cyan());
    println!("{}", "=".repeat(50));

    let usages = [
        ("CPU", stats.cpu_usage),
        ("Memory", stats.memory_usage),
        ("Disk", stats.disk_usage),
    ];
    for (label, value) in usages {
        match value {
            Some(percent) => println!(
                "  {:<10} {} {}",
                label,
                usage_bar(percent),
                render::format_percent(percent)
            ),
            None => println!("  {:<10} {}", label, "--".dimmed()),
        }
    }
    if let Some(uptime) = stats.uptime {
        println!("  {:<10} {}", "Uptime", render::format_duration(uptime));
    }
    if let Some(load) = stats.load_avg {
        println!(
            "  {:<10} {:.2} {:.2} {:.2}",
            "Load avg", load.load_1, load.load_5, load.load_15
        );
    }
    if let Some(net) = stats.network_io {
        println!(
            "  {:<10} rx {}  tx {}",
            "Network",
            render::format_bytes(net.bytes_received),
            render::format_bytes(net.bytes_sent)
        );
    }

    if let Some(status) = &stats.moodle_status {
        println!();
        print_process_status(status);
    }
}

fn usage_bar(percent: f64) -> String {
    const WIDTH: usize = 20;
    let bar = Bar::new(percent);
    let filled = bar.filled_cells(WIDTH);
    let fill = "█".repeat(filled);
    let fill = match bar.tier {
        BarTier::Green => fill.green(),
        BarTier::Amber => fill.yellow(),
        BarTier::Red => fill.red(),
    };
    format!("{fill}{}", "░".repeat(WIDTH - filled).dimmed())
}

fn print_process_status(status: &MoodleStatus) {
    let state = if status.running {
        "Running".green().bold()
    } else {
        "Stopped".red().bold()
    };
    println!("  {:<10} {}", "Moodle", state);
    if let Some(version) = status.version.as_deref().filter(|v| !v.trim().is_empty()) {
        println!("  {:<10} {}", "Version", render::sanitize_text(version));
    }
    if let Some(uptime) = status.uptime.filter(|&s| s > 0) {
        println!("  {:<10} {}", "Uptime", render::format_duration(uptime));
    }
    if let Some(pid) = status.process_id.filter(|&p| p > 0) {
        println!("  {:<10} {}", "PID", pid);
    }
    if let Some(error) = status.error.as_deref().filter(|e| !e.trim().is_empty()) {
        println!("  {:<10} {}", "Error", render::sanitize_text(error).red());
    }
}

fn tone_badge(badge: &str, tone: Tone) -> String {
    let badge = format!("[{badge}]");
    match tone {
        Tone::Good => badge.green().to_string(),
        Tone::Warn => badge.yellow().to_string(),
        Tone::Bad => badge.red().to_string(),
        Tone::Neutral => badge.dimmed().to_string(),
    }
}

pub fn run_alerts(format: OutputFormat) -> Result<()> {
    let ctx = open();
    let alerts = ctx
        .client
        .fetch_alerts()
        .map_err(|e| api_failure(e, "Failed to load alerts"))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    println!("{}", "Recent Alerts".bold().cyan());
    println!("{}", "=".repeat(50));
    if alerts.is_empty() {
        println!("  {}", "No alerts".dimmed());
    }
    for alert in &alerts {
        println!(
            "  {} {} {}",
            render::format_timestamp(&alert.timestamp).dimmed(),
            tone_badge(
                &render::sanitize_text(&alert.kind),
                Tone::for_severity(&alert.severity)
            ),
            render::sanitize_text(&alert.message)
        );
    }
    Ok(())
}

pub fn run_logs(limit: Option<u32>, format: OutputFormat) -> Result<()> {
    let ctx = open();
    let limit = limit.unwrap_or(ctx.config.dashboard.log_limit);
    let logs = ctx
        .client
        .fetch_logs(limit)
        .map_err(|e| api_failure(e, "Failed to load logs"))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }

    println!("{}", "Recent Logs".bold().cyan());
    println!("{}", "=".repeat(50));
    if logs.is_empty() {
        println!("  {}", "No logs".dimmed());
    }
    for log in &logs {
        println!(
            "  {} {} {}",
            render::format_timestamp(&log.timestamp).dimmed(),
            tone_badge(
                &render::sanitize_text(&log.level).to_uppercase(),
                Tone::for_severity(&log.level)
            ),
            render::sanitize_text(&log.message)
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// lms-console start | stop | restart
// ---------------------------------------------------------------------------

/// Run a process action. Stop and restart ask on stdin unless `yes`.
pub fn run_process_action(action: ProcessAction, yes: bool) -> Result<()> {
    let ctx = open();
    if action.needs_confirmation() && !yes && !confirm_on_stdin(action.confirmation_prompt()) {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    let response = ctx
        .client
        .process_action(action)
        .map_err(|e| api_failure(e, action.failure_message()))?;
    let message = response
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| action.success_message().to_string());
    println!("{} {}", "✓".green().bold(), render::sanitize_text(&message));

    // Give the process time to settle, then show where it ended up.
    let dash = &ctx.config.dashboard;
    let settle_ms = match action {
        ProcessAction::Start => dash.start_settle_ms,
        ProcessAction::Stop => dash.stop_settle_ms,
        ProcessAction::Restart => dash.restart_settle_ms,
    };
    thread::sleep(std::time::Duration::from_millis(settle_ms));
    match ctx.client.fetch_stats() {
        Ok(stats) => {
            if let Some(status) = &stats.moodle_status {
                print_process_status(status);
            }
        }
        Err(err) => println!(
            "  {} {}",
            "Status unavailable:".dimmed(),
            render::sanitize_text(&err.user_message("Failed to load dashboard data"))
        ),
    }
    Ok(())
}

fn confirm_on_stdin(question: &str) -> bool {
    prompt_line(&format!("{question} [y/N] "))
        .map(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false)
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

// ---------------------------------------------------------------------------
// lms-console theme
// ---------------------------------------------------------------------------

/// Show the stored theme, or switch it (`toggle`, `light`, `dark`).
pub fn run_theme(choice: Option<&str>) -> Result<()> {
    let mut theme = ThemeController::init(Session::open_default());
    match choice {
        None => {}
        Some("toggle") => {
            theme.toggle();
        }
        Some(other) => match Theme::parse(other) {
            Some(t) => theme.set(t),
            None => bail!("unknown theme '{other}' (expected light, dark or toggle)"),
        },
    }
    println!("{} {}", theme.icon(), theme.current());
    Ok(())
}

// ---------------------------------------------------------------------------
// lms-console health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability, session and activity log.
pub fn run_health() -> Result<()> {
    println!("{}", "LMS Console Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.lms-console/config.toml found"
        } else {
            "not found (run `lms-console config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".lms-console.toml found"
        } else {
            "none (optional)"
        },
    );

    let ctx = open();
    match ctx.client.health() {
        Ok(()) => print_health_item(
            "Backend",
            true,
            &format!("reachable at {}", ctx.client.base_url()),
        ),
        Err(err) => {
            let detail = err.to_string();
            print_health_item("Backend", false, &render::sanitize_text(&detail));
        }
    }

    let logged_in = ctx.client.session().is_logged_in();
    print_health_item(
        "Session",
        logged_in,
        if logged_in {
            "token stored"
        } else {
            "not logged in (run `lms-console login`)"
        },
    );

    let activity = ctx.client.activity();
    match activity.path() {
        Some(path) if path.exists() => print_health_item(
            "Activity log",
            true,
            &format!("{} entries", activity.read_all().len()),
        ),
        Some(_) => print_health_item("Activity log", true, "no log file yet"),
        None => print_health_item("Activity log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// lms-console activity
// ---------------------------------------------------------------------------

pub fn run_activity(limit: usize, format: OutputFormat) -> Result<()> {
    let config = config::load();
    let log = ActivityLog::from_config(true);
    let entries = log.read_recent(limit);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No activity recorded yet.".yellow());
        if !config.logging.activity_log {
            println!(
                "  {}",
                "Logging is off; set logging.activity_log = true to enable.".dimmed()
            );
        }
        return Ok(());
    }

    println!("{}", "Recent API Activity".bold().cyan());
    println!("{}", "=".repeat(72));
    for entry in &entries {
        print_activity_row(entry);
    }
    Ok(())
}

fn print_activity_row(entry: &ActivityEntry) {
    let status = entry
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let outcome = match entry.outcome.as_str() {
        "ok" => entry.outcome.green(),
        "unauthorized" | "network" => entry.outcome.yellow(),
        _ => entry.outcome.red(),
    };
    println!(
        "  {} {:<5} {:<22} {:>4} {:<12} {:>6}ms {}",
        render::format_timestamp(&entry.timestamp).dimmed(),
        render::sanitize_text(&entry.method),
        render::sanitize_text(&entry.path),
        status,
        outcome,
        entry.latency_ms,
        render::sanitize_text(entry.message.as_deref().unwrap_or("")).dimmed()
    );
}

// ---------------------------------------------------------------------------
// lms-console config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Console Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    let mark = |found: bool| if found { "✓".green() } else { "·".dimmed() };
    println!(
        "  {} {}",
        mark(global_exists),
        "~/.lms-console/config.toml".dimmed()
    );
    println!("  {} {}", mark(project_exists), ".lms-console.toml".dimmed());
    println!(
        "  {} {}",
        "·".dimmed(),
        "LMS_CONSOLE_* environment variables".dimmed()
    );
    Ok(())
}

/// Write a default config file to `~/.lms-console/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

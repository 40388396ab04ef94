//! Terminal screen composition.
//!
//! [`compose`] is pure: it reads the binding table, navigation and overlay
//! state and returns the full frame as a string. Clearing and printing is
//! the event loop's job.

use colored::{Color, Colorize};

use crate::nav::{Navigation, Section};
use crate::theme::Palette;
use crate::ui::{Toast, ToastKind};

use super::bindings::{Bar, Element, Field, ListView, Tone, ViewBindings};

const BAR_WIDTH: usize = 20;
const RULE_WIDTH: usize = 72;

/// Everything a frame is drawn from.
pub struct Frame<'a> {
    pub nav: &'a Navigation,
    pub bindings: &'a ViewBindings,
    pub palette: Palette,
    pub theme_icon: &'static str,
    pub busy: bool,
    pub toasts: Vec<&'a Toast>,
    /// Pending confirmation question, if any.
    pub prompt: Option<&'a str>,
    /// Key/value rows for the settings section.
    pub settings: &'a [(String, String)],
}

pub fn compose(frame: &Frame<'_>) -> String {
    let p = frame.palette;
    let mut lines = Vec::new();

    // -- Header --
    let busy = if frame.busy {
        format!("  {}", "Loading...".color(p.warn))
    } else {
        String::new()
    };
    lines.push(format!(
        "{} {} {}{}",
        "LMS Manager".bold().color(p.accent),
        "·".color(p.muted),
        frame.nav.title().bold().color(p.text),
        busy
    ));
    lines.push(format!(
        "{}  {}",
        nav_bar(frame.nav, p),
        frame.theme_icon.color(p.accent)
    ));
    lines.push(rule(p));

    // -- Sections --
    for &section in frame.nav.current().sections() {
        lines.push(String::new());
        match section {
            Section::Stats => stats_section(&mut lines, frame.bindings, p),
            Section::System => system_section(&mut lines, frame.bindings, p),
            Section::Process => process_section(&mut lines, frame.bindings, p),
            Section::Alerts => {
                list_section(&mut lines, "Recent Alerts", frame.bindings, Field::AlertsList, p)
            }
            Section::Logs => {
                list_section(&mut lines, "Recent Logs", frame.bindings, Field::LogsList, p)
            }
            Section::Users => list_section(&mut lines, "Users", frame.bindings, Field::UsersList, p),
            Section::Backups => {
                lines.push(heading("Backups", p));
                lines.push(format!("  {}", "No backups".color(p.muted)));
            }
            Section::Settings => settings_section(&mut lines, frame.settings, p),
        }
    }

    // -- Overlays --
    if !frame.toasts.is_empty() {
        lines.push(String::new());
        for toast in &frame.toasts {
            lines.push(toast_line(toast, p));
        }
    }

    lines.push(String::new());
    lines.push(rule(p));
    match frame.prompt {
        Some(question) => lines.push(format!("{} [y/N]", question.bold().color(p.warn))),
        None => lines.push(
            "1-8 switch view · start · stop · restart · refresh · theme · logout · help · quit"
                .color(p.muted)
                .to_string(),
        ),
    }

    lines.join("\n")
}

/// The login screen: a banner plus any toasts.
pub fn compose_login(palette: Palette, toasts: &[&Toast], base_url: &str) -> String {
    let mut lines = vec![
        "LMS Manager".bold().color(palette.accent).to_string(),
        format!("{} {}", "Sign in to".color(palette.muted), base_url),
        rule(palette),
    ];
    for toast in toasts {
        lines.push(toast_line(toast, palette));
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

fn rule(p: Palette) -> String {
    "─".repeat(RULE_WIDTH).color(p.muted).to_string()
}

fn heading(text: &str, p: Palette) -> String {
    text.bold().color(p.accent).to_string()
}

fn nav_bar(nav: &Navigation, p: Palette) -> String {
    nav.items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let entry = format!("{} {}", i + 1, item.label);
            if item.active {
                format!("[{entry}]").bold().color(p.accent).to_string()
            } else {
                entry.color(p.muted).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn text_of(bindings: &ViewBindings, field: Field) -> &str {
    bindings.text(field).unwrap_or("--")
}

fn draw_bar(bar: &Bar, p: Palette) -> String {
    let filled = bar.filled_cells(BAR_WIDTH);
    let color = match bar.tier {
        super::BarTier::Green => p.good,
        super::BarTier::Amber => p.warn,
        super::BarTier::Red => p.bad,
    };
    format!(
        "{}{}",
        "█".repeat(filled).color(color),
        "░".repeat(BAR_WIDTH - filled).color(p.muted)
    )
}

fn stats_section(lines: &mut Vec<String>, bindings: &ViewBindings, p: Palette) {
    lines.push(heading("System Stats", p));
    let rows = [
        ("CPU", Field::CpuUsage, Field::CpuBar),
        ("Memory", Field::MemoryUsage, Field::MemoryBar),
        ("Disk", Field::DiskUsage, Field::DiskBar),
    ];
    for (label, text_field, bar_field) in rows {
        let bar = bindings
            .bar(bar_field)
            .map(|bar| draw_bar(bar, p))
            .unwrap_or_default();
        lines.push(format!(
            "  {} {} {}",
            format!("{label:<8}").color(p.text),
            bar,
            text_of(bindings, text_field).color(p.text)
        ));
    }
    lines.push(format!(
        "  {} {}",
        format!("{:<8}", "Uptime").color(p.text),
        text_of(bindings, Field::Uptime)
    ));
}

fn system_section(lines: &mut Vec<String>, bindings: &ViewBindings, p: Palette) {
    lines.push(heading("System Details", p));
    let rows = [
        ("Load avg", Field::LoadAverage),
        ("Network", Field::Network),
        ("Updated", Field::LastUpdated),
    ];
    for (label, field) in rows {
        lines.push(format!(
            "  {} {}",
            format!("{label:<10}").color(p.text),
            text_of(bindings, field)
        ));
    }
}

fn process_section(lines: &mut Vec<String>, bindings: &ViewBindings, p: Palette) {
    lines.push(heading("Moodle", p));
    if let Some(indicator) = bindings.indicator(Field::ProcessIndicator) {
        let dot_color = if indicator.on { p.good } else { p.bad };
        lines.push(format!(
            "  {} {}",
            "●".color(dot_color),
            indicator.label.bold().color(p.text)
        ));
    }
    let rows = [
        ("Version", Field::ProcessVersion),
        ("Uptime", Field::ProcessUptime),
        ("PID", Field::ProcessPid),
    ];
    for (label, field) in rows {
        lines.push(format!(
            "  {} {}",
            format!("{label:<8}").color(p.muted),
            text_of(bindings, field)
        ));
    }
}

fn tone_color(tone: Tone, p: Palette) -> Color {
    match tone {
        Tone::Good => p.good,
        Tone::Warn => p.warn,
        Tone::Bad => p.bad,
        Tone::Neutral => p.muted,
    }
}

fn list_section(
    lines: &mut Vec<String>,
    title: &str,
    bindings: &ViewBindings,
    field: Field,
    p: Palette,
) {
    lines.push(heading(title, p));
    match bindings.get(field) {
        Element::List(ListView::Placeholder(text)) => {
            lines.push(format!("  {}", text.color(p.muted)));
        }
        Element::List(ListView::Items(items)) => {
            for item in items {
                lines.push(format!(
                    "  {} {} {}",
                    item.time.color(p.muted),
                    format!("[{}]", item.badge).color(tone_color(item.tone, p)),
                    item.text.color(p.text)
                ));
            }
        }
        _ => {}
    }
}

fn settings_section(lines: &mut Vec<String>, settings: &[(String, String)], p: Palette) {
    lines.push(heading("Settings", p));
    for (key, value) in settings {
        lines.push(format!(
            "  {} {}",
            format!("{key:<32}").color(p.muted),
            value.color(p.text)
        ));
    }
}

fn toast_line(toast: &Toast, p: Palette) -> String {
    let (mark, color) = match toast.kind {
        ToastKind::Success => ("✓", p.good),
        ToastKind::Error => ("✗", p.bad),
        ToastKind::Info => ("i", p.accent),
    };
    format!("{} {}", mark.bold().color(color), toast.message.color(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::View;
    use crate::render::dashboard;
    use crate::session::Theme;
    use crate::ui::Toasts;

    fn frame<'a>(
        nav: &'a Navigation,
        bindings: &'a ViewBindings,
        toasts: Vec<&'a Toast>,
    ) -> Frame<'a> {
        Frame {
            nav,
            bindings,
            palette: Palette::for_theme(Theme::Light),
            theme_icon: crate::theme::MOON_ICON,
            busy: false,
            toasts,
            prompt: None,
            settings: &[],
        }
    }

    #[test]
    fn dashboard_frame_shows_overview() {
        let nav = Navigation::new();
        let mut bindings = ViewBindings::new();
        dashboard::apply_alerts(&mut bindings, &[]);
        let out = compose(&frame(&nav, &bindings, Vec::new()));
        assert!(out.contains("System Stats"));
        assert!(out.contains("No alerts"));
        assert!(out.contains("Recent Logs"));
        assert!(!out.contains("No backups"));
    }

    #[test]
    fn selected_view_hides_other_sections() {
        let mut nav = Navigation::new();
        nav.select(View::Logs);
        let bindings = ViewBindings::new();
        let out = compose(&frame(&nav, &bindings, Vec::new()));
        assert!(out.contains("Recent Logs"));
        assert!(!out.contains("System Stats"));
        assert!(!out.contains("Recent Alerts"));
    }

    #[test]
    fn toasts_and_prompt_are_drawn() {
        let nav = Navigation::new();
        let bindings = ViewBindings::new();
        let mut toasts = Toasts::default();
        toasts.error("Network error. Please try again.");
        let mut f = frame(&nav, &bindings, toasts.all().iter().collect());
        f.prompt = Some("Are you sure you want to stop Moodle?");
        f.busy = true;
        let out = compose(&f);
        assert!(out.contains("Network error. Please try again."));
        assert!(out.contains("Are you sure you want to stop Moodle?"));
        assert!(out.contains("Loading..."));
    }

    #[test]
    fn login_screen_names_the_backend() {
        let out = compose_login(Palette::for_theme(Theme::Dark), &[], "http://lms:8080");
        assert!(out.contains("http://lms:8080"));
    }
}

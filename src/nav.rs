//! View switching for the dashboard.
//!
//! The navigation bar holds one entry per [`View`]. Selecting a view marks
//! the entries whose label matches as active, sets the title, decides which
//! sections are visible, and reports which lists should be refreshed right
//! away.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Dashboard,
    System,
    Moodle,
    Backups,
    Logs,
    Alerts,
    Users,
    Settings,
}

impl View {
    pub const ALL: [View; 8] = [
        View::Dashboard,
        View::System,
        View::Moodle,
        View::Backups,
        View::Logs,
        View::Alerts,
        View::Users,
        View::Settings,
    ];

    /// Text of the navigation entry.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::System => "System Status",
            Self::Moodle => "Moodle Management",
            Self::Backups => "Backups",
            Self::Logs => "System Logs",
            Self::Alerts => "Alerts",
            Self::Users => "Users",
            Self::Settings => "Settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Users => "User Management",
            other => other.label(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::System => "system",
            Self::Moodle => "moodle",
            Self::Backups => "backups",
            Self::Logs => "logs",
            Self::Alerts => "alerts",
            Self::Users => "users",
            Self::Settings => "settings",
        }
    }

    /// Resolve operator input: a view name, a nav label, or a 1-based index.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(index) = input.parse::<usize>() {
            return index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        Self::ALL.into_iter().find(|view| {
            view.name().eq_ignore_ascii_case(input) || view.label().eq_ignore_ascii_case(input)
        })
    }

    pub fn sections(self) -> &'static [Section] {
        match self {
            Self::Dashboard => &[
                Section::Stats,
                Section::Process,
                Section::Alerts,
                Section::Logs,
            ],
            Self::System => &[Section::Stats, Section::System],
            Self::Moodle => &[Section::Process],
            Self::Backups => &[Section::Backups],
            Self::Logs => &[Section::Logs],
            Self::Alerts => &[Section::Alerts],
            Self::Users => &[Section::Users],
            Self::Settings => &[Section::Settings],
        }
    }

    /// Lists to fetch immediately when the view is selected.
    pub fn refreshes(self) -> &'static [Refresh] {
        match self {
            Self::Logs => &[Refresh::Logs],
            Self::Alerts => &[Refresh::Alerts],
            Self::Users => &[Refresh::Users],
            Self::Moodle => &[Refresh::Stats],
            Self::Dashboard | Self::System | Self::Backups | Self::Settings => &[],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A block of the dashboard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Stats,
    System,
    Process,
    Alerts,
    Logs,
    Backups,
    Users,
    Settings,
}

/// A one-shot fetch requested by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Stats,
    Alerts,
    Logs,
    Users,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub view: View,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct Navigation {
    items: Vec<NavItem>,
    current: View,
    title: &'static str,
}

impl Default for Navigation {
    fn default() -> Self {
        let mut nav = Self {
            items: View::ALL
                .into_iter()
                .map(|view| NavItem {
                    view,
                    label: view.label(),
                    active: false,
                })
                .collect(),
            current: View::Dashboard,
            title: View::Dashboard.title(),
        };
        nav.set_active_label(View::Dashboard.label());
        nav
    }
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `view` and return the lists to refresh now.
    pub fn select(&mut self, view: View) -> &'static [Refresh] {
        self.set_active_label(view.label());
        self.title = view.title();
        self.current = view;
        view.refreshes()
    }

    /// Mark exactly the entries whose label equals `label` as active.
    fn set_active_label(&mut self, label: &str) {
        for item in &mut self.items {
            item.active = item.label == label;
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn items(&self) -> &[NavItem] {
        &self.items
    }

    pub fn is_visible(&self, section: Section) -> bool {
        self.current.sections().contains(&section)
    }
}

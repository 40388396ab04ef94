//! The view-binding table.
//!
//! One [`Element`] per [`Field`], created up front with placeholder values.
//! Renderers overwrite individual entries; nothing is ever removed.

use std::collections::BTreeMap;

use super::BarTier;

/// A logical slot on the dashboard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CpuUsage,
    CpuBar,
    MemoryUsage,
    MemoryBar,
    DiskUsage,
    DiskBar,
    Uptime,
    LoadAverage,
    Network,
    ProcessIndicator,
    ProcessVersion,
    ProcessUptime,
    ProcessPid,
    AlertsList,
    LogsList,
    UsersList,
    LastUpdated,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::CpuUsage,
        Field::CpuBar,
        Field::MemoryUsage,
        Field::MemoryBar,
        Field::DiskUsage,
        Field::DiskBar,
        Field::Uptime,
        Field::LoadAverage,
        Field::Network,
        Field::ProcessIndicator,
        Field::ProcessVersion,
        Field::ProcessUptime,
        Field::ProcessPid,
        Field::AlertsList,
        Field::LogsList,
        Field::UsersList,
        Field::LastUpdated,
    ];

    fn initial(self) -> Element {
        match self {
            Self::CpuBar | Self::MemoryBar | Self::DiskBar => Element::Bar(Bar::new(0.0)),
            Self::ProcessIndicator => Element::Indicator(Indicator {
                on: false,
                label: "Checking...".to_string(),
            }),
            Self::AlertsList | Self::LogsList | Self::UsersList => {
                Element::List(ListView::Placeholder("Loading..."))
            }
            _ => Element::Text("--".to_string()),
        }
    }
}

/// Colour class of a list badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Neutral,
}

impl Tone {
    /// Map a free-form severity or log level onto a display tone.
    /// Unknown values are neutral.
    pub fn for_severity(severity: &str) -> Self {
        match severity.trim().to_ascii_lowercase().as_str() {
            "critical" | "high" | "error" | "fatal" => Self::Bad,
            "medium" | "warning" | "warn" => Self::Warn,
            "low" | "ok" | "success" => Self::Good,
            _ => Self::Neutral,
        }
    }
}

/// A usage bar. `percent` is the raw value; the fill is clamped when drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub percent: f64,
    pub tier: BarTier,
}

impl Bar {
    pub fn new(percent: f64) -> Self {
        Self {
            percent,
            tier: BarTier::for_percent(percent),
        }
    }

    /// Number of filled cells out of `width`.
    pub fn filled_cells(&self, width: usize) -> usize {
        let clamped = if self.percent.is_finite() {
            self.percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        ((clamped / 100.0) * width as f64).round() as usize
    }
}

/// Binary on/off light with a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub on: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub badge: String,
    pub tone: Tone,
    pub time: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Placeholder(&'static str),
    Items(Vec<ListItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(String),
    Bar(Bar),
    Indicator(Indicator),
    List(ListView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewBindings {
    elements: BTreeMap<Field, Element>,
}

impl Default for ViewBindings {
    fn default() -> Self {
        Self {
            elements: Field::ALL
                .into_iter()
                .map(|field| (field, field.initial()))
                .collect(),
        }
    }
}

impl ViewBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, element: Element) {
        self.elements.insert(field, element);
    }

    pub fn get(&self, field: Field) -> &Element {
        // Every field is populated in `default`, and `set` only replaces.
        &self.elements[&field]
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match self.get(field) {
            Element::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn bar(&self, field: Field) -> Option<&Bar> {
        match self.get(field) {
            Element::Bar(bar) => Some(bar),
            _ => None,
        }
    }

    pub fn indicator(&self, field: Field) -> Option<&Indicator> {
        match self.get(field) {
            Element::Indicator(indicator) => Some(indicator),
            _ => None,
        }
    }

    pub fn list(&self, field: Field) -> Option<&ListView> {
        match self.get(field) {
            Element::List(list) => Some(list),
            _ => None,
        }
    }
}

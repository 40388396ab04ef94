//! Payload → binding updates.
//!
//! Each function touches only the fields its payload covers. A field the
//! payload leaves out keeps its previous value.

use crate::api::{Alert, DashboardSnapshot, LogEntry, MoodleStatus, UserSummary};

use super::bindings::{Bar, Element, Field, Indicator, ListItem, ListView, Tone, ViewBindings};
use super::{format_bytes, format_duration, format_percent, format_timestamp, sanitize_text};

pub const NO_ALERTS: &str = "No alerts";
pub const NO_LOGS: &str = "No logs";
pub const NO_USERS: &str = "No users";

pub fn apply_snapshot(bindings: &mut ViewBindings, snapshot: &DashboardSnapshot) {
    let usages = [
        (snapshot.cpu_usage, Field::CpuUsage, Field::CpuBar),
        (snapshot.memory_usage, Field::MemoryUsage, Field::MemoryBar),
        (snapshot.disk_usage, Field::DiskUsage, Field::DiskBar),
    ];
    for (value, text_field, bar_field) in usages {
        if let Some(percent) = value {
            bindings.set(text_field, Element::Text(format_percent(percent)));
            bindings.set(bar_field, Element::Bar(Bar::new(percent)));
        }
    }

    if let Some(uptime) = snapshot.uptime {
        bindings.set(Field::Uptime, Element::Text(format_duration(uptime)));
    }

    if let Some(load) = snapshot.load_avg {
        bindings.set(
            Field::LoadAverage,
            Element::Text(format!(
                "{:.2} {:.2} {:.2}",
                load.load_1, load.load_5, load.load_15
            )),
        );
    }

    if let Some(net) = snapshot.network_io {
        bindings.set(
            Field::Network,
            Element::Text(format!(
                "rx {} ({} pkts)  tx {} ({} pkts)",
                format_bytes(net.bytes_received),
                net.packets_received,
                format_bytes(net.bytes_sent),
                net.packets_sent
            )),
        );
    }

    if let Some(timestamp) = &snapshot.timestamp {
        bindings.set(Field::LastUpdated, Element::Text(format_timestamp(timestamp)));
    }

    if let Some(status) = &snapshot.moodle_status {
        apply_process_status(bindings, status);
    }
}

/// Indicator plus the optional detail fields. Empty version and zero
/// uptime or pid count as absent and leave the old text.
pub fn apply_process_status(bindings: &mut ViewBindings, status: &MoodleStatus) {
    let label = if status.running { "Running" } else { "Stopped" };
    bindings.set(
        Field::ProcessIndicator,
        Element::Indicator(Indicator {
            on: status.running,
            label: label.to_string(),
        }),
    );

    if let Some(version) = status.version.as_deref()
        && !version.trim().is_empty()
    {
        bindings.set(
            Field::ProcessVersion,
            Element::Text(sanitize_text(version).into_owned()),
        );
    }
    if let Some(uptime) = status.uptime.filter(|&s| s > 0) {
        bindings.set(Field::ProcessUptime, Element::Text(format_duration(uptime)));
    }
    if let Some(pid) = status.process_id.filter(|&p| p > 0) {
        bindings.set(Field::ProcessPid, Element::Text(pid.to_string()));
    }
}

pub fn apply_alerts(bindings: &mut ViewBindings, alerts: &[Alert]) {
    let view = if alerts.is_empty() {
        ListView::Placeholder(NO_ALERTS)
    } else {
        ListView::Items(
            alerts
                .iter()
                .map(|alert| ListItem {
                    badge: sanitize_text(&alert.kind).into_owned(),
                    tone: Tone::for_severity(&alert.severity),
                    time: format_timestamp(&alert.timestamp),
                    text: sanitize_text(&alert.message).into_owned(),
                })
                .collect(),
        )
    };
    bindings.set(Field::AlertsList, Element::List(view));
}

pub fn apply_logs(bindings: &mut ViewBindings, logs: &[LogEntry]) {
    let view = if logs.is_empty() {
        ListView::Placeholder(NO_LOGS)
    } else {
        ListView::Items(
            logs.iter()
                .map(|log| ListItem {
                    badge: sanitize_text(&log.level).to_uppercase(),
                    tone: Tone::for_severity(&log.level),
                    time: format_timestamp(&log.timestamp),
                    text: sanitize_text(&log.message).into_owned(),
                })
                .collect(),
        )
    };
    bindings.set(Field::LogsList, Element::List(view));
}

pub fn apply_users(bindings: &mut ViewBindings, users: &[UserSummary]) {
    let view = if users.is_empty() {
        ListView::Placeholder(NO_USERS)
    } else {
        ListView::Items(
            users
                .iter()
                .map(|user| ListItem {
                    badge: sanitize_text(&user.role).into_owned(),
                    tone: if user.active { Tone::Good } else { Tone::Neutral },
                    time: if user.active { "active" } else { "inactive" }.to_string(),
                    text: sanitize_text(&user.username).into_owned(),
                })
                .collect(),
        )
    };
    bindings.set(Field::UsersList, Element::List(view));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::LoadAverage;
    use crate::render::BarTier;

    fn items(bindings: &ViewBindings, field: Field) -> Vec<ListItem> {
        match bindings.list(field) {
            Some(ListView::Items(items)) => items.clone(),
            other => panic!("expected items, got {other:?}"),
        }
    }

    #[test]
    fn partial_snapshot_leaves_other_fields_alone() {
        let mut bindings = ViewBindings::new();
        apply_snapshot(
            &mut bindings,
            &DashboardSnapshot {
                cpu_usage: Some(42.5),
                memory_usage: Some(70.0),
                ..Default::default()
            },
        );
        assert_eq!(bindings.text(Field::CpuUsage), Some("42.5%"));
        assert_eq!(bindings.bar(Field::MemoryBar).unwrap().tier, BarTier::Amber);

        apply_snapshot(
            &mut bindings,
            &DashboardSnapshot {
                disk_usage: Some(91.0),
                ..Default::default()
            },
        );
        assert_eq!(bindings.text(Field::CpuUsage), Some("42.5%"));
        assert_eq!(bindings.text(Field::DiskUsage), Some("91%"));
        assert_eq!(bindings.bar(Field::DiskBar).unwrap().tier, BarTier::Red);
        assert_eq!(bindings.text(Field::Uptime), Some("--"));
    }

    #[test]
    fn snapshot_fills_system_fields() {
        let mut bindings = ViewBindings::new();
        apply_snapshot(
            &mut bindings,
            &DashboardSnapshot {
                uptime: Some(90_000),
                load_avg: Some(LoadAverage {
                    load_1: 0.5,
                    load_5: 0.25,
                    load_15: 0.1,
                }),
                ..Default::default()
            },
        );
        assert_eq!(bindings.text(Field::Uptime), Some("1d 1h 0m"));
        assert_eq!(bindings.text(Field::LoadAverage), Some("0.50 0.25 0.10"));
    }

    #[test]
    fn process_details_only_when_present() {
        let mut bindings = ViewBindings::new();
        apply_process_status(
            &mut bindings,
            &MoodleStatus {
                running: true,
                version: Some("4.3".into()),
                uptime: Some(3_665),
                process_id: Some(4242),
                ..Default::default()
            },
        );
        let indicator = bindings.indicator(Field::ProcessIndicator).unwrap();
        assert!(indicator.on);
        assert_eq!(indicator.label, "Running");
        assert_eq!(bindings.text(Field::ProcessUptime), Some("1h 1m"));

        apply_process_status(
            &mut bindings,
            &MoodleStatus {
                running: false,
                version: Some(String::new()),
                uptime: Some(0),
                process_id: None,
                ..Default::default()
            },
        );
        assert_eq!(
            bindings.indicator(Field::ProcessIndicator).unwrap().label,
            "Stopped"
        );
        assert_eq!(bindings.text(Field::ProcessVersion), Some("4.3"));
        assert_eq!(bindings.text(Field::ProcessUptime), Some("1h 1m"));
        assert_eq!(bindings.text(Field::ProcessPid), Some("4242"));
    }

    #[test]
    fn empty_lists_show_placeholders() {
        let mut bindings = ViewBindings::new();
        apply_alerts(&mut bindings, &[]);
        apply_logs(&mut bindings, &[]);
        apply_users(&mut bindings, &[]);
        assert_eq!(
            bindings.list(Field::AlertsList),
            Some(&ListView::Placeholder("No alerts"))
        );
        assert_eq!(
            bindings.list(Field::LogsList),
            Some(&ListView::Placeholder("No logs"))
        );
        assert_eq!(
            bindings.list(Field::UsersList),
            Some(&ListView::Placeholder("No users"))
        );
    }

    #[test]
    fn alerts_keep_server_order_and_sanitize() {
        let mut bindings = ViewBindings::new();
        let alerts = vec![
            Alert {
                kind: "cpu".into(),
                severity: "high".into(),
                message: "CPU \x1b[31mhot\x1b[0m".into(),
                timestamp: "soon".into(),
                ..Default::default()
            },
            Alert {
                kind: "disk".into(),
                severity: "low".into(),
                message: "Disk fine".into(),
                ..Default::default()
            },
        ];
        apply_alerts(&mut bindings, &alerts);
        let rendered = items(&bindings, Field::AlertsList);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].badge, "cpu");
        assert_eq!(rendered[0].text, "CPU hot");
        assert_eq!(rendered[0].tone, Tone::Bad);
        assert_eq!(rendered[0].time, "soon");
        assert_eq!(rendered[1].badge, "disk");
    }

    #[test]
    fn log_levels_are_upper_cased() {
        let mut bindings = ViewBindings::new();
        apply_logs(
            &mut bindings,
            &[LogEntry {
                level: "warn".into(),
                message: "slow query".into(),
                ..Default::default()
            }],
        );
        let rendered = items(&bindings, Field::LogsList);
        assert_eq!(rendered[0].badge, "WARN");
        assert_eq!(rendered[0].tone, Tone::Warn);
    }

    #[test]
    fn list_replaced_by_placeholder_when_emptied() {
        let mut bindings = ViewBindings::new();
        apply_logs(
            &mut bindings,
            &[LogEntry {
                level: "info".into(),
                message: "hello".into(),
                ..Default::default()
            }],
        );
        apply_logs(&mut bindings, &[]);
        assert_eq!(
            bindings.list(Field::LogsList),
            Some(&ListView::Placeholder(NO_LOGS))
        );
    }
}

//! Transient toast notifications.
//!
//! Every toast carries its own deadline. Pushing a toast never touches the
//! others, and each one disappears when its own window closes. Messages
//! often quote the server, so they are sanitized on the way in.

use std::time::{Duration, Instant};

use crate::render::sanitize_text;

/// Default on-screen lifetime of a toast.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct Toasts {
    entries: Vec<Toast>,
    ttl: Duration,
    next_id: u64,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl Toasts {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ttl,
            next_id: 1,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Info, message)
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        self.entries.push(Toast {
            id,
            kind,
            message: sanitize_text(&message).into_owned(),
            expires_at: now + self.ttl,
        });
        id
    }

    /// Drop expired toasts. Returns `true` if anything was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.entries.len();
        self.entries.retain(|toast| toast.expires_at > now);
        self.entries.len() != before
    }

    /// Toasts still on screen at `now`, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Toast> {
        self.entries.iter().filter(move |toast| toast.expires_at > now)
    }

    /// Every toast pushed and not yet pruned, oldest first.
    pub fn all(&self) -> &[Toast] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_independently() {
        let mut toasts = Toasts::new(Duration::from_secs(5));
        let t0 = Instant::now();
        toasts.push_at(ToastKind::Error, "first", t0);
        toasts.push_at(ToastKind::Error, "second", t0 + Duration::from_secs(2));

        let at = |secs: u64| t0 + Duration::from_secs(secs);
        assert_eq!(toasts.active(at(4)).count(), 2);

        let remaining: Vec<_> = toasts.active(at(6)).map(|t| t.message.as_str()).collect();
        assert_eq!(remaining, vec!["second"]);

        assert_eq!(toasts.active(at(7)).count(), 0);
    }

    #[test]
    fn second_push_does_not_replace_first() {
        let mut toasts = Toasts::default();
        let a = toasts.error("Network error. Please try again.");
        let b = toasts.error("Network error. Please try again.");
        assert_ne!(a, b);
        assert_eq!(toasts.all().len(), 2);
    }

    #[test]
    fn escape_sequences_are_stripped_on_push() {
        let mut toasts = Toasts::default();
        toasts.error("\x1b[2J\x1b]0;owned\x07Moodle is already running");
        assert_eq!(toasts.all()[0].message, "Moodle is already running");
    }

    #[test]
    fn prune_reports_changes() {
        let mut toasts = Toasts::new(Duration::from_millis(10));
        let t0 = Instant::now();
        toasts.push_at(ToastKind::Info, "x", t0);
        assert!(!toasts.prune(t0));
        assert!(toasts.prune(t0 + Duration::from_millis(10)));
        assert!(toasts.is_empty());
        assert!(!toasts.prune(t0 + Duration::from_secs(1)));
    }
}

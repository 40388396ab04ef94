//! Notification and loading state shown on top of the dashboard.

pub mod busy;
pub mod notify;

pub use busy::{BusyGuard, BusyIndicator};
pub use notify::{Toast, ToastKind, Toasts};

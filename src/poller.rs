//! Background work for the dashboard.
//!
//! One timer thread per dashboard session. Every tick spawns independent
//! fetch threads for stats, alerts and logs; their results come back to the
//! event loop over a channel as [`Fetched`] values. A fetch that hangs until
//! the client timeout never holds up the next tick, and nothing coordinates
//! the three fetches with each other.
//!
//! Operator requests (login, logout, process control) run on worker threads
//! too, so the event loop keeps reading input and expiring toasts while they
//! are in flight. Their replies carry the [`BusyGuard`] taken when the
//! request started; the indicator clears once the reply has been handled.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::api::{
    ActionResponse, Alert, ApiClient, ApiError, DashboardSnapshot, LogEntry, LoginResponse,
    ProcessAction, UserSummary,
};
use crate::nav::Refresh;
use crate::ui::BusyGuard;

/// Shortest tick the timer accepts.
const MIN_PERIOD: Duration = Duration::from_millis(50);

/// Result of one piece of background work.
#[derive(Debug)]
pub enum Fetched {
    Stats(Result<DashboardSnapshot, ApiError>),
    Alerts(Result<Vec<Alert>, ApiError>),
    Logs(Result<Vec<LogEntry>, ApiError>),
    Users(Result<Vec<UserSummary>, ApiError>),
    /// Reply to a login submitted from the login screen.
    Login {
        result: Result<LoginResponse, ApiError>,
        busy: BusyGuard,
    },
    /// The logout request finished. The local token is already gone.
    Logout { busy: BusyGuard },
    /// Reply to a start, stop or restart request.
    Action {
        action: ProcessAction,
        result: Result<ActionResponse, ApiError>,
        busy: BusyGuard,
    },
    /// The pause after a successful login is over.
    EnterDashboard,
    /// The worker thread panicked.
    Crashed { task: &'static str, message: String },
}

/// Run a single fetch on its own thread and send the outcome to `tx`.
pub fn spawn_fetch<E>(client: &ApiClient, what: Refresh, log_limit: u32, tx: &Sender<E>)
where
    E: From<Fetched> + Send + 'static,
{
    spawn_fetch_after(client, what, log_limit, Duration::ZERO, tx);
}

/// Like [`spawn_fetch`], but waits `delay` on the worker thread first.
pub fn spawn_fetch_after<E>(
    client: &ApiClient,
    what: Refresh,
    log_limit: u32,
    delay: Duration,
    tx: &Sender<E>,
) where
    E: From<Fetched> + Send + 'static,
{
    let client = client.clone();
    let tx = tx.clone();
    thread::spawn(move || {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        let fetched = run_guarded(task_name(what), || fetch(&client, what, log_limit));
        // The receiver is gone once the dashboard has shut down.
        let _ = tx.send(E::from(fetched));
    });
}

/// The three periodic fetches, each on its own thread.
pub fn fetch_all<E>(client: &ApiClient, log_limit: u32, tx: &Sender<E>)
where
    E: From<Fetched> + Send + 'static,
{
    for what in [Refresh::Stats, Refresh::Alerts, Refresh::Logs] {
        spawn_fetch(client, what, log_limit, tx);
    }
}

fn fetch(client: &ApiClient, what: Refresh, log_limit: u32) -> Fetched {
    match what {
        Refresh::Stats => Fetched::Stats(client.fetch_stats()),
        Refresh::Alerts => Fetched::Alerts(client.fetch_alerts()),
        Refresh::Logs => Fetched::Logs(client.fetch_logs(log_limit)),
        Refresh::Users => Fetched::Users(client.fetch_users()),
    }
}

/// Run an operator request on its own thread and send its reply to `tx`.
/// A panic in `body` comes back as [`Fetched::Crashed`] named `task`.
pub fn spawn_request<E, F>(task: &'static str, tx: &Sender<E>, body: F)
where
    E: From<Fetched> + Send + 'static,
    F: FnOnce() -> Fetched + Send + 'static,
{
    let tx = tx.clone();
    thread::spawn(move || {
        let fetched = run_guarded(task, body);
        let _ = tx.send(E::from(fetched));
    });
}

/// Send `fetched` to `tx` once `delay` has passed.
pub fn send_after<E>(tx: &Sender<E>, delay: Duration, fetched: Fetched)
where
    E: From<Fetched> + Send + 'static,
{
    let tx = tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = tx.send(E::from(fetched));
    });
}

fn run_guarded(task: &'static str, body: impl FnOnce() -> Fetched) -> Fetched {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| Fetched::Crashed {
        task,
        message: panic_message(payload.as_ref()),
    })
}

fn task_name(what: Refresh) -> &'static str {
    match what {
        Refresh::Stats => "stats",
        Refresh::Alerts => "alerts",
        Refresh::Logs => "logs",
        Refresh::Users => "users",
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// Handle to the repeating refresh timer. Stopping is idempotent and also
/// happens on drop.
#[derive(Debug)]
pub struct Poller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start ticking every `period`, or every 50 ms when `period` is
    /// shorter. The first tick fires one full period after start; callers
    /// do their own immediate fetch.
    pub fn start<E>(client: ApiClient, period: Duration, log_limit: u32, tx: Sender<E>) -> Self
    where
        E: From<Fetched> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => fetch_all(&client, log_limit, &tx),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some()
    }

    /// Cancel the timer and wait for the timer thread to exit. Fetches
    /// already in flight finish on their own.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

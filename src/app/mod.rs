//! The console controller.
//!
//! [`Console`] owns all client-side state: session, API client, binding
//! table, navigation, theme, toasts, busy indicator and the refresh timer.
//! It has an explicit lifecycle: [`Console::init_dashboard`] starts polling
//! and fetches once, [`Console::teardown`] stops the timer. Every user action
//! and every background result goes through one of its methods, and the
//! event loop in [`event_loop`] is the only caller in interactive mode.
//!
//! No method blocks on the network. Requests run on worker threads and their
//! replies come back through [`Console::handle_fetched`].

pub mod event_loop;

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::activity::ActivityLog;
use crate::api::{ActionResponse, ApiClient, ApiError, LoginResponse, ProcessAction};
use crate::config::schema::ConsoleConfig;
use crate::nav::{Navigation, Refresh, View};
use crate::poller::{self, Fetched, Poller};
use crate::render::screen::{self, Frame};
use crate::render::{ViewBindings, dashboard};
use crate::session::{Session, Theme};
use crate::theme::ThemeController;
use crate::ui::{BusyIndicator, Toasts};

pub const LOGIN_SUCCESS: &str = "Login successful!";
pub const LOGIN_FAILED: &str = "Login failed";
pub const UNEXPECTED_ERROR: &str = "An error occurred. Please try again.";

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

/// Progress of a login submitted from the login screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginPhase {
    #[default]
    Idle,
    /// Waiting for the server's reply.
    Submitting,
    /// Logged in, waiting to switch to the dashboard.
    Redirecting,
}

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, question: &str) -> bool {
        self(question)
    }
}

pub struct Console {
    config: ConsoleConfig,
    client: ApiClient,
    activity: ActivityLog,
    bindings: ViewBindings,
    nav: Navigation,
    theme: ThemeController,
    toasts: Toasts,
    busy: BusyIndicator,
    route: Route,
    login_phase: LoginPhase,
    poller: Option<Poller>,
}

impl Console {
    pub fn new(config: ConsoleConfig, session: Session, activity: ActivityLog) -> Self {
        let client = ApiClient::new(&config.server, session.clone(), activity.clone());
        let toasts = Toasts::new(config.dashboard.toast_ttl());
        Self {
            client,
            activity,
            bindings: ViewBindings::new(),
            nav: Navigation::new(),
            theme: ThemeController::init(session),
            toasts,
            busy: BusyIndicator::new(),
            route: Route::Dashboard,
            login_phase: LoginPhase::Idle,
            poller: None,
            config,
        }
    }

    // -- Accessors --

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn login_phase(&self) -> LoginPhase {
        self.login_phase
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn bindings(&self) -> &ViewBindings {
        &self.bindings
    }

    pub fn nav(&self) -> &Navigation {
        &self.nav
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    // -- Lifecycle --

    /// Enter dashboard mode: start the timer once and fetch stats, alerts
    /// and logs right away. A missing token does not stop this; the first
    /// 401 sends the operator to the login screen.
    pub fn init_dashboard<E>(&mut self, tx: &Sender<E>)
    where
        E: From<Fetched> + Send + 'static,
    {
        self.route = Route::Dashboard;
        if !self.is_polling() {
            self.poller = Some(Poller::start(
                self.client.clone(),
                self.config.dashboard.refresh_interval(),
                self.config.dashboard.log_limit,
                tx.clone(),
            ));
        }
        poller::fetch_all(&self.client, self.config.dashboard.log_limit, tx);
    }

    /// Stop the refresh timer. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }

    // -- Auth --

    /// Submit a login. The reply arrives as [`Fetched::Login`]; on success
    /// the dashboard follows after the configured redirect delay. Returns
    /// `false` when a login is already under way.
    pub fn login<E>(&mut self, username: &str, password: &str, tx: &Sender<E>) -> bool
    where
        E: From<Fetched> + Send + 'static,
    {
        if self.login_phase != LoginPhase::Idle {
            return false;
        }
        self.login_phase = LoginPhase::Submitting;

        let busy = self.busy.begin();
        let client = self.client.clone();
        let username = username.to_string();
        let password = password.to_string();
        poller::spawn_request("login", tx, move || Fetched::Login {
            result: client.login(&username, &password),
            busy,
        });
        true
    }

    /// Stop polling and log out. The server call is best-effort; the token
    /// is cleared and the login screen shows once it returns.
    pub fn logout<E>(&mut self, tx: &Sender<E>)
    where
        E: From<Fetched> + Send + 'static,
    {
        self.teardown();
        let busy = self.busy.begin();
        let client = self.client.clone();
        poller::spawn_request("logout", tx, move || {
            client.logout();
            Fetched::Logout { busy }
        });
    }

    fn finish_login<E>(&mut self, result: Result<LoginResponse, ApiError>, tx: &Sender<E>)
    where
        E: From<Fetched> + Send + 'static,
    {
        match result {
            Ok(_) => {
                self.toasts.success(LOGIN_SUCCESS);
                self.login_phase = LoginPhase::Redirecting;
                poller::send_after(
                    tx,
                    self.config.dashboard.login_redirect(),
                    Fetched::EnterDashboard,
                );
            }
            Err(err) => {
                self.toasts.error(err.user_message(LOGIN_FAILED));
                self.login_phase = LoginPhase::Idle;
            }
        }
    }

    fn redirect_to_login(&mut self) {
        self.teardown();
        self.route = Route::Login;
    }

    // -- Background results --

    /// Apply one background result. Dashboard data that arrives after a
    /// redirect to the login screen is dropped.
    pub fn handle_fetched<E>(&mut self, fetched: Fetched, tx: &Sender<E>)
    where
        E: From<Fetched> + Send + 'static,
    {
        match fetched {
            Fetched::Login { result, busy } => {
                drop(busy);
                self.finish_login(result, tx);
            }
            Fetched::EnterDashboard => {
                if self.login_phase == LoginPhase::Redirecting {
                    self.login_phase = LoginPhase::Idle;
                    self.init_dashboard(tx);
                }
            }
            Fetched::Logout { busy } => {
                drop(busy);
                self.redirect_to_login();
            }
            Fetched::Crashed { task, message } => {
                match task {
                    "login" => self.login_phase = LoginPhase::Idle,
                    "logout" => {
                        let _ = self.session().clear_token();
                        self.redirect_to_login();
                    }
                    _ => {}
                }
                self.report_internal(&format!("worker {task}"), &message);
            }
            _ if self.route == Route::Login => {}
            Fetched::Stats(result) => match result {
                Ok(snapshot) => dashboard::apply_snapshot(&mut self.bindings, &snapshot),
                Err(err) => self.handle_api_error(&err, "Failed to load dashboard data"),
            },
            Fetched::Alerts(result) => match result {
                Ok(alerts) => dashboard::apply_alerts(&mut self.bindings, &alerts),
                Err(err) => self.handle_api_error(&err, "Failed to load alerts"),
            },
            Fetched::Logs(result) => match result {
                Ok(logs) => dashboard::apply_logs(&mut self.bindings, &logs),
                Err(err) => self.handle_api_error(&err, "Failed to load logs"),
            },
            Fetched::Users(result) => match result {
                Ok(users) => dashboard::apply_users(&mut self.bindings, &users),
                Err(err) => self.handle_api_error(&err, "Failed to load users"),
            },
            Fetched::Action {
                action,
                result,
                busy,
            } => {
                drop(busy);
                self.finish_action(action, result, tx);
            }
        }
    }

    /// 401 goes straight to the login screen without a toast; everything
    /// else becomes an error toast.
    pub fn handle_api_error(&mut self, err: &ApiError, fallback: &str) {
        match err {
            ApiError::Unauthorized => self.redirect_to_login(),
            _ => {
                self.toasts.error(err.user_message(fallback));
            }
        }
    }

    /// Record an unexpected failure and show the generic error toast.
    pub fn report_internal(&mut self, context: &str, message: &str) {
        self.activity.record_internal(context, message);
        self.toasts.error(UNEXPECTED_ERROR);
    }

    // -- User actions --

    /// Start, stop or restart the managed process.
    ///
    /// Stop and restart ask `confirm` first; a "no" sends nothing. The reply
    /// arrives as [`Fetched::Action`], and a success schedules a stats
    /// refresh after the action's settle delay. Returns `true` when a
    /// request went out.
    pub fn run_process_action<E>(
        &mut self,
        action: ProcessAction,
        confirm: &dyn Confirm,
        tx: &Sender<E>,
    ) -> bool
    where
        E: From<Fetched> + Send + 'static,
    {
        if action.needs_confirmation() && !confirm.confirm(action.confirmation_prompt()) {
            return false;
        }

        let busy = self.busy.begin();
        let client = self.client.clone();
        poller::spawn_request(action.as_str(), tx, move || Fetched::Action {
            action,
            result: client.process_action(action),
            busy,
        });
        true
    }

    fn finish_action<E>(
        &mut self,
        action: ProcessAction,
        result: Result<ActionResponse, ApiError>,
        tx: &Sender<E>,
    ) where
        E: From<Fetched> + Send + 'static,
    {
        match result {
            Ok(response) => {
                let message = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| action.success_message().to_string());
                self.toasts.success(message);
                poller::spawn_fetch_after(
                    &self.client,
                    Refresh::Stats,
                    self.config.dashboard.log_limit,
                    self.settle_delay(action),
                    tx,
                );
            }
            Err(err) => self.handle_api_error(&err, action.failure_message()),
        }
    }

    fn settle_delay(&self, action: ProcessAction) -> Duration {
        let ms = match action {
            ProcessAction::Start => self.config.dashboard.start_settle_ms,
            ProcessAction::Stop => self.config.dashboard.stop_settle_ms,
            ProcessAction::Restart => self.config.dashboard.restart_settle_ms,
        };
        Duration::from_millis(ms)
    }

    /// Switch views and kick off whatever lists the new view refreshes.
    pub fn select_view<E>(&mut self, view: View, tx: &Sender<E>)
    where
        E: From<Fetched> + Send + 'static,
    {
        for &what in self.nav.select(view) {
            poller::spawn_fetch(&self.client, what, self.config.dashboard.log_limit, tx);
        }
    }

    /// Manual refresh: the same three fetches as a timer tick.
    pub fn refresh_all<E>(&mut self, tx: &Sender<E>)
    where
        E: From<Fetched> + Send + 'static,
    {
        poller::fetch_all(&self.client, self.config.dashboard.log_limit, tx);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.toasts.info(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.toasts.error(message);
    }

    /// Drop expired toasts. Returns `true` when the screen changed.
    pub fn prune_toasts(&mut self, now: Instant) -> bool {
        self.toasts.prune(now)
    }

    // -- Drawing --

    /// Compose the current screen. `prompt` is a pending confirmation
    /// question on the dashboard, or the login field being asked for.
    pub fn render(&self, prompt: Option<&str>, now: Instant) -> String {
        let toasts: Vec<_> = self.toasts.active(now).collect();
        match self.route {
            Route::Login => {
                let mut out =
                    screen::compose_login(self.theme.palette(), &toasts, self.client.base_url());
                if let Some(field) = prompt {
                    out.push('\n');
                    out.push_str(field);
                }
                out
            }
            Route::Dashboard => {
                let settings = self.settings_rows();
                screen::compose(&Frame {
                    nav: &self.nav,
                    bindings: &self.bindings,
                    palette: self.theme.palette(),
                    theme_icon: self.theme.icon(),
                    busy: self.busy.is_busy(),
                    toasts,
                    prompt,
                    settings: &settings,
                })
            }
        }
    }

    fn settings_rows(&self) -> Vec<(String, String)> {
        let server = &self.config.server;
        let dash = &self.config.dashboard;
        vec![
            ("server.base_url".into(), server.base_url.clone()),
            ("server.timeout_ms".into(), server.timeout_ms.to_string()),
            (
                "dashboard.refresh_interval_ms".into(),
                dash.refresh_interval_ms.to_string(),
            ),
            ("dashboard.log_limit".into(), dash.log_limit.to_string()),
            ("dashboard.toast_ttl_ms".into(), dash.toast_ttl_ms.to_string()),
            (
                "logging.activity_log".into(),
                self.config.logging.activity_log.to_string(),
            ),
            ("theme".into(), self.theme.current().to_string()),
        ]
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn offline_console() -> Console {
        let mut config = ConsoleConfig::default();
        config.server.base_url = "http://127.0.0.1:9".to_string();
        config.server.timeout_ms = 500;
        Console::new(config, Session::in_memory(), ActivityLog::disabled())
    }

    fn apply(console: &mut Console, fetched: Fetched) {
        let (tx, _rx) = mpsc::channel::<Fetched>();
        console.handle_fetched(fetched, &tx);
    }

    #[test]
    fn unauthorized_redirects_without_toast() {
        let mut console = offline_console();
        apply(&mut console, Fetched::Alerts(Err(ApiError::Unauthorized)));
        assert_eq!(console.route(), Route::Login);
        assert!(console.toasts().is_empty());
    }

    #[test]
    fn results_after_redirect_are_dropped() {
        let mut console = offline_console();
        console.handle_api_error(&ApiError::Unauthorized, "x");
        apply(
            &mut console,
            Fetched::Logs(Err(ApiError::Network {
                message: "refused".into(),
            })),
        );
        assert!(console.toasts().is_empty());
    }

    #[test]
    fn server_error_uses_server_message_then_fallback() {
        let mut console = offline_console();
        apply(
            &mut console,
            Fetched::Stats(Err(ApiError::Server {
                status: 500,
                message: Some("Failed to get system stats".into()),
            })),
        );
        apply(
            &mut console,
            Fetched::Stats(Err(ApiError::Decode {
                message: "bad json".into(),
            })),
        );
        let messages: Vec<_> = console.toasts().all().iter().map(|t| &t.message).collect();
        assert_eq!(
            messages,
            vec!["Failed to get system stats", "Failed to load dashboard data"]
        );
    }

    #[test]
    fn server_text_cannot_drive_the_terminal() {
        let mut console = offline_console();
        apply(
            &mut console,
            Fetched::Stats(Err(ApiError::Server {
                status: 500,
                message: Some("\x1b[2J\x1b]0;owned\x07wiped".into()),
            })),
        );
        let screen = console.render(None, Instant::now());
        assert!(screen.contains("wiped"));
        assert!(!screen.contains("\x1b[2J"));
        assert!(!screen.contains("\x1b]0;"));
    }

    #[test]
    fn declined_confirmation_sends_nothing() {
        let mut console = offline_console();
        let (tx, rx) = mpsc::channel::<Fetched>();
        let sent = console.run_process_action(ProcessAction::Stop, &|_: &str| false, &tx);
        assert!(!sent);
        assert!(!console.busy().is_busy());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn action_stays_busy_until_reply_is_handled() {
        let mut console = offline_console();
        let (tx, rx) = mpsc::channel::<Fetched>();
        assert!(console.run_process_action(ProcessAction::Restart, &|_: &str| true, &tx));
        assert!(console.busy().is_busy());

        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(console.busy().is_busy());
        console.handle_fetched(reply, &tx);

        assert!(!console.busy().is_busy());
        let messages: Vec<_> = console.toasts().all().iter().map(|t| &t.message).collect();
        assert_eq!(messages, vec!["Network error. Please try again."]);
    }

    #[test]
    fn second_login_is_refused_while_first_is_in_flight() {
        let mut console = offline_console();
        let (tx, rx) = mpsc::channel::<Fetched>();
        assert!(console.login("admin", "pw", &tx));
        assert_eq!(console.login_phase(), LoginPhase::Submitting);
        assert!(!console.login("admin", "pw", &tx));

        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        console.handle_fetched(reply, &tx);
        assert_eq!(console.login_phase(), LoginPhase::Idle);
        assert!(!console.busy().is_busy());
    }

    #[test]
    fn crashed_login_worker_resets_the_form() {
        let mut console = offline_console();
        let (tx, _rx) = mpsc::channel::<Fetched>();
        console.login_phase = LoginPhase::Submitting;
        console.handle_fetched(
            Fetched::Crashed {
                task: "login",
                message: "boom".into(),
            },
            &tx,
        );
        assert_eq!(console.login_phase(), LoginPhase::Idle);
        assert_eq!(console.toasts().all()[0].message, UNEXPECTED_ERROR);
    }

    #[test]
    fn stray_redirect_is_ignored() {
        let mut console = offline_console();
        console.handle_api_error(&ApiError::Unauthorized, "x");
        apply(&mut console, Fetched::EnterDashboard);
        assert_eq!(console.route(), Route::Login);
        assert!(!console.is_polling());
    }

    #[test]
    fn crashed_fetch_shows_generic_error() {
        let mut console = offline_console();
        apply(
            &mut console,
            Fetched::Crashed {
                task: "stats",
                message: "boom".into(),
            },
        );
        assert_eq!(console.toasts().all()[0].message, UNEXPECTED_ERROR);
        assert_eq!(console.route(), Route::Dashboard);
    }

    #[test]
    fn settings_view_lists_effective_values() {
        let mut console = offline_console();
        let (tx, _rx) = mpsc::channel::<Fetched>();
        console.select_view(View::Settings, &tx);
        let out = console.render(None, Instant::now());
        assert!(out.contains("dashboard.refresh_interval_ms"));
        assert!(out.contains("http://127.0.0.1:9"));
    }
}

/// HTTP client for the LMS Manager backend.
///
/// Synchronous, built on a shared `ureq` agent so the poller threads and the
/// controller reuse one connection pool. Provides:
///
/// - **Auth**: `POST /login`, `POST /logout`.
/// - **Reads**: stats, alerts, logs, process status, users, health.
/// - **Process control**: start, stop and restart of the managed process.
///
/// Authenticated calls send `Authorization: Bearer <token>` when the session
/// holds a token. A 401 from any of them clears the token before
/// [`ApiError::Unauthorized`] is returned. Nothing is retried.
pub mod error;
pub mod types;

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::activity::ActivityLog;
use crate::config::schema::ServerConfig;
use crate::session::Session;

pub use error::ApiError;
pub use types::{
    ActionResponse, Alert, DashboardSnapshot, LogEntry, LoginResponse, MoodleStatus, UserSummary,
};

use types::{ErrorBody, LoginRequest};

/// Default number of log entries requested by the dashboard.
pub const DEFAULT_LOG_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// Process actions
// ---------------------------------------------------------------------------

/// Control operation on the managed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAction {
    Start,
    Stop,
    Restart,
}

impl ProcessAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Start => "/api/moodle/start",
            Self::Stop => "/api/moodle/stop",
            Self::Restart => "/api/moodle/restart",
        }
    }

    /// Whether the operator has to confirm before the request is sent.
    pub fn needs_confirmation(self) -> bool {
        matches!(self, Self::Stop | Self::Restart)
    }

    pub fn confirmation_prompt(self) -> &'static str {
        match self {
            Self::Start => "Start Moodle?",
            Self::Stop => "Are you sure you want to stop Moodle?",
            Self::Restart => "Are you sure you want to restart Moodle?",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Start => "Moodle started successfully",
            Self::Stop => "Moodle stopped successfully",
            Self::Restart => "Moodle restarted successfully",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Start => "Failed to start Moodle",
            Self::Stop => "Failed to stop Moodle",
            Self::Restart => "Failed to restart Moodle",
        }
    }
}

impl fmt::Display for ProcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// One outgoing request, before it is sent.
struct Call<'a> {
    method: &'static str,
    path: &'a str,
    query: Vec<(&'static str, String)>,
    auth: Auth,
}

impl<'a> Call<'a> {
    fn get(path: &'a str) -> Self {
        Self {
            method: "GET",
            path,
            query: Vec::new(),
            auth: Auth::Bearer,
        }
    }

    fn post(path: &'a str) -> Self {
        Self {
            method: "POST",
            ..Self::get(path)
        }
    }

    fn anonymous(mut self) -> Self {
        self.auth = Auth::None;
        self
    }

    fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }
}

/// Synchronous LMS Manager client.
///
/// Cheap to clone; clones share the agent, the session and the activity log.
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    session: Session,
    activity: ActivityLog,
}

impl ApiClient {
    pub fn new(config: &ServerConfig, session: Session, activity: ActivityLog) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            activity,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    // -- Auth --

    /// Authenticate and store the returned token.
    ///
    /// A 401 here is a rejected password, not an expired session: it comes
    /// back as [`ApiError::Server`] carrying the server's message.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { username, password };
        let response: LoginResponse = self.json(Call::post("/login").anonymous(), Some(&body))?;
        if response.token.is_empty() {
            return Err(ApiError::Decode {
                message: "login response carried no token".to_string(),
            });
        }
        // A session that cannot be persisted still works for this process.
        let _ = self.session.set_token(&response.token);
        Ok(response)
    }

    /// Best-effort server logout followed by an unconditional local logout.
    ///
    /// The token is cleared even when the request fails or times out.
    pub fn logout(&self) {
        let _ = self.unit(Call::post("/logout"));
        let _ = self.session.clear_token();
    }

    // -- Reads --

    pub fn fetch_stats(&self) -> Result<DashboardSnapshot, ApiError> {
        self.json(Call::get("/api/stats"), None::<&()>)
    }

    pub fn fetch_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        self.json(Call::get("/api/alerts"), None::<&()>)
    }

    pub fn fetch_logs(&self, limit: u32) -> Result<Vec<LogEntry>, ApiError> {
        self.json(Call::get("/api/logs").query("limit", limit), None::<&()>)
    }

    pub fn fetch_moodle_status(&self) -> Result<MoodleStatus, ApiError> {
        self.json(Call::get("/api/moodle/status"), None::<&()>)
    }

    pub fn fetch_users(&self) -> Result<Vec<UserSummary>, ApiError> {
        self.json(Call::get("/api/users"), None::<&()>)
    }

    /// `GET /health`: `Ok` when the backend answers with a 2xx.
    pub fn health(&self) -> Result<(), ApiError> {
        self.unit(Call::get("/health").anonymous())
    }

    // -- Process control --

    /// Send a start/stop/restart request. Confirmation is the caller's job.
    pub fn process_action(&self, action: ProcessAction) -> Result<ActionResponse, ApiError> {
        self.json(Call::post(action.path()), None::<&()>)
    }

    // -- Internal --

    fn json<T, B>(&self, call: Call<'_>, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let started = Instant::now();
        let result = self.send(&call, body).and_then(|response| {
            let status = response.status();
            response
                .into_json::<T>()
                .map(|value| (status, value))
                .map_err(|e| ApiError::Decode {
                    message: e.to_string(),
                })
        });
        self.log(&call, started, result.as_ref().map(|(status, _)| *status));
        result.map(|(_, value)| value)
    }

    fn unit(&self, call: Call<'_>) -> Result<(), ApiError> {
        let started = Instant::now();
        let result = self.send(&call, None::<&()>).map(|response| {
            let status = response.status();
            // Drain so the connection can go back to the pool.
            let _ = response.into_string();
            status
        });
        self.log(&call, started, result.as_ref().copied());
        result.map(|_| ())
    }

    fn send<B: Serialize>(
        &self,
        call: &Call<'_>,
        body: Option<&B>,
    ) -> Result<ureq::Response, ApiError> {
        let url = format!("{}{}", self.base_url, call.path);
        let mut request = self.agent.request(call.method, &url);
        for (key, value) in &call.query {
            request = request.query(key, value);
        }
        if call.auth == Auth::Bearer
            && let Some(token) = self.session.token()
        {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(401, _)) if call.auth == Auth::Bearer => {
                let _ = self.session.clear_token();
                Err(ApiError::Unauthorized)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body: ErrorBody = response.into_json().unwrap_or_default();
                Err(ApiError::Server {
                    status,
                    message: body.error,
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(ApiError::Network {
                message: transport.to_string(),
            }),
        }
    }

    fn log(&self, call: &Call<'_>, started: Instant, result: Result<u16, &ApiError>) {
        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(status) => self.activity.record_request(
                call.method,
                call.path,
                Some(status),
                "ok",
                latency_ms,
                None,
            ),
            Err(error) => self.activity.record_request(
                call.method,
                call.path,
                error.status(),
                error.outcome(),
                latency_ms,
                Some(&error.to_string()),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

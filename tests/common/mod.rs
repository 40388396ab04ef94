//! Scripted LMS Manager backend for integration tests.
//!
//! Serves canned JSON replies per `(method, path)` on an ephemeral port and
//! records every request it sees. Unknown routes answer 404.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tiny_http::{Header, Response, Server, StatusCode};

use lms_console::activity::ActivityLog;
use lms_console::api::ApiClient;
use lms_console::app::Console;
use lms_console::config::schema::{ConsoleConfig, ServerConfig};
use lms_console::poller::Fetched;
use lms_console::session::Session;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: String,
}

type Routes = Arc<Mutex<HashMap<(String, String), Reply>>>;

pub struct StubBackend {
    base_url: String,
    routes: Routes,
    requests: Arc<Mutex<Vec<Recorded>>>,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
}

impl StubBackend {
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind stub backend"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("stub backend listens on TCP");
        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();

        let handle = {
            let server = Arc::clone(&server);
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let recorded = Recorded {
                        method: request.method().to_string(),
                        url: request.url().to_string(),
                        authorization: request
                            .headers()
                            .iter()
                            .find(|h| h.field.equiv("Authorization"))
                            .map(|h| h.value.as_str().to_string()),
                        body,
                    };
                    let key = (recorded.method.clone(), recorded.path().to_string());
                    requests.lock().push(recorded);

                    let reply = routes.lock().get(&key).cloned().unwrap_or(Reply {
                        status: 404,
                        body: r#"{"error": "not found"}"#.to_string(),
                    });
                    let response = Response::from_data(reply.body.into_bytes())
                        .with_header(
                            Header::from_bytes("Content-Type", "application/json").unwrap(),
                        )
                        .with_status_code(StatusCode(reply.status));
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            base_url: format!("http://{addr}"),
            routes,
            requests,
            server,
            handle: Some(handle),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer `method path` with `status` and `body` from now on.
    pub fn route(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.routes.lock().insert(
            (method.to_string(), path.to_string()),
            Reply {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path() == path)
            .collect()
    }

    /// Console config pointing at this backend. The refresh timer is set
    /// long enough that it never fires during a test.
    pub fn config(&self) -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.server.base_url = self.base_url.clone();
        config.server.timeout_ms = 2_000;
        config.dashboard.refresh_interval_ms = 600_000;
        config.dashboard.start_settle_ms = 20;
        config.dashboard.stop_settle_ms = 20;
        config.dashboard.restart_settle_ms = 30;
        config.dashboard.login_redirect_ms = 10;
        config.logging.activity_log = false;
        config
    }

    pub fn console(&self, session: Session) -> Console {
        Console::new(self.config(), session, ActivityLog::disabled())
    }

    pub fn client(&self, session: Session, activity: ActivityLog) -> ApiClient {
        let server = ServerConfig {
            base_url: self.base_url.clone(),
            timeout_ms: 2_000,
        };
        ApiClient::new(&server, session, activity)
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Wait for `n` background results and feed them to the console.
pub fn drain(console: &mut Console, tx: &Sender<Fetched>, rx: &Receiver<Fetched>, n: usize) {
    for _ in 0..n {
        let fetched = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("background work finished");
        console.handle_fetched(fetched, tx);
    }
}

pub const STATS_JSON: &str = r#"{
    "cpu_usage": 42.5,
    "memory_usage": 65.0,
    "disk_usage": 81.2,
    "uptime": 90000,
    "moodle_status": {"running": true, "version": "4.3.2", "uptime": 3665, "process_id": 4242}
}"#;

pub const ALERTS_JSON: &str = r#"[
    {"id": "a1", "type": "cpu", "severity": "high", "message": "CPU usage above 90%", "timestamp": "2025-01-09T10:00:00Z", "resolved": false},
    {"id": "a2", "type": "disk", "severity": "medium", "message": "Disk filling up", "timestamp": "2025-01-09T09:00:00Z", "resolved": false}
]"#;

pub const LOGS_JSON: &str = r#"[
    {"id": "l1", "timestamp": "2025-01-09T10:00:00Z", "level": "info", "message": "Moodle started", "source": "manager"}
]"#;

//! Interactive dashboard loop.
//!
//! A single thread owns the [`Console`] and handles one [`Event`] at a time.
//! Stdin is read on its own thread, and fetch results and request replies
//! arrive from worker threads. Nothing here waits on the network, so input
//! and toast expiry keep moving while requests are in flight. A handler
//! that fails or panics is reported on screen and the loop carries on.

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::api::ProcessAction;
use crate::nav::View;
use crate::poller::{Fetched, panic_message};

use super::{Console, LoginPhase, Route};

/// How often the loop wakes up to expire toasts when nothing else happens.
const IDLE_TICK: Duration = Duration::from_millis(500);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const HELP: &str = "Commands: 1-8 or a view name, start, stop, restart, refresh, theme, logout, quit";

#[derive(Debug)]
pub enum Event {
    Fetched(Fetched),
    Input(String),
    InputClosed,
}

impl From<Fetched> for Event {
    fn from(fetched: Fetched) -> Self {
        Self::Fetched(fetched)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Which login field is being asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoginStep {
    Username,
    Password { username: String },
}

struct LoopState {
    pending: Option<ProcessAction>,
    login: LoginStep,
}

impl LoopState {
    fn new() -> Self {
        Self {
            pending: None,
            login: LoginStep::Username,
        }
    }

    fn prompt(&self, console: &Console) -> Option<&'static str> {
        match console.route() {
            Route::Dashboard => self.pending.map(ProcessAction::confirmation_prompt),
            Route::Login => match (console.login_phase(), &self.login) {
                (LoginPhase::Submitting, _) => Some("Logging in..."),
                (LoginPhase::Redirecting, _) => None,
                (LoginPhase::Idle, LoginStep::Username) => Some("Username: "),
                (LoginPhase::Idle, LoginStep::Password { .. }) => Some("Password: "),
            },
        }
    }
}

/// Run the dashboard until the operator quits or stdin closes.
pub fn run(console: &mut Console) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Event>();
    spawn_input_reader(tx.clone());

    let mut state = LoopState::new();

    console.init_dashboard(&tx);
    draw(console, &state)?;

    loop {
        let event = match rx.recv_timeout(IDLE_TICK) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let mut dirty = event.is_some();
        if let Some(event) = event {
            let flow = guarded(console, |console| handle(console, &mut state, event, &tx));
            if flow == Flow::Quit {
                break;
            }
        }

        dirty |= console.prune_toasts(Instant::now());
        if dirty {
            draw(console, &state)?;
        }
    }

    console.teardown();
    println!();
    Ok(())
}

/// Run one handler. An error or a panic becomes the generic error toast
/// and the session continues.
fn guarded(console: &mut Console, body: impl FnOnce(&mut Console) -> Result<Flow>) -> Flow {
    match panic::catch_unwind(AssertUnwindSafe(|| body(console))) {
        Ok(Ok(flow)) => flow,
        Ok(Err(err)) => {
            console.report_internal("event loop", &format!("{err:#}"));
            Flow::Continue
        }
        Err(payload) => {
            console.report_internal("event loop", &panic_message(payload.as_ref()));
            Flow::Continue
        }
    }
}

fn handle(
    console: &mut Console,
    state: &mut LoopState,
    event: Event,
    tx: &Sender<Event>,
) -> Result<Flow> {
    let route_before = console.route();
    let flow = match event {
        Event::Fetched(fetched) => {
            console.handle_fetched(fetched, tx);
            Flow::Continue
        }
        Event::InputClosed => Flow::Quit,
        Event::Input(line) => match console.route() {
            Route::Login => handle_login_input(console, state, line.trim(), tx),
            Route::Dashboard => handle_dashboard_input(console, state, line.trim(), tx),
        },
    };

    // Whatever was pending belongs to the screen we just left.
    if console.route() != route_before {
        state.pending = None;
        state.login = LoginStep::Username;
    }
    Ok(flow)
}

fn handle_login_input(
    console: &mut Console,
    state: &mut LoopState,
    input: &str,
    tx: &Sender<Event>,
) -> Flow {
    if matches!(input, "quit" | "exit" | "q") {
        return Flow::Quit;
    }
    if console.login_phase() != LoginPhase::Idle {
        return Flow::Continue;
    }

    match std::mem::replace(&mut state.login, LoginStep::Username) {
        LoginStep::Username => {
            if !input.is_empty() {
                state.login = LoginStep::Password {
                    username: input.to_string(),
                };
            }
        }
        LoginStep::Password { username } => {
            console.login(&username, input, tx);
        }
    }
    Flow::Continue
}

fn handle_dashboard_input(
    console: &mut Console,
    state: &mut LoopState,
    input: &str,
    tx: &Sender<Event>,
) -> Flow {
    if let Some(action) = state.pending.take() {
        let accepted = matches!(input.to_ascii_lowercase().as_str(), "y" | "yes");
        console.run_process_action(action, &move |_: &str| accepted, tx);
        return Flow::Continue;
    }

    let command = input.to_ascii_lowercase();
    match command.as_str() {
        "" => {}
        "quit" | "exit" | "q" => return Flow::Quit,
        "help" | "?" => console.info(HELP),
        "start" | "stop" | "restart" => {
            let action = match command.as_str() {
                "start" => ProcessAction::Start,
                "stop" => ProcessAction::Stop,
                _ => ProcessAction::Restart,
            };
            if action.needs_confirmation() {
                state.pending = Some(action);
            } else {
                console.run_process_action(action, &|_: &str| true, tx);
            }
        }
        "refresh" | "r" => console.refresh_all(tx),
        "theme" | "t" => {
            console.toggle_theme();
        }
        "logout" => console.logout(tx),
        _ => match View::parse(input) {
            Some(view) => console.select_view(view, tx),
            None => console.error(format!("Unknown command: {input}. Type 'help'.")),
        },
    }
    Flow::Continue
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

fn spawn_input_reader(tx: Sender<Event>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

fn draw(console: &Console, state: &LoopState) -> Result<()> {
    let screen = console.render(state.prompt(console), Instant::now());
    let mut stdout = io::stdout().lock();
    write!(stdout, "{CLEAR_SCREEN}{screen}")?;
    if console.route() == Route::Dashboard && state.pending.is_none() {
        write!(stdout, "\n> ")?;
    }
    stdout.flush().context("failed to flush terminal")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

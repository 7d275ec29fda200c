use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use unfollow_client::{ensure_state_dir, EngineHandle};
use unfollow_core::{update, AppState, BatchKind, EpochMillis, Msg, OperationId};
use unfollow_logging::{unfollow_info, unfollow_warn};

use super::commands::{parse_command, Command};
use super::config::{AppConfig, CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::persistence::CandidateStorage;
use super::{logging, ui};

const FRAME: Duration = Duration::from_millis(250);

enum AppEvent {
    Line(String),
    InputClosed,
    Tick,
}

/// A yes/no question asked by the terminal before an irreversible request.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Confirmation {
    CancelOperation(OperationId),
    ClearBatches,
}

impl Confirmation {
    fn question(&self) -> String {
        match self {
            Confirmation::CancelOperation(id) => format!("Cancel operation {id}?"),
            Confirmation::ClearBatches => {
                "Clear all batch operations on the server?".to_string()
            }
        }
    }

    fn into_msg(self) -> Msg {
        match self {
            Confirmation::CancelOperation(operation_id) => {
                Msg::CancelOperationClicked { operation_id }
            }
            Confirmation::ClearBatches => Msg::ClearBatchesClicked,
        }
    }
}

/// What the console does with one parsed command.
#[derive(Debug, PartialEq)]
enum Action {
    Dispatch(Msg),
    Ask(Confirmation),
    Answered,
    ReadFile(PathBuf),
    ShowHelp,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::load(Path::new(CONFIG_FILENAME))?
        .with_overrides(|name| std::env::var(name).ok());
    ensure_state_dir(&config.state_dir)
        .with_context(|| format!("preparing {}", config.state_dir.display()))?;
    logging::initialize(config.log_destination, &config.state_dir);
    unfollow_info!("Starting unfollow console against {}", config.base_url);

    let engine = EngineHandle::new(&config.client_settings()).context("starting network engine")?;
    let storage = CandidateStorage::new(config.state_dir.clone());
    let restored = storage.load();
    let runner = EffectRunner::new(engine, storage);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    spawn_input_reader(event_tx.clone());
    thread::spawn(move || {
        while event_tx.send(AppEvent::Tick).is_ok() {
            thread::sleep(FRAME);
        }
    });

    let mut console = Console::new(
        AppState::new().with_banner_lifetime(config.banner_lifetime_ms()),
        runner,
    );
    if let Some(address) = std::env::args().nth(1) {
        console.dispatch(Msg::LoginRedirect(address));
    }
    console.dispatch(Msg::CandidatesRestored(restored));
    console.dispatch(Msg::Started { now_ms: now_ms() });
    console.redraw();

    loop {
        let event = match event_rx.recv_timeout(FRAME) {
            Ok(event) => Some(event),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        match event {
            Some(AppEvent::Line(line)) => {
                if !console.handle_line(&line) {
                    break;
                }
            }
            Some(AppEvent::InputClosed) => break,
            Some(AppEvent::Tick) => console.dispatch(Msg::Tick { now_ms: now_ms() }),
            None => {}
        }
        console.drain_engine();
        console.render_if_needed();
    }

    unfollow_info!("Unfollow console exiting");
    Ok(())
}

fn spawn_input_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(AppEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    unfollow_warn!("Failed to read input: {}", err);
                    break;
                }
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}

fn now_ms() -> EpochMillis {
    Utc::now().timestamp_millis()
}

struct Console {
    state: AppState,
    runner: EffectRunner,
    confirmation: Option<Confirmation>,
    note: Option<String>,
    show_help: bool,
    needs_redraw: bool,
}

impl Console {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self {
            state,
            runner,
            confirmation: None,
            note: None,
            show_help: false,
            needs_redraw: true,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn drain_engine(&mut self) {
        while let Some(msg) = self.runner.try_recv(now_ms()) {
            self.dispatch(msg);
        }
    }

    /// Returns false when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        self.note = None;
        self.show_help = false;
        self.needs_redraw = true;

        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(err) => {
                self.note = Some(err.to_string());
                return true;
            }
        };

        let batch_pending = self.state.view().pending_batch.is_some();
        match plan_action(command, batch_pending, &mut self.confirmation) {
            Action::Dispatch(msg) => self.dispatch(msg),
            Action::Ask(confirmation) => self.confirmation = Some(confirmation),
            Action::Answered => {}
            Action::ReadFile(path) => self.dispatch(read_upload(&path)),
            Action::ShowHelp => self.show_help = true,
            Action::Quit => return false,
        }
        true
    }

    fn redraw(&mut self) {
        let view = self.state.view();
        let question = self.confirmation.as_ref().map(Confirmation::question);
        let mut frame = String::from(ui::constants::CLEAR_SCREEN);
        if self.show_help {
            frame.push_str(ui::constants::HELP_TEXT);
            frame.push('\n');
            frame.push_str(ui::constants::RULE);
            frame.push('\n');
        }
        if let Some(note) = &self.note {
            frame.push_str(note);
            frame.push('\n');
        }
        frame.push_str(&ui::render::render(&view, question.as_deref()));

        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(frame.as_bytes());
        let _ = stdout.flush();
        self.needs_redraw = false;
    }

    fn render_if_needed(&mut self) {
        let dirty = self.state.consume_dirty();
        if dirty || self.needs_redraw {
            self.redraw();
        }
    }
}

fn plan_action(
    command: Command,
    batch_pending: bool,
    confirmation: &mut Option<Confirmation>,
) -> Action {
    match command {
        Command::Yes | Command::No => {
            let accepted = command == Command::Yes;
            if batch_pending {
                return Action::Dispatch(if accepted {
                    Msg::BatchConfirmed
                } else {
                    Msg::BatchDismissed
                });
            }
            match confirmation.take() {
                Some(question) if accepted => Action::Dispatch(question.into_msg()),
                _ => Action::Answered,
            }
        }
        other => {
            *confirmation = None;
            match other {
                Command::Load(path) => Action::ReadFile(path),
                Command::Paste(text) => Action::Dispatch(Msg::TextPasted(text)),
                Command::Add(name) => Action::Dispatch(Msg::UsernameEntered(name)),
                Command::Select(username) => Action::Dispatch(Msg::CandidateToggled {
                    username,
                    selected: true,
                }),
                Command::Unselect(username) => Action::Dispatch(Msg::CandidateToggled {
                    username,
                    selected: false,
                }),
                Command::SelectAll => Action::Dispatch(Msg::SelectAllClicked),
                Command::SelectNone => Action::Dispatch(Msg::SelectNoneClicked),
                Command::Clear => Action::Dispatch(Msg::ClearCandidatesClicked),
                Command::Batch => Action::Dispatch(Msg::BatchRequested(BatchKind::Regular)),
                Command::Slow(interval_minutes) => {
                    Action::Dispatch(Msg::BatchRequested(BatchKind::Slow { interval_minutes }))
                }
                Command::Refresh => Action::Dispatch(Msg::RefreshClicked),
                Command::Details(operation_id) => {
                    Action::Dispatch(Msg::DetailsRequested { operation_id })
                }
                Command::Close => Action::Dispatch(Msg::DetailsDismissed),
                Command::Cancel(id) => Action::Ask(Confirmation::CancelOperation(id)),
                Command::ClearBatches => Action::Ask(Confirmation::ClearBatches),
                Command::Token => Action::Dispatch(Msg::RefreshTokenClicked),
                Command::Log => Action::Dispatch(Msg::AlertLogToggled),
                Command::Help => Action::ShowHelp,
                Command::Quit => Action::Quit,
                Command::Yes | Command::No => Action::Answered,
            }
        }
    }
}

fn read_upload(path: &Path) -> Msg {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match fs::read_to_string(path) {
        Ok(contents) => Msg::FileLoaded { name, contents },
        Err(err) => Msg::FileUnreadable {
            name,
            reason: err.to_string(),
        },
    }
}

//! Line-mode terminal front-end
//!
//! Reads one line at a time from stdin. A plain line is sent as a message,
//! lines starting with `/` are commands. The screen is redrawn after every
//! input, sync event and send completion.

use std::future::pending;
use std::io;
use std::sync::Arc;

use parley_core::text::truncate;
use parley_core::{CountLevel, DisplayName, Message, NewMessage, MAX_AUTHOR_LENGTH};
use parley_net::MessageTransport;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{SyncEvent, SyncSnapshot};
use crate::state::AppState;
use crate::sync::{SendError, SyncHandle, SyncManager, SyncOptions};
use crate::viewmodel::{
    directive_for, ChatScreen, Composer, ScrollDirective, UsernameEditor, Viewport,
};

/// Lines scrolled by `/up` and `/down` without a count
pub const PAGE_LINES: usize = 10;

/// Header, separators and footer around the log area
const CHROME_LINES: usize = 7;

const HEADER_NAME_WIDTH: usize = 40;

const DEFAULT_TERMINAL_LINES: usize = 24;

const HELP_TEXT: &str =
    "/name [new name]  /retry  /up [n]  /down [n]  /bottom  /quit  (//text sends \"/text\")";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line: resend a draft kept after a failed send
    Empty,
    Send(String),
    /// Show (`None`) or change the display name
    Name(Option<String>),
    Retry,
    Up(usize),
    Down(usize),
    Bottom,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Send(line.to_string());
    };
    if command.starts_with('/') {
        return Input::Send(command.to_string());
    }

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "name" if arg.is_empty() => Input::Name(None),
        "name" => Input::Name(Some(arg.to_string())),
        "retry" => Input::Retry,
        "up" => Input::Up(parse_count(arg)),
        "down" => Input::Down(parse_count(arg)),
        "bottom" => Input::Bottom,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

fn parse_count(arg: &str) -> usize {
    arg.parse().unwrap_or(PAGE_LINES)
}

/// Everything drawn on screen
pub struct ChatUi {
    pub composer: Composer,
    pub username: UsernameEditor,
    pub viewport: Viewport,
    screen: ChatScreen,
    lines: Vec<String>,
    poll_error: bool,
    notice: Option<String>,
    threshold: i64,
}

impl ChatUi {
    pub fn new(name: DisplayName, log_height: usize, threshold: i64) -> Self {
        Self {
            composer: Composer::new(&name),
            username: UsernameEditor::new(name),
            viewport: Viewport::new(log_height),
            screen: ChatScreen::Loading,
            lines: Vec::new(),
            poll_error: false,
            notice: None,
            threshold,
        }
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    fn rebuild(&mut self, snapshot: &SyncSnapshot) {
        self.screen = ChatScreen::from_snapshot(snapshot, self.username.current().as_str());
        self.lines = self.screen.lines();
        self.poll_error = snapshot.poll_error;
    }

    /// Redraw from a snapshot without scrolling decisions
    pub fn refresh(&mut self, snapshot: &SyncSnapshot) {
        self.rebuild(snapshot);
        self.viewport.relayout(self.lines.len());
    }

    /// Apply the queued sync events against one snapshot taken after them
    ///
    /// Arrival counts come from the events, not from the snapshot, and the
    /// scroll decision uses the position before layout.
    pub fn apply(&mut self, events: &[SyncEvent], snapshot: &SyncSnapshot) {
        let before = self.viewport.metrics();
        self.rebuild(snapshot);
        let arrived = events
            .iter()
            .map(|event| match event {
                SyncEvent::NewMessages { count } => *count,
                _ => 0,
            })
            .sum();
        let directive = events
            .iter()
            .map(|event| directive_for(event, &before, self.threshold))
            .max()
            .unwrap_or(ScrollDirective::Stay);
        self.viewport.update(self.lines.len(), directive, arrived);
    }

    pub fn render(&self) -> String {
        let mut out = Vec::with_capacity(self.viewport.height() + CHROME_LINES);

        let mut header = format!(
            "Parley · {}",
            truncate(self.username.current().as_str(), HEADER_NAME_WIDTH)
        );
        if self.poll_error {
            header.push_str(" · connection problem, retrying");
        }
        out.push(header);
        out.push("-".repeat(60));

        let visible = self.viewport.visible();
        let shown = visible.len();
        out.extend(self.lines[visible].iter().cloned());
        for _ in shown..self.viewport.height() {
            out.push(String::new());
        }

        out.push("-".repeat(60));
        match self.viewport.unseen() {
            0 => out.push(String::new()),
            1 => out.push("1 new message below (/bottom)".to_string()),
            n => out.push(format!("{} new messages below (/bottom)", n)),
        }

        if self.composer.is_sending() {
            out.push("Sending...".to_string());
        } else if let Some(error) = self.composer.error() {
            if self.composer.body().trim().is_empty() {
                out.push(format!("! {}", error));
            } else {
                out.push(format!("! {} (press Enter to resend)", error));
            }
        } else {
            out.push(self.notice.clone().unwrap_or_default());
        }

        let count = self.composer.char_count();
        let marker = match count.level() {
            CountLevel::Normal => "",
            CountLevel::Warning => " (almost full)",
            CountLevel::Over => " (too long)",
        };
        out.push(format!("[{}{}] /help for commands", count.label(), marker));

        out.join("\n")
    }
}

/// Log area height from the `LINES` environment variable
fn log_height() -> usize {
    std::env::var("LINES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_TERMINAL_LINES)
        .saturating_sub(CHROME_LINES)
        .max(1)
}

async fn draw(stdout: &mut tokio::io::Stdout, ui: &ChatUi) -> io::Result<()> {
    let frame = format!("{}{}\n> ", CLEAR_SCREEN, ui.render());
    stdout.write_all(frame.as_bytes()).await?;
    stdout.flush().await
}

fn spawn_send(
    handle: &SyncHandle,
    payload: NewMessage,
) -> JoinHandle<Result<Message, SendError>> {
    let handle = handle.clone();
    tokio::spawn(async move { handle.send(&payload.body, &payload.author).await })
}

async fn wait_send(
    in_flight: &mut Option<JoinHandle<Result<Message, SendError>>>,
) -> Result<Message, SendError> {
    match in_flight {
        Some(task) => task.await.unwrap_or_else(|e| {
            warn!(error = %e, "Send task failed");
            Err(SendError::EngineStopped)
        }),
        None => pending().await,
    }
}

/// Run the chat session until `/quit`, end of input or Ctrl-C
pub async fn run(state: AppState, transport: Arc<dyn MessageTransport>) -> io::Result<()> {
    let mut manager = SyncManager::new(transport, SyncOptions::from(&state.config));
    let handle = manager.handle();
    let mut ui = ChatUi::new(
        state.display_name(),
        log_height(),
        i64::from(state.config.scroll_threshold),
    );

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut in_flight: Option<JoinHandle<Result<Message, SendError>>> = None;

    info!(api_url = %state.config.api_url, "Starting chat session");
    if handle.initialize().await.is_err() {
        warn!("Sync task stopped before initialization");
        return Ok(());
    }
    ui.refresh(&handle.snapshot().await);
    draw(&mut stdout, &ui).await?;

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    debug!("End of input");
                    break;
                };
                ui.clear_notice();

                match parse_input(&line) {
                    Input::Empty => {
                        if in_flight.is_none() && ui.composer.can_submit() {
                            if let Some(payload) = ui.composer.begin_submit() {
                                in_flight = Some(spawn_send(&handle, payload));
                            }
                        }
                    }
                    Input::Send(body) => {
                        if in_flight.is_some() {
                            ui.set_notice("Still sending the previous message");
                        } else {
                            ui.composer.set_body(body);
                            if let Some(payload) = ui.composer.begin_submit() {
                                in_flight = Some(spawn_send(&handle, payload));
                            }
                        }
                    }
                    Input::Name(None) => {
                        let notice = format!("Your name is {}", ui.username.current());
                        ui.set_notice(notice);
                    }
                    Input::Name(Some(name)) => {
                        ui.username.begin_edit();
                        ui.username.set_value(name);
                        match ui.username.save(&state.db) {
                            Ok(true) => {
                                let current = ui.username.current().as_str().to_string();
                                ui.composer.set_author(current);
                                ui.refresh(&handle.snapshot().await);
                            }
                            Ok(false) => {
                                ui.username.cancel();
                                ui.set_notice(format!(
                                    "Display name must be 1 to {} characters",
                                    MAX_AUTHOR_LENGTH
                                ));
                            }
                            Err(e) => {
                                warn!(error = %e, "Failed to save display name");
                                ui.username.cancel();
                                ui.set_notice("Could not save display name");
                            }
                        }
                    }
                    Input::Retry => {
                        if handle.retry().await.is_err() {
                            break;
                        }
                    }
                    Input::Up(n) => ui.viewport.scroll_up(n),
                    Input::Down(n) => ui.viewport.scroll_down(n),
                    Input::Bottom => ui.viewport.scroll_to_bottom(),
                    Input::Help => ui.set_notice(HELP_TEXT),
                    Input::Quit => break,
                    Input::Unknown(command) => {
                        ui.set_notice(format!("Unknown command /{} (try /help)", command));
                    }
                }
            }

            event = manager.next_event() => {
                let Some(event) = event else {
                    warn!("Sync task stopped");
                    break;
                };
                let mut events = vec![event];
                events.extend(manager.drain_events());
                let snapshot = handle.snapshot().await;
                ui.apply(&events, &snapshot);
            }

            result = wait_send(&mut in_flight) => {
                in_flight = None;
                if let Some(name) = ui.composer.finish_submit(result, &state.db) {
                    ui.username.sync_current(name);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }

        draw(&mut stdout, &ui).await?;
    }

    handle.shutdown().await;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SyncStatus;
    use chrono::{TimeZone, Utc};

    fn msg(id: u32) -> Message {
        Message::new(
            id.to_string().as_str(),
            &format!("message {}", id),
            "John",
            Utc.with_ymd_and_hms(2024, 1, 15, 10, id, 0).unwrap(),
        )
    }

    fn ready(count: u32) -> SyncSnapshot {
        let messages: Vec<Message> = (0..count).map(msg).collect();
        SyncSnapshot {
            status: SyncStatus::Ready,
            poll_error: false,
            watermark: messages.last().map(|m| m.created_at),
            messages,
        }
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("hello there"), Input::Send("hello there".into()));
        assert_eq!(parse_input("//shrug"), Input::Send("/shrug".into()));
        assert_eq!(parse_input("/name"), Input::Name(None));
        assert_eq!(parse_input("/name  Ada Lovelace "), Input::Name(Some("Ada Lovelace".into())));
        assert_eq!(parse_input("/retry"), Input::Retry);
        assert_eq!(parse_input("/up"), Input::Up(PAGE_LINES));
        assert_eq!(parse_input("/up 3"), Input::Up(3));
        assert_eq!(parse_input("/down x"), Input::Down(PAGE_LINES));
        assert_eq!(parse_input("/bottom"), Input::Bottom);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/dance"), Input::Unknown("dance".into()));
    }

    #[test]
    fn test_initial_load_shows_latest() {
        let mut ui = ChatUi::new(DisplayName::default(), 4, 3);
        ui.apply(&[SyncEvent::Loaded { count: 5 }], &ready(5));

        // Two lines per message, the last two messages fill the log area
        assert!(ui.viewport.at_bottom());
        let frame = ui.render();
        assert!(frame.contains("message 4"));
        assert!(frame.contains("message 3"));
        assert!(!frame.contains("message 2"));
    }

    #[test]
    fn test_arrival_while_scrolled_up() {
        let mut ui = ChatUi::new(DisplayName::default(), 4, 3);
        ui.apply(&[SyncEvent::Loaded { count: 5 }], &ready(5));
        ui.viewport.scroll_up(6);
        let top = ui.viewport.top();

        ui.apply(&[SyncEvent::NewMessages { count: 1 }], &ready(6));

        assert_eq!(ui.viewport.top(), top);
        assert!(ui.render().contains("1 new message below"));

        ui.viewport.scroll_to_bottom();
        assert!(ui.render().contains("message 5"));
    }

    #[test]
    fn test_backed_up_arrivals_counted() {
        let mut ui = ChatUi::new(DisplayName::default(), 4, 3);
        ui.apply(&[SyncEvent::Loaded { count: 5 }], &ready(5));
        ui.viewport.scroll_up(6);
        let top = ui.viewport.top();

        // Two polls landed before the loop got to them; the snapshot already
        // holds both arrivals
        let events = [
            SyncEvent::NewMessages { count: 1 },
            SyncEvent::NewMessages { count: 2 },
        ];
        ui.apply(&events, &ready(8));

        assert_eq!(ui.viewport.top(), top);
        assert!(ui.render().contains("3 new messages below"));
    }

    #[test]
    fn test_batch_takes_strongest_directive() {
        let mut ui = ChatUi::new(DisplayName::default(), 4, 3);
        ui.viewport.scroll_up(6);

        let events = [
            SyncEvent::PollHealth { failing: false },
            SyncEvent::Loaded { count: 5 },
        ];
        ui.apply(&events, &ready(5));

        assert!(ui.viewport.at_bottom());
        assert!(ui.render().contains("message 4"));
    }

    #[test]
    fn test_poll_error_indicator() {
        let mut ui = ChatUi::new(DisplayName::default(), 4, 3);
        let mut snapshot = ready(1);
        snapshot.poll_error = true;
        ui.apply(&[SyncEvent::PollHealth { failing: true }], &snapshot);
        assert!(ui.render().contains("connection problem"));

        snapshot.poll_error = false;
        ui.apply(&[SyncEvent::PollHealth { failing: false }], &snapshot);
        assert!(!ui.render().contains("connection problem"));
    }

    #[test]
    fn test_error_screen_and_composer_error() {
        let mut ui = ChatUi::new(DisplayName::default(), 4, 3);
        let snapshot = SyncSnapshot {
            status: SyncStatus::LoadError("Unauthorized".into()),
            poll_error: false,
            messages: Vec::new(),
            watermark: None,
        };
        ui.refresh(&snapshot);
        ui.composer.set_body("");
        assert!(ui.composer.begin_submit().is_none());

        let frame = ui.render();
        assert!(frame.contains("Unauthorized"));
        assert!(frame.contains("/retry"));
        assert!(frame.contains("! Please enter both message and author name"));
        assert!(frame.contains("[0/1000]"));
    }
}

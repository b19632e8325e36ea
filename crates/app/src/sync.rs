//! Background synchronization with the message API
//!
//! A single task owns the [`SyncEngine`] and is the only writer. Transport
//! calls run as spawned futures and report back through a channel, so a slow
//! send never holds up the poll timer and vice versa.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use parley_core::{validate_outgoing, ClientConfig, Message, NewMessage, ValidationError};
use parley_net::MessageTransport;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{SyncEngine, SyncEvent, SyncSnapshot, SyncStatus};

/// Shown when a send failure carries no readable message
pub const SEND_FAILED_MESSAGE: &str = "Failed to send message";

/// Errors returned to the composer
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Rejected locally, the transport was never called
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", .0.message_or(SEND_FAILED_MESSAGE))]
    Transport(#[from] parley_net::Error),

    #[error("Chat session has stopped")]
    EngineStopped,
}

/// Timing and page sizes for the sync task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub initial_limit: u32,
    pub poll_limit: u32,
    pub poll_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for SyncOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            initial_limit: config.initial_limit,
            poll_limit: config.poll_limit,
            poll_interval: config.poll_interval(),
        }
    }
}

enum SyncCommand {
    Initialize,
    Retry,
    Send {
        payload: NewMessage,
        reply: oneshot::Sender<Result<Message, SendError>>,
    },
    Shutdown,
}

/// Transport results delivered back to the sync task
enum Completion {
    Load(parley_net::Result<Vec<Message>>),
    Poll(parley_net::Result<Vec<Message>>),
    Send {
        result: parley_net::Result<Message>,
        reply: oneshot::Sender<Result<Message, SendError>>,
    },
}

/// Cloneable handle for issuing intents
#[derive(Clone)]
pub struct SyncHandle {
    engine: Arc<RwLock<SyncEngine>>,
    cmd_tx: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    /// Start the first full load (no-op after the first call)
    pub async fn initialize(&self) -> Result<(), SendError> {
        self.command(SyncCommand::Initialize).await
    }

    /// Reload after a load error (no-op in any other state)
    pub async fn retry(&self) -> Result<(), SendError> {
        self.command(SyncCommand::Retry).await
    }

    /// Validate and send a message, resolving once the server has echoed it
    pub async fn send(&self, body: &str, author: &str) -> Result<Message, SendError> {
        let payload = validate_outgoing(body, author)?;
        let (reply, rx) = oneshot::channel();
        self.command(SyncCommand::Send { payload, reply }).await?;
        rx.await.map_err(|_| SendError::EngineStopped)?
    }

    /// Stop polling and drop any results still in flight
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SyncCommand::Shutdown).await;
    }

    /// Copy of the current state for rendering
    pub async fn snapshot(&self) -> SyncSnapshot {
        self.engine.read().await.snapshot()
    }

    async fn command(&self, cmd: SyncCommand) -> Result<(), SendError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SendError::EngineStopped)
    }
}

/// Sync manager: owns the event stream, hands out [`SyncHandle`]s
pub struct SyncManager {
    handle: SyncHandle,
    event_rx: mpsc::Receiver<SyncEvent>,
}

impl SyncManager {
    /// Spawn the sync task in `Idle`; call [`SyncHandle::initialize`] to load
    pub fn new(transport: Arc<dyn MessageTransport>, options: SyncOptions) -> Self {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let engine = Arc::new(RwLock::new(SyncEngine::new(
            options.initial_limit,
            options.poll_limit,
        )));

        tokio::spawn(sync_task(
            engine.clone(),
            transport,
            options.poll_interval,
            event_tx,
            cmd_rx,
        ));

        Self {
            handle: SyncHandle { engine, cmd_tx },
            event_rx,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Wait for the next event; `None` once the task has stopped
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.event_rx.recv().await
    }

    /// Events already queued, without waiting
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Main sync task
async fn sync_task(
    engine: Arc<RwLock<SyncEngine>>,
    transport: Arc<dyn MessageTransport>,
    poll_interval: Duration,
    event_tx: mpsc::Sender<SyncEvent>,
    mut cmd_rx: mpsc::Receiver<SyncCommand>,
) {
    let (done_tx, mut done_rx) = mpsc::channel::<Completion>(16);
    // Created on first reaching Ready
    let mut poll_timer: Option<Interval> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SyncCommand::Initialize) => {
                        let query = engine.write().await.begin_initialize();
                        if let Some(query) = query {
                            emit(&event_tx, vec![SyncEvent::StatusChanged(SyncStatus::Loading)]).await;
                            spawn_request(&transport, &done_tx, move |t| async move {
                                Completion::Load(t.list_messages(&query).await)
                            });
                        }
                    }
                    Some(SyncCommand::Retry) => {
                        let query = engine.write().await.begin_retry();
                        if let Some(query) = query {
                            info!("Retrying message load");
                            emit(&event_tx, vec![SyncEvent::StatusChanged(SyncStatus::Loading)]).await;
                            spawn_request(&transport, &done_tx, move |t| async move {
                                Completion::Load(t.list_messages(&query).await)
                            });
                        }
                    }
                    Some(SyncCommand::Send { payload, reply }) => {
                        spawn_request(&transport, &done_tx, move |t| async move {
                            let result = t.create_message(&payload).await;
                            Completion::Send { result, reply }
                        });
                    }
                    Some(SyncCommand::Shutdown) | None => {
                        debug!("Sync shutdown requested");
                        break;
                    }
                }
            }

            Some(done) = done_rx.recv() => {
                let events = match done {
                    Completion::Load(result) => engine.write().await.finish_load(result),
                    Completion::Poll(result) => engine.write().await.finish_poll(result),
                    Completion::Send { result, reply } => match result {
                        Ok(message) => {
                            let events = engine.write().await.apply_sent(message.clone());
                            let _ = reply.send(Ok(message));
                            events
                        }
                        Err(e) => {
                            warn!(error = %e, status = ?e.status_code(), "Failed to send message");
                            let _ = reply.send(Err(SendError::Transport(e)));
                            Vec::new()
                        }
                    },
                };

                if poll_timer.is_none() && *engine.read().await.status() == SyncStatus::Ready {
                    debug!(interval_ms = poll_interval.as_millis() as u64, "Starting poll timer");
                    let mut timer = interval_at(Instant::now() + poll_interval, poll_interval);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    poll_timer = Some(timer);
                }

                emit(&event_tx, events).await;
            }

            _ = next_tick(&mut poll_timer) => {
                let query = engine.write().await.begin_poll();
                if let Some(query) = query {
                    spawn_request(&transport, &done_tx, move |t| async move {
                        Completion::Poll(t.list_messages(&query).await)
                    });
                }
            }
        }
    }

    info!("Sync task stopped");
}

/// Run a transport call off the sync task; results after shutdown are dropped
fn spawn_request<F, Fut>(
    transport: &Arc<dyn MessageTransport>,
    done_tx: &mpsc::Sender<Completion>,
    request: F,
) where
    F: FnOnce(Arc<dyn MessageTransport>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Completion> + Send + 'static,
{
    let transport = transport.clone();
    let done_tx = done_tx.clone();
    tokio::spawn(async move {
        let completion = request(transport).await;
        if done_tx.send(completion).await.is_err() {
            debug!("Sync task gone, dropping result");
        }
    });
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending().await,
    }
}

async fn emit(event_tx: &mpsc::Sender<SyncEvent>, events: Vec<SyncEvent>) {
    for event in events {
        if event_tx.send(event).await.is_err() {
            debug!("No event listener");
            return;
        }
    }
}

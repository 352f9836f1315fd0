//! Chat session executor

use super::traits::ChatTransport;
use super::{Command, SendError, SessionConfig, SessionHandle};

use crate::api::TransportError;
use crate::sse::{DeltaFrame, StreamDecoder};
use crate::state_machine::{transition, ChatState, Effect, EndReason, Event, TransitionError};
use crate::store::{ConversationStore, Message};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const COMMAND_BUFFER: usize = 32;

/// What the active turn's stream produces
#[derive(Debug)]
enum TurnEvent {
    /// Response started successfully
    Opened,
    Frame(DeltaFrame),
    /// Request or body read failed
    Failed(TransportError),
    /// Body ended without the sentinel
    Exhausted,
}

struct ActiveTurn {
    epoch: u64,
    events: BoxStream<'static, TurnEvent>,
    started: Instant,
}

/// Session runtime, generic over the transport
pub struct ChatSession<T: ChatTransport + 'static> {
    state: ChatState,
    store: ConversationStore,
    transport: Arc<T>,
    config: SessionConfig,
    commands: mpsc::Receiver<Command>,
    active: Option<ActiveTurn>,
}

impl<T: ChatTransport + 'static> ChatSession<T> {
    pub fn new(
        store: ConversationStore,
        transport: T,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = SessionHandle::new(tx, store.subscribe());
        let session = Self {
            state: ChatState::new(),
            store,
            transport: Arc::new(transport),
            config,
            commands: rx,
            active: None,
        };
        (session, handle)
    }

    /// Spawn the session loop on the current runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        tracing::info!("Starting chat session");

        if self.config.hydrate_on_start {
            self.hydrate().await;
        }

        // Commands take priority so a cancel lands before further deltas
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                (epoch, event) = next_turn_event(&mut self.active) => {
                    self.handle_turn_event(epoch, event);
                }
            }
        }

        tracing::info!("Chat session stopped");
    }

    async fn hydrate(&mut self) {
        let limit = self.config.history_limit;
        self.store.set_loading(true);
        match self.transport.fetch_history(limit).await {
            Ok(history) => {
                tracing::info!(count = history.len(), limit, "Loaded chat history");
                self.store.hydrate(history);
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind, "Failed to load chat history");
            }
        }
        if let Some(greeting) = &self.config.greeting {
            if self.store.snapshot().messages.is_empty() {
                let id = self.store.next_message_id();
                self.store.append(Message::assistant(id, greeting.clone()));
            }
        }
        self.store.set_loading(false);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send { text, reply } => {
                let result = self
                    .process_event(Event::UserMessage { text })
                    .map_err(|e| SendError::from_transition(&e));
                let _ = reply.send(result);
            }
            Command::Cancel { reply } => {
                if let Err(e) = self.process_event(Event::UserCancel) {
                    tracing::warn!(error = %e, "Cancel rejected");
                }
                let _ = reply.send(());
            }
            Command::Reset { reply } => {
                if let Err(e) = self.process_event(Event::Reset) {
                    tracing::warn!(error = %e, "Reset rejected");
                }
                let _ = reply.send(());
            }
        }
    }

    fn handle_turn_event(&mut self, epoch: u64, event: TurnEvent) {
        let event = match event {
            TurnEvent::Opened => Event::StreamOpened { epoch },
            TurnEvent::Frame(DeltaFrame::Content(content)) => Event::Delta { epoch, content },
            TurnEvent::Frame(DeltaFrame::Done) => Event::StreamEnded {
                epoch,
                reason: EndReason::Sentinel,
            },
            TurnEvent::Exhausted => Event::StreamEnded {
                epoch,
                reason: EndReason::Exhausted,
            },
            TurnEvent::Failed(error) => {
                tracing::warn!(epoch, error = %error, kind = ?error.kind, "Chat turn failed");
                Event::TransportFailed { epoch, error }
            }
        };

        match self.process_event(event) {
            Ok(()) => return,
            Err(TransitionError::StaleEpoch { event, current }) => {
                tracing::debug!(event, current, "Discarding event from abandoned turn");
            }
            Err(e) => tracing::warn!(epoch, error = %e, "Stream event rejected"),
        }
        // A stream whose events no longer apply must not be polled again
        if self.active.take_if(|turn| turn.epoch == epoch).is_some() {
            tracing::debug!(epoch, "Dropped stream after rejected event");
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.state, event)?;
        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { role, content } => {
                let id = self.store.next_message_id();
                self.store.append(Message::new(id, role, content));
            }
            Effect::AmendLast { content } => {
                if !self.store.amend_last(content) {
                    tracing::warn!("No message to amend");
                }
            }
            Effect::SetLoading(loading) => self.store.set_loading(loading),
            Effect::SetStreaming(streaming) => self.store.set_streaming(streaming),
            Effect::SetLastError(error) => self.store.set_last_error(error),
            Effect::OpenStream { epoch, text } => {
                tracing::info!(epoch, chars = text.chars().count(), "Starting chat turn");
                self.active = Some(ActiveTurn {
                    epoch,
                    events: turn_events(Arc::clone(&self.transport), text),
                    started: Instant::now(),
                });
            }
            Effect::DropStream { epoch } => {
                if let Some(turn) = self.active.take_if(|turn| turn.epoch == epoch) {
                    tracing::info!(
                        epoch,
                        duration_ms = u64::try_from(turn.started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Chat turn finished"
                    );
                }
            }
            Effect::ClearLog => self.store.reset(),
        }
    }
}

/// Request the reply for `text` and decode it, as one stream of turn events
fn turn_events<T: ChatTransport + 'static>(
    transport: Arc<T>,
    text: String,
) -> BoxStream<'static, TurnEvent> {
    stream::once(async move { transport.open_stream(&text).await })
        .flat_map(|opened| match opened {
            Ok(body) => stream::once(future::ready(TurnEvent::Opened))
                .chain(StreamDecoder::new(body).map(|item| match item {
                    Ok(frame) => TurnEvent::Frame(frame),
                    Err(e) => TurnEvent::Failed(e),
                }))
                .boxed(),
            Err(e) => stream::once(future::ready(TurnEvent::Failed(e))).boxed(),
        })
        .boxed()
}

/// Next event of the active turn; never resolves when there is none
async fn next_turn_event(active: &mut Option<ActiveTurn>) -> (u64, TurnEvent) {
    match active {
        Some(turn) => match turn.events.next().await {
            Some(event) => (turn.epoch, event),
            None => (turn.epoch, TurnEvent::Exhausted),
        },
        None => std::future::pending().await,
    }
}

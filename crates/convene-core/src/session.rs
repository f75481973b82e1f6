//! ChatSession — live chat state for one chat stage: message history, the
//! response timeout tracker, mediator turns, and the event broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::chat::ChatMessage;
use crate::config::Config;
use crate::events::SessionEvent;
use crate::mediator::AgentMediator;
use crate::stages::chat::ChatStageConfig;
use crate::timeout::{Clock, ResponseTimeoutTracker};
use crate::types::UserType;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Live state for one chat stage.
pub struct ChatSession {
    stage: ChatStageConfig,
    messages: Vec<ChatMessage>,
    mediators: Vec<AgentMediator>,
    tracker: ResponseTimeoutTracker,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(stage: ChatStageConfig, response_timeout: Duration) -> Self {
        Self::with_clock(stage, response_timeout, Arc::new(crate::timeout::SystemClock))
    }

    pub fn with_clock(
        stage: ChatStageConfig,
        response_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let timeout_tx = event_tx.clone();
        let tracker = ResponseTimeoutTracker::with_clock(
            response_timeout,
            Arc::new(move || {
                // Receivers may all have dropped; a missed event is fine.
                let _ = timeout_tx.send(SessionEvent::ResponseTimedOut);
            }),
            clock,
        );
        let mediators = stage.mediators.iter().cloned().map(AgentMediator::new).collect();
        Self {
            stage,
            messages: Vec::new(),
            mediators,
            tracker,
            event_tx,
        }
    }

    pub fn stage(&self) -> &ChatStageConfig {
        &self.stage
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether the awaited reply has overrun the timeout window.
    pub fn timed_out(&self) -> bool {
        self.tracker.timed_out()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Append a message, broadcast it, and refresh the wait state.
    ///
    /// A participant message starts (or restarts) the wait for a reply; any
    /// other sender counts as the reply and clears it.
    pub fn append(&mut self, message: ChatMessage) {
        debug!(
            sender = %message.user_type,
            id = %message.id,
            "message appended"
        );
        let awaiting_reply = message.user_type == UserType::Participant;
        let sent_at = message.timestamp_seconds();
        let id = message.id.clone();
        let _ = self.event_tx.send(SessionEvent::Message(message.clone()));
        self.messages.push(message);
        self.tracker.update(Some(&id), awaiting_reply, Some(sent_at));
    }

    /// Rebuild the wait state from persisted history, e.g. after a reload.
    /// Remaining wait is measured from the last message's timestamp, so a
    /// long-overdue reply times out immediately.
    pub fn restore(&mut self, history: Vec<ChatMessage>) {
        self.messages = history;
        match self.messages.last() {
            Some(last) => {
                let awaiting = last.user_type == UserType::Participant;
                let sent_at = last.timestamp_seconds();
                let id = last.id.clone();
                self.tracker.update(Some(&id), awaiting, Some(sent_at));
            }
            None => self.tracker.clear(),
        }
    }

    /// Drop all history and reset the wait state.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.tracker.clear();
        let _ = self.event_tx.send(SessionEvent::Cleared);
    }

    /// Give every mediator persona one turn over the current history.
    /// Returns the messages that were posted.
    pub async fn run_mediator_turns(&mut self, config: &Config) -> Result<Vec<ChatMessage>> {
        let mut posted = Vec::new();
        let history = self.messages.clone();
        for mediator in &self.mediators {
            let response = mediator.respond(config, &history).await?;
            match response.to_chat_message() {
                Some(message) => {
                    info!(agent_id = %response.agent_id, "mediator responded");
                    let _ = self.event_tx.send(SessionEvent::MediatorResponded {
                        agent_id: response.agent_id,
                    });
                    posted.push(message);
                }
                None => {
                    let _ = self.event_tx.send(SessionEvent::MediatorSilent {
                        agent_id: response.agent_id,
                        status: response.status,
                    });
                }
            }
        }
        for message in &posted {
            self.append(message.clone());
        }
        Ok(posted)
    }
}

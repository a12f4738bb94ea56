use tracing::debug;

use crate::errors::ClientError;
use crate::models::{ChatMessage, Role, WireMessage};
use crate::persist::FlagStore;
use crate::transport::Outbound;

/// Explicit per-session configuration, injected at construction time rather
/// than read from ambient navigation state.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub role: Role,
    pub endpoint: String,
}

/// Mutable chat state owned by one chat-view instance.
///
/// Holds the ordered message log, the local role and the terminal `ended`
/// flag, and applies every inbound/outbound message as one state transition.
/// The view layer renders from the accessors and never mutates the log
/// directly. The log is append-only: messages land in causal arrival order
/// and are never reordered, deduplicated or removed.
pub struct ChatSession {
    config: SessionConfig,
    messages: Vec<ChatMessage>,
    ended: bool,
    menu_open: bool,
    outbound: Box<dyn Outbound>,
    flags: Box<dyn FlagStore>,
}

impl ChatSession {
    /// Build a session, reading the persisted end-of-chat flag once (the
    /// chat-view mount step).
    pub fn new(
        config: SessionConfig,
        outbound: Box<dyn Outbound>,
        flags: Box<dyn FlagStore>,
    ) -> Result<Self, ClientError> {
        let ended = flags.load()?;
        Ok(Self {
            config,
            messages: Vec::new(),
            ended,
            menu_open: false,
            outbound,
            flags,
        })
    }

    /// Seed the log with deterministic greeting messages before any network
    /// activity, so the view is non-empty immediately. Ignored once the log
    /// has content; the log is append-only.
    pub fn seed(&mut self, initial: Vec<ChatMessage>) {
        if !self.messages.is_empty() {
            debug!("seed ignored: log already has {} messages", self.messages.len());
            return;
        }
        self.messages.extend(initial);
    }

    /// Append a locally authored message and request transmission of the
    /// same payload.
    ///
    /// Empty or all-whitespace input is silently ignored (returns `false`).
    /// The local append is observed before transmission and stands whether or
    /// not the frame could actually be sent; a closed transport only means
    /// the message stays local.
    pub fn append_local(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let message = ChatMessage::new(self.config.role, text);
        self.messages.push(message.clone());
        if !self.outbound.transmit(&WireMessage::Message(message)) {
            debug!("transport not open, message kept locally only");
        }
        true
    }

    /// Apply one decoded inbound frame from the chat connection.
    ///
    /// Chat messages append in delivery order; any other kind on this
    /// connection is ignored.
    pub fn append_remote(&mut self, frame: WireMessage) {
        match frame {
            WireMessage::Message(message) => self.messages.push(message),
            other => {
                debug!("ignoring unexpected {} frame on chat connection", other.kind());
            }
        }
    }

    /// End the chat: terminal and idempotent. Sets the flag before
    /// persisting it, so the session is ended even when the write fails, and
    /// closes the menu as a side effect.
    pub fn end_session(&mut self) -> Result<(), ClientError> {
        self.ended = true;
        self.menu_open = false;
        self.flags.store(true)
    }

    /// Toggle the UI-local menu sub-state. Does not affect message handling.
    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }
}

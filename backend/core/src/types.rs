use serde::{Deserialize, Serialize};

/// Per-invocation permission attributes of the invoking chatter, as supplied
/// by the chat platform. Read-only to handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub broadcaster: bool,
    pub moderator: bool,
    pub subscriber: bool,
    pub vip: bool,
    pub founder: bool,
}

impl Flags {
    /// Whether the chatter may invoke destructive playback commands via chat.
    pub fn is_privileged(&self) -> bool {
        self.broadcaster || self.moderator
    }
}

/// How a handler reply is delivered back to chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Broadcast to the channel.
    Say,
    /// Private message to the invoking user.
    Whisper,
}

/// A reply produced by a command or reward handler, consumed exactly once by
/// the dispatcher. Handlers that already performed their user-visible effect
/// (audio playback, transport control) return no response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub kind: ResponseKind,
    pub message: String,
}

impl CommandResponse {
    pub fn say(message: impl Into<String>) -> Self {
        Self { kind: ResponseKind::Say, message: message.into() }
    }

    pub fn whisper(message: impl Into<String>) -> Self {
        Self { kind: ResponseKind::Whisper, message: message.into() }
    }
}

/// Snapshot of a remote catalog entry. Fetched fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub uri: String,
    pub album: String,
    pub artists: Vec<String>,
}

impl Track {
    /// Formats `name by artist, artist`, the common chat-reply form.
    pub fn by_line(&self) -> String {
        format!("{} by {}", self.name, self.artists.join(", "))
    }
}

use thiserror::Error;

/// Top-level error type for the jukebot runtime.
///
/// Expected-absence conditions (unknown command or reward, no search match,
/// empty queue) are not errors; they surface as `Option` or as a fixed chat
/// reply at the point they arise.
#[derive(Debug, Error)]
pub enum BotError {
    /// The music service reports no active playback device to target.
    #[error("no active playback device")]
    NoActiveDevice,

    /// The identity provider rejected the refresh token. The stored
    /// credential has been cleared; re-authorization is required.
    #[error("credential refresh rejected: {0}")]
    CredentialRejected(String),

    /// The speech-synthesis endpoint returned a non-success status.
    #[error("speech synthesis failed ({status}): {body}")]
    Synthesis { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

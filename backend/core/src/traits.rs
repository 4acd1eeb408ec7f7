use anyhow::Result;
use async_trait::async_trait;

use crate::types::Track;

/// Boundary to the music-playback collaborator.
///
/// One implementation talks to the Spotify Web API; tests substitute their
/// own. All track data is fetched fresh per call.
#[async_trait]
pub trait MusicControl: Send + Sync {
    /// Issue a single catalog search constrained to tracks, requesting one
    /// result. Returns the top ranked match, or `None` on zero results.
    /// This is the sole tie-break rule.
    async fn find_song(&self, query: &str) -> Result<Option<Track>>;

    /// `find_song` followed by an enqueue on whichever device is currently
    /// active. Fails with [`crate::BotError::NoActiveDevice`] when no device
    /// is active; the caller converts that into a user-facing message.
    async fn add_to_queue(&self, query: &str) -> Result<Option<Track>>;

    /// The track currently rendering, if any.
    async fn current_song(&self) -> Result<Option<Track>>;

    /// Head of the remote playback queue, if any.
    async fn next_song(&self) -> Result<Option<Track>>;

    /// Names of all queued tracks, in queue order.
    async fn queued_songs(&self) -> Result<Vec<String>>;

    /// Advance to the next track on the active device.
    async fn skip(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;
}

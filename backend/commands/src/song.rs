//! Song command and reward handlers.
//!
//! One handler answers the whole command family and re-dispatches on the
//! command name; the reward handler does the same keyed by reward id.
//! Chat-command forms of destructive actions are gated on broadcaster or
//! moderator. Reward forms are not gated: the redemption already cost
//! points.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use jukebot_core::{BotError, CommandResponse, MusicControl};
use jukebot_events::{CommandEvent, CommandHandler, RewardEvent, RewardHandler};

/// Command names this family answers, in advertisement order.
pub const SONG_COMMANDS: &[&str] = &["skip", "song", "next", "lookup", "add", "songcommands"];

const NOT_FOR_YOU: &str = "RIPBOZO command is not for you.";
const NOTHING_PLAYING: &str = "No song is currently playing";
const EMPTY_QUEUE: &str = "There are no songs in the queue.";
const NO_DEVICE: &str = "Spotify has no active playback device.";

pub struct SongCommands {
    music: Arc<dyn MusicControl>,
}

impl SongCommands {
    pub fn new(music: Arc<dyn MusicControl>) -> Self {
        Self { music }
    }

    async fn on_skip(&self, event: &CommandEvent) -> Result<Option<CommandResponse>> {
        if !event.flags.is_privileged() {
            return Ok(Some(CommandResponse::say(NOT_FOR_YOU)));
        }
        self.music.skip().await?;
        Ok(None)
    }

    async fn on_add(&self, event: &CommandEvent) -> Result<Option<CommandResponse>> {
        if !event.flags.is_privileged() {
            return Ok(Some(CommandResponse::say(NOT_FOR_YOU)));
        }
        match self.music.add_to_queue(&event.message).await? {
            Some(track) => Ok(Some(CommandResponse::say(format!(
                "Added {} to the queue.",
                track.name
            )))),
            None => Ok(Some(CommandResponse::say(format!(
                "No song found for: {}",
                event.message
            )))),
        }
    }

    async fn on_current_song(&self) -> Result<Option<CommandResponse>> {
        match self.music.current_song().await? {
            Some(track) => Ok(Some(CommandResponse::say(format!(
                "Now playing: {}",
                track.by_line()
            )))),
            None => Ok(Some(CommandResponse::say(NOTHING_PLAYING))),
        }
    }

    async fn on_next_song(&self) -> Result<Option<CommandResponse>> {
        match self.music.next_song().await? {
            Some(track) => Ok(Some(CommandResponse::say(format!(
                "Playing Next: {}",
                track.by_line()
            )))),
            None => Ok(Some(CommandResponse::say(EMPTY_QUEUE))),
        }
    }

    async fn on_lookup(&self, event: &CommandEvent) -> Result<Option<CommandResponse>> {
        match self.music.find_song(&event.message).await? {
            Some(track) => Ok(Some(CommandResponse::say(format!(
                "Found: {} on the album {}",
                track.by_line(),
                track.album
            )))),
            None => Ok(Some(CommandResponse::say(format!(
                "No song found for: {}",
                event.message
            )))),
        }
    }

    fn on_song_commands(&self) -> Option<CommandResponse> {
        let listing = SONG_COMMANDS
            .iter()
            .map(|name| format!("!{name}"))
            .collect::<Vec<_>>()
            .join(", ");
        Some(CommandResponse::say(listing))
    }
}

#[async_trait]
impl CommandHandler for SongCommands {
    async fn handle(&self, event: &CommandEvent) -> Result<Option<CommandResponse>> {
        let result = match event.command.as_str() {
            "skip" => self.on_skip(event).await,
            "song" => self.on_current_song().await,
            "next" => self.on_next_song().await,
            "lookup" => self.on_lookup(event).await,
            "add" => self.on_add(event).await,
            "songcommands" => Ok(self.on_song_commands()),
            other => {
                info!("[Songs] Unhandled command: {other}");
                Ok(None)
            }
        };
        surface_no_device(result, NO_DEVICE.to_string())
    }
}

/// Playback actions a reward can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongAction {
    Skip,
    Add,
    Pause,
    Resume,
}

pub struct SongRewards {
    music: Arc<dyn MusicControl>,
    bindings: HashMap<String, SongAction>,
    binding_order: Vec<String>,
}

impl SongRewards {
    pub fn new(
        music: Arc<dyn MusicControl>,
        bindings: impl IntoIterator<Item = (String, SongAction)>,
    ) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for (reward_id, action) in bindings {
            if map.insert(reward_id.clone(), action).is_none() {
                order.push(reward_id);
            }
        }
        Self { music, bindings: map, binding_order: order }
    }

    /// Bound reward ids, in binding order.
    pub fn reward_ids(&self) -> &[String] {
        &self.binding_order
    }

    async fn on_add_reward(&self, event: &RewardEvent) -> Result<Option<CommandResponse>> {
        match self.music.add_to_queue(&event.message).await? {
            Some(track) => Ok(Some(CommandResponse::say(format!(
                "@{} Added {} to the queue.",
                event.user,
                track.by_line()
            )))),
            None => Ok(Some(CommandResponse::say(format!(
                "@{} No song found for: {}; hopefully someone refunds you.",
                event.user, event.message
            )))),
        }
    }
}

#[async_trait]
impl RewardHandler for SongRewards {
    async fn handle(&self, event: &RewardEvent) -> Result<Option<CommandResponse>> {
        let Some(reward_id) = event.meta.reward_id.as_deref() else {
            return Ok(None);
        };
        let Some(action) = self.bindings.get(reward_id) else {
            info!("[Songs] Unhandled reward: {reward_id}");
            return Ok(None);
        };

        let result = match action {
            SongAction::Skip => self.music.skip().await.map(|_| None),
            SongAction::Pause => self.music.pause().await.map(|_| None),
            SongAction::Resume => self.music.resume().await.map(|_| None),
            SongAction::Add => self.on_add_reward(event).await,
        };

        // A cost was already paid; apologize instead of crashing dispatch.
        surface_no_device(
            result,
            format!(
                "@{} Spotify has no active playback device; hopefully someone refunds you.",
                event.user
            ),
        )
    }
}

/// Convert the expected-absence `NoActiveDevice` failure into a chat reply;
/// every other error keeps propagating.
fn surface_no_device(
    result: Result<Option<CommandResponse>>,
    message: String,
) -> Result<Option<CommandResponse>> {
    match result {
        Err(err) if matches!(err.downcast_ref::<BotError>(), Some(BotError::NoActiveDevice)) => {
            Ok(Some(CommandResponse::say(message)))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebot_core::{Flags, ResponseKind, Track};
    use jukebot_events::EventMeta;
    use std::sync::Mutex;

    /// Scriptable music collaborator that counts every call.
    #[derive(Default)]
    struct MockMusic {
        found: Option<Track>,
        current: Option<Track>,
        next: Option<Track>,
        no_device: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockMusic {
        fn with_found(track: Track) -> Self {
            Self { found: Some(track), ..Self::default() }
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MusicControl for MockMusic {
        async fn find_song(&self, _query: &str) -> Result<Option<Track>> {
            self.record("find_song");
            Ok(self.found.clone())
        }

        async fn add_to_queue(&self, _query: &str) -> Result<Option<Track>> {
            self.record("add_to_queue");
            if self.found.is_some() && self.no_device {
                return Err(BotError::NoActiveDevice.into());
            }
            Ok(self.found.clone())
        }

        async fn current_song(&self) -> Result<Option<Track>> {
            self.record("current_song");
            Ok(self.current.clone())
        }

        async fn next_song(&self) -> Result<Option<Track>> {
            self.record("next_song");
            Ok(self.next.clone())
        }

        async fn queued_songs(&self) -> Result<Vec<String>> {
            self.record("queued_songs");
            Ok(vec![])
        }

        async fn skip(&self) -> Result<()> {
            self.record("skip");
            if self.no_device {
                return Err(BotError::NoActiveDevice.into());
            }
            Ok(())
        }

        async fn pause(&self) -> Result<()> {
            self.record("pause");
            Ok(())
        }

        async fn resume(&self) -> Result<()> {
            self.record("resume");
            Ok(())
        }
    }

    fn track() -> Track {
        Track {
            name: "Test Drive".into(),
            uri: "spotify:track:xyz".into(),
            album: "How to Train Your Dragon".into(),
            artists: vec!["John Powell".into()],
        }
    }

    fn command(name: &str, message: &str, flags: Flags) -> CommandEvent {
        CommandEvent {
            user: "viewer".into(),
            command: name.into(),
            message: message.into(),
            flags,
            meta: EventMeta { channel: "streamer".into(), reward_id: None },
        }
    }

    fn redemption(reward_id: &str, message: &str) -> RewardEvent {
        RewardEvent {
            user: "viewer".into(),
            reward: reward_id.into(),
            cost: 500,
            message: message.into(),
            meta: EventMeta { channel: "streamer".into(), reward_id: Some(reward_id.into()) },
        }
    }

    fn moderator() -> Flags {
        Flags { moderator: true, ..Flags::default() }
    }

    #[tokio::test]
    async fn song_with_nothing_playing_uses_the_fixed_string() {
        let music = Arc::new(MockMusic::default());
        let handler = SongCommands::new(music.clone());

        let response = handler
            .handle(&command("song", "", Flags::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Say);
        assert_eq!(response.message, "No song is currently playing");
        assert_eq!(*music.calls.lock().unwrap(), ["current_song"]);
    }

    #[tokio::test]
    async fn song_formats_name_and_artists() {
        let music = Arc::new(MockMusic { current: Some(track()), ..MockMusic::default() });
        let handler = SongCommands::new(music);

        let response = handler
            .handle(&command("song", "", Flags::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.message, "Now playing: Test Drive by John Powell");
    }

    #[tokio::test]
    async fn add_from_unprivileged_user_is_rejected_without_a_service_call() {
        let music = Arc::new(MockMusic::with_found(track()));
        let handler = SongCommands::new(music.clone());

        let response = handler
            .handle(&command("add", "lo-fi beats", Flags::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.message, "RIPBOZO command is not for you.");
        assert_eq!(music.call_count(), 0);
    }

    #[tokio::test]
    async fn add_from_moderator_names_the_track() {
        let music = Arc::new(MockMusic::with_found(track()));
        let handler = SongCommands::new(music);

        let response = handler
            .handle(&command("add", "test drive", moderator()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.message, "Added Test Drive to the queue.");
    }

    #[tokio::test]
    async fn lookup_miss_names_the_original_query() {
        let music = Arc::new(MockMusic::default());
        let handler = SongCommands::new(music);

        let response = handler
            .handle(&command("lookup", "asdkfjhasdkjfh", Flags::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.message, "No song found for: asdkfjhasdkjfh");
    }

    #[tokio::test]
    async fn lookup_hit_reports_album_detail() {
        let music = Arc::new(MockMusic::with_found(track()));
        let handler = SongCommands::new(music);

        let response = handler
            .handle(&command("lookup", "test drive", Flags::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            response.message,
            "Found: Test Drive by John Powell on the album How to Train Your Dragon"
        );
    }

    #[tokio::test]
    async fn next_with_empty_queue_uses_the_fixed_string() {
        let music = Arc::new(MockMusic::default());
        let handler = SongCommands::new(music);

        let response = handler
            .handle(&command("next", "", Flags::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.message, "There are no songs in the queue.");
    }

    #[tokio::test]
    async fn songcommands_listing_is_stable_across_calls() {
        let music = Arc::new(MockMusic::default());
        let handler = SongCommands::new(music);
        let expected = "!skip, !song, !next, !lookup, !add, !songcommands";

        for _ in 0..3 {
            let response = handler
                .handle(&command("songcommands", "", Flags::default()))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(response.message, expected);
        }
    }

    #[tokio::test]
    async fn skip_command_without_device_reports_instead_of_failing() {
        let music = Arc::new(MockMusic { no_device: true, ..MockMusic::default() });
        let handler = SongCommands::new(music);

        let response = handler
            .handle(&command("skip", "", moderator()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.message, "Spotify has no active playback device.");
    }

    #[tokio::test]
    async fn add_reward_addresses_the_redeemer() {
        let music = Arc::new(MockMusic::with_found(track()));
        let rewards = SongRewards::new(music, [("add-id".to_string(), SongAction::Add)]);

        let response = rewards
            .handle(&redemption("add-id", "test drive"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            response.message,
            "@viewer Added Test Drive by John Powell to the queue."
        );
    }

    #[tokio::test]
    async fn add_reward_miss_apologizes() {
        let music = Arc::new(MockMusic::default());
        let rewards = SongRewards::new(music, [("add-id".to_string(), SongAction::Add)]);

        let response = rewards
            .handle(&redemption("add-id", "asdkfjhasdkjfh"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            response.message,
            "@viewer No song found for: asdkfjhasdkjfh; hopefully someone refunds you."
        );
    }

    #[tokio::test]
    async fn reward_skip_bypasses_the_permission_gate() {
        let music = Arc::new(MockMusic::default());
        let rewards = SongRewards::new(music.clone(), [("skip-id".to_string(), SongAction::Skip)]);

        let response = rewards.handle(&redemption("skip-id", "")).await.unwrap();

        assert!(response.is_none());
        assert_eq!(*music.calls.lock().unwrap(), ["skip"]);
    }

    #[tokio::test]
    async fn reward_without_device_apologizes_to_the_redeemer() {
        let music = Arc::new(MockMusic { no_device: true, ..MockMusic::default() });
        let rewards = SongRewards::new(music, [("skip-id".to_string(), SongAction::Skip)]);

        let response = rewards.handle(&redemption("skip-id", "")).await.unwrap().unwrap();

        assert_eq!(
            response.message,
            "@viewer Spotify has no active playback device; hopefully someone refunds you."
        );
    }

    #[tokio::test]
    async fn unbound_reward_is_a_logged_no_op() {
        let music = Arc::new(MockMusic::default());
        let rewards = SongRewards::new(music.clone(), [("add-id".to_string(), SongAction::Add)]);

        let response = rewards.handle(&redemption("other-id", "text")).await.unwrap();

        assert!(response.is_none());
        assert_eq!(music.call_count(), 0);
    }
}

//! Config file schema with serde defaults.
//!
//! One YAML file describes the channel, the Spotify application, and the
//! reward-id bindings for both the song rewards and the TTS speakers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub twitch: TwitchSection,
    pub spotify: SpotifySection,
    pub tts: TtsSection,
    pub log: LogSection,
    pub overlay: OverlaySection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchSection {
    /// Chat OAuth token. `JUKEBOT_TWITCH_TOKEN` overrides this.
    pub token: Option<String>,
    pub nick: String,
    /// Channel to join, without the `#` prefix.
    pub channel: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifySection {
    pub client_id: String,
    pub rewards: SongRewardIds,
}

/// Reward ids bound to the playback actions. Unset actions are simply not
/// registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SongRewardIds {
    pub skip: Option<String>,
    pub add: Option<String>,
    pub pause: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSection {
    /// Reward-id → voice bindings, in registration order.
    pub speakers: Vec<SpeakerBinding>,
    pub skip_reward: Option<String>,
    pub random_reward: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerBinding {
    pub reward_id: String,
    pub voice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,
    pub dir: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self { level: "info".to_string(), dir: "logs".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySection {
    /// Bind address of the overlay server.
    pub bind: String,
}

impl Default for OverlaySection {
    fn default() -> Self {
        Self { bind: "127.0.0.1:3030".to_string() }
    }
}

/// Load and parse the config from disk.
///
/// Returns defaults if the file doesn't exist (first run); startup
/// validation of required fields happens in the composition root.
pub async fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(BotConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: BotConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
twitch:
  nick: jukebot
  channel: streamer
spotify:
  client_id: abc123
  rewards:
    skip: "1e9fe39f-2e7d-4f24-8a76-97e31fd6e065"
    add: "6006568f-5023-47b9-93c7-191596139370"
tts:
  speakers:
    - reward_id: "2da16ec5-b966-4ce0-a40d-6d0ba2f94a6e"
      voice: Brian
    - reward_id: "ca333739-872c-4fbe-8866-b8c291a2fe87"
      voice: Kendra
  skip_reward: "7481775e-5c63-43b9-83c7-d65061922f68"
log:
  level: debug
"#;
        let config: BotConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.twitch.channel, "streamer");
        assert_eq!(config.spotify.rewards.skip.as_deref(), Some("1e9fe39f-2e7d-4f24-8a76-97e31fd6e065"));
        assert_eq!(config.spotify.rewards.pause, None);
        assert_eq!(config.tts.speakers.len(), 2);
        assert_eq!(config.tts.speakers[0].voice, "Brian");
        assert_eq!(config.log.level, "debug");
        // Unset sections fall back to defaults.
        assert_eq!(config.log.dir, "logs");
        assert_eq!(config.overlay.bind, "127.0.0.1:3030");
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: BotConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.twitch.token.is_none());
        assert!(config.tts.speakers.is_empty());
        assert_eq!(config.log.level, "info");
    }
}

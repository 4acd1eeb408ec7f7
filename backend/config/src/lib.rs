pub mod schema;
pub mod store;

pub use schema::{
    load_config, BotConfig, LogSection, OverlaySection, SongRewardIds, SpeakerBinding,
    SpotifySection, TtsSection, TwitchSection,
};
pub use store::TokenStore;

use std::path::{Path, PathBuf};

/// Name of the config file within the config directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the jukebot config directory.
/// Priority: `JUKEBOT_CONFIG_DIR` env > `~/.jukebot` > `./.jukebot`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("JUKEBOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".jukebot");
    }
    PathBuf::from(".jukebot")
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

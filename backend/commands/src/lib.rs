pub mod song;

pub use song::{SongAction, SongCommands, SongRewards, SONG_COMMANDS};

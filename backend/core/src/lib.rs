pub mod error;
pub mod traits;
pub mod types;

pub use error::BotError;
pub use traits::MusicControl;
pub use types::{CommandResponse, Flags, ResponseKind, Track};

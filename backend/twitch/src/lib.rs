pub mod adapter;
pub mod irc;

pub use adapter::{ChatEvent, TwitchAdapter, TwitchConfig, TwitchSender};

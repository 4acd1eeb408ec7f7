pub mod dispatch;
pub mod registry;

pub use dispatch::{
    ChatSink, CommandEvent, CommandHandler, Dispatcher, EventMeta, RewardEvent, RewardHandler,
};
pub use registry::Registry;

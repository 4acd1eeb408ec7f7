//! Event dispatch — resolve inbound chat events through the registry and
//! deliver any handler reply back to the platform.
//!
//! Unknown commands and rewards are expected chat noise: they log and
//! produce no delivery. Handler errors propagate to the caller, which is
//! responsible for rendering a visible error and halting automated action.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use jukebot_core::{CommandResponse, Flags, ResponseKind};

use crate::registry::Registry;

/// Collaborator-supplied envelope accompanying every inbound event.
#[derive(Debug, Clone, Default)]
pub struct EventMeta {
    /// Channel the event arrived on (no `#` prefix).
    pub channel: String,
    /// Platform-issued reward id, present on redemption events.
    pub reward_id: Option<String>,
}

/// A chat command event (`!name rest-of-message`), trigger marker removed.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub user: String,
    pub command: String,
    pub message: String,
    pub flags: Flags,
    pub meta: EventMeta,
}

/// A channel-point reward redemption.
#[derive(Debug, Clone)]
pub struct RewardEvent {
    pub user: String,
    /// Display payload of the reward. Routing uses `meta.reward_id`.
    pub reward: String,
    /// Redemption cost. Zero when the transport does not supply one.
    pub cost: u32,
    pub message: String,
    pub meta: EventMeta,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, event: &CommandEvent) -> Result<Option<CommandResponse>>;
}

#[async_trait]
pub trait RewardHandler: Send + Sync {
    async fn handle(&self, event: &RewardEvent) -> Result<Option<CommandResponse>>;
}

/// Outbound delivery surface of the chat platform. Delivery failures are the
/// platform collaborator's own error channel; nothing here retries.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Broadcast a message to the channel.
    async fn say(&self, message: &str, channel: &str) -> Result<()>;

    /// Send a private message to a user.
    async fn whisper(&self, user: &str, message: &str) -> Result<()>;
}

/// Routes platform events through the registry and performs at most one
/// delivery call for the reply a handler produces.
pub struct Dispatcher {
    registry: Registry,
    sink: Arc<dyn ChatSink>,
}

impl Dispatcher {
    pub fn new(registry: Registry, sink: Arc<dyn ChatSink>) -> Self {
        Self { registry, sink }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one command event.
    pub async fn on_command(&self, event: CommandEvent) -> Result<()> {
        let Some(handler) = self.registry.resolve_command(&event.command) else {
            info!("[Dispatch] Unhandled command: {}", event.command);
            return Ok(());
        };

        debug!("[Dispatch] !{} from {}", event.command, event.user);
        let response = handler.handle(&event).await?;
        self.deliver(response, &event.user, &event.meta).await
    }

    /// Handle one reward redemption. The reward id comes from the platform
    /// envelope, not from the reward's display payload.
    pub async fn on_reward(&self, event: RewardEvent) -> Result<()> {
        let Some(reward_id) = event.meta.reward_id.as_deref() else {
            info!("[Dispatch] Reward event without reward id from {}", event.user);
            return Ok(());
        };
        let Some(handler) = self.registry.resolve_reward(reward_id) else {
            info!("[Dispatch] Unhandled reward: {reward_id}");
            return Ok(());
        };

        debug!("[Dispatch] Reward {} from {}", reward_id, event.user);
        let response = handler.handle(&event).await?;
        self.deliver(response, &event.user, &event.meta).await
    }

    /// `None` means the handler already produced any user-visible effect
    /// itself, or intentionally stayed silent. The kind enum is closed, so
    /// the match below is the whole delivery contract.
    async fn deliver(
        &self,
        response: Option<CommandResponse>,
        user: &str,
        meta: &EventMeta,
    ) -> Result<()> {
        let Some(response) = response else {
            return Ok(());
        };
        match response.kind {
            ResponseKind::Say => self.sink.say(&response.message, &meta.channel).await,
            ResponseKind::Whisper => self.sink.whisper(user, &response.message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every delivery call for assertions.
    #[derive(Default)]
    struct RecordingSink {
        says: Mutex<Vec<(String, String)>>,
        whispers: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn say(&self, message: &str, channel: &str) -> Result<()> {
            self.says.lock().unwrap().push((message.into(), channel.into()));
            Ok(())
        }

        async fn whisper(&self, user: &str, message: &str) -> Result<()> {
            self.whispers.lock().unwrap().push((user.into(), message.into()));
            Ok(())
        }
    }

    struct Replies(Option<CommandResponse>);

    #[async_trait]
    impl CommandHandler for Replies {
        async fn handle(&self, _event: &CommandEvent) -> Result<Option<CommandResponse>> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl RewardHandler for Replies {
        async fn handle(&self, _event: &RewardEvent) -> Result<Option<CommandResponse>> {
            Ok(self.0.clone())
        }
    }

    fn command_event(command: &str) -> CommandEvent {
        CommandEvent {
            user: "viewer".into(),
            command: command.into(),
            message: String::new(),
            flags: Flags::default(),
            meta: EventMeta { channel: "streamer".into(), reward_id: None },
        }
    }

    fn reward_event(reward_id: Option<&str>) -> RewardEvent {
        RewardEvent {
            user: "viewer".into(),
            reward: reward_id.unwrap_or_default().into(),
            cost: 0,
            message: "hello".into(),
            meta: EventMeta {
                channel: "streamer".into(),
                reward_id: reward_id.map(str::to_string),
            },
        }
    }

    #[tokio::test]
    async fn say_response_broadcasts_to_channel() {
        let sink = Arc::new(RecordingSink::default());
        let mut registry = Registry::new();
        registry.register_command("song", Arc::new(Replies(Some(CommandResponse::say("hi")))));
        let dispatcher = Dispatcher::new(registry, sink.clone());

        dispatcher.on_command(command_event("song")).await.unwrap();

        assert_eq!(*sink.says.lock().unwrap(), [("hi".to_string(), "streamer".to_string())]);
        assert!(sink.whispers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn whisper_response_targets_the_user() {
        let sink = Arc::new(RecordingSink::default());
        let mut registry = Registry::new();
        registry.register_command("secret", Arc::new(Replies(Some(CommandResponse::whisper("psst")))));
        let dispatcher = Dispatcher::new(registry, sink.clone());

        dispatcher.on_command(command_event("secret")).await.unwrap();

        assert_eq!(*sink.whispers.lock().unwrap(), [("viewer".to_string(), "psst".to_string())]);
        assert!(sink.says.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_response_means_no_delivery() {
        let sink = Arc::new(RecordingSink::default());
        let mut registry = Registry::new();
        registry.register_command("skip", Arc::new(Replies(None)));
        let dispatcher = Dispatcher::new(registry, sink.clone());

        dispatcher.on_command(command_event("skip")).await.unwrap();

        assert!(sink.says.lock().unwrap().is_empty());
        assert!(sink.whispers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolved_command_is_a_silent_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(Registry::new(), sink.clone());

        dispatcher.on_command(command_event("unknown")).await.unwrap();

        assert!(sink.says.lock().unwrap().is_empty());
        assert!(sink.whispers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reward_routes_by_envelope_id() {
        let sink = Arc::new(RecordingSink::default());
        let mut registry = Registry::new();
        registry.register_reward("abc-123", Arc::new(Replies(Some(CommandResponse::say("spoken")))));
        let dispatcher = Dispatcher::new(registry, sink.clone());

        dispatcher.on_reward(reward_event(Some("abc-123"))).await.unwrap();
        dispatcher.on_reward(reward_event(Some("other"))).await.unwrap();
        dispatcher.on_reward(reward_event(None)).await.unwrap();

        assert_eq!(sink.says.lock().unwrap().len(), 1);
    }
}

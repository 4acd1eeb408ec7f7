//! Command and reward registry.
//!
//! Maps opaque string keys (command names, reward ids) to handlers. Keys are
//! unique; re-registering a key silently replaces the previous handler
//! (last write wins), logged at `warn` so alias collisions between
//! independent handler sets are at least visible. Lookup is exact-string and
//! case-sensitive. Registration never fails.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::dispatch::{CommandHandler, RewardHandler};

#[derive(Default)]
pub struct Registry {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    command_order: Vec<String>,
    rewards: HashMap<String, Arc<dyn RewardHandler>>,
    reward_order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single command. A leading `!` trigger marker is stripped.
    pub fn register_command(&mut self, name: &str, handler: Arc<dyn CommandHandler>) {
        let name = name.strip_prefix('!').unwrap_or(name);
        if self.commands.insert(name.to_string(), handler).is_some() {
            warn!("[Registry] Replacing handler for command '{name}'");
        } else {
            self.command_order.push(name.to_string());
        }
    }

    /// Register one handler for a family of command aliases.
    pub fn register_commands<I>(&mut self, names: I, handler: Arc<dyn CommandHandler>)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            self.register_command(name.as_ref(), Arc::clone(&handler));
        }
    }

    /// Register a single reward by its platform-issued id.
    pub fn register_reward(&mut self, reward_id: &str, handler: Arc<dyn RewardHandler>) {
        if self.rewards.insert(reward_id.to_string(), handler).is_some() {
            warn!("[Registry] Replacing handler for reward '{reward_id}'");
        } else {
            self.reward_order.push(reward_id.to_string());
        }
    }

    /// Register one handler for a set of reward ids.
    pub fn register_rewards<I>(&mut self, reward_ids: I, handler: Arc<dyn RewardHandler>)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in reward_ids {
            self.register_reward(id.as_ref(), Arc::clone(&handler));
        }
    }

    /// Exact lookup. Absent resolution is a normal, expected outcome.
    pub fn resolve_command(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.get(name).cloned()
    }

    pub fn resolve_reward(&self, reward_id: &str) -> Option<Arc<dyn RewardHandler>> {
        self.rewards.get(reward_id).cloned()
    }

    /// Registered command names, in registration order.
    pub fn command_names(&self) -> &[String] {
        &self.command_order
    }

    /// Registered reward ids, in registration order.
    pub fn reward_ids(&self) -> &[String] {
        &self.reward_order
    }
}

//! TTS reward handlers: mapped speakers, random voice, and skip.
//!
//! Redemption is the authorization; no permission flags are checked here.
//! Handlers never reply to chat; the synthesized clip is the user-visible
//! effect.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use jukebot_core::CommandResponse;
use jukebot_events::{RewardEvent, RewardHandler};

use crate::roster;
use crate::sequencer::Sequencer;
use crate::synth::SpeechProvider;

/// Shared state for the TTS handler family.
pub struct TtsSystem {
    provider: Arc<dyn SpeechProvider>,
    sequencer: Arc<Sequencer>,
    /// reward id → voice name.
    speakers: HashMap<String, String>,
    speaker_order: Vec<String>,
}

impl TtsSystem {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        sequencer: Arc<Sequencer>,
        speakers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for (reward_id, voice) in speakers {
            if map.insert(reward_id.clone(), voice).is_none() {
                order.push(reward_id);
            }
        }
        Self { provider, sequencer, speakers: map, speaker_order: order }
    }

    /// Reward ids with a bound speaker voice, in binding order.
    pub fn speaker_reward_ids(&self) -> &[String] {
        &self.speaker_order
    }

    /// Synthesize and hand the clip to the sequencer.
    async fn speak(&self, voice: &str, text: &str) -> Result<()> {
        let clip = self.provider.synthesize(voice, text).await?;
        self.sequencer.enqueue_or_play(clip).await
    }
}

/// Reads the redeemed message with the voice bound to the reward id.
pub struct SpeakerReward(pub Arc<TtsSystem>);

#[async_trait]
impl RewardHandler for SpeakerReward {
    async fn handle(&self, event: &RewardEvent) -> Result<Option<CommandResponse>> {
        let Some(reward_id) = event.meta.reward_id.as_deref() else {
            return Ok(None);
        };
        let Some(voice) = self.0.speakers.get(reward_id) else {
            info!("[TTS] Unhandled speaker: {reward_id}");
            return Ok(None);
        };
        self.0.speak(voice, &event.message).await?;
        Ok(None)
    }
}

/// Reads the redeemed message with a voice picked uniformly from the
/// roster, fresh on every invocation.
pub struct RandomVoiceReward(pub Arc<TtsSystem>);

#[async_trait]
impl RewardHandler for RandomVoiceReward {
    async fn handle(&self, event: &RewardEvent) -> Result<Option<CommandResponse>> {
        let voice = roster::random_voice();
        info!("[TTS] Random voice: {voice}");
        self.0.speak(voice, &event.message).await?;
        Ok(None)
    }
}

/// Skips whatever is currently being read out.
pub struct SkipTtsReward(pub Arc<TtsSystem>);

#[async_trait]
impl RewardHandler for SkipTtsReward {
    async fn handle(&self, _event: &RewardEvent) -> Result<Option<CommandResponse>> {
        self.0.sequencer.skip_current().await?;
        Ok(None)
    }
}

//! Speech synthesis provider (StreamElements).
//!
//! Synthesis fetches the complete audio payload up front, so a clip handed
//! to the sequencer never stalls mid-queue on a slow fetch.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::info;
use uuid::Uuid;

use jukebot_core::BotError;

const SPEECH_URL: &str = "https://api.streamelements.com/kappa/v2/speech";

/// One synthesized utterance, ready to render.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub id: Uuid,
    pub voice: String,
    pub audio: Bytes,
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Convert text to a playable clip. A non-success status is a fault,
    /// not an absence; callers must not continue silently.
    async fn synthesize(&self, voice: &str, text: &str) -> Result<AudioClip>;
}

pub struct StreamElementsTts {
    http: Client,
}

impl StreamElementsTts {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

impl Default for StreamElementsTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechProvider for StreamElementsTts {
    async fn synthesize(&self, voice: &str, text: &str) -> Result<AudioClip> {
        let response = self
            .http
            .get(SPEECH_URL)
            .query(&[("voice", voice), ("text", text.trim())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Synthesis { status, body }.into());
        }

        let audio = response.bytes().await?;
        info!("[TTS] Synthesized {} bytes with voice {voice}", audio.len());
        Ok(AudioClip { id: Uuid::new_v4(), voice: voice.to_string(), audio })
    }
}

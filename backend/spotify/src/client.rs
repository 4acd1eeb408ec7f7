//! Spotify Web API wrapper.
//!
//! Thin REST layer: token refresh with rotation, catalog search, queue
//! inspection, and transport control against whichever device is active.
//! No caching; every call reflects the remote state at that moment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::sync::RwLock;
use tracing::{error, info};

use jukebot_config::TokenStore;
use jukebot_core::{BotError, MusicControl, Track};

use crate::auth;
use crate::models::{CurrentlyPlaying, DevicesResponse, QueueResponse, SearchResponse};

const API_BASE: &str = "https://api.spotify.com/v1";

/// Seconds before expiry at which the background task refreshes, so no
/// request ever waits on a refresh.
const REFRESH_MARGIN_SECS: u64 = 120;

pub struct SpotifyClient {
    http: Client,
    client_id: String,
    store: TokenStore,
    access_token: RwLock<String>,
    refresh_token: RwLock<String>,
}

impl SpotifyClient {
    /// Refresh with the stored credential, start the background refresh
    /// task, and return a ready client.
    pub async fn connect(client_id: String, store: TokenStore) -> Result<Arc<Self>> {
        let refresh_token = store
            .load()
            .await?
            .ok_or_else(|| BotError::Config("no stored Spotify refresh token".into()))?;

        let client = Arc::new(Self {
            http: Client::new(),
            client_id,
            store,
            access_token: RwLock::new(String::new()),
            refresh_token: RwLock::new(refresh_token),
        });
        let delay = client.refresh().await?;
        client.spawn_refresh_task(delay);
        Ok(client)
    }

    /// Exchange the current refresh token, persist any rotation, and return
    /// the delay until the next refresh. A rejected refresh clears the
    /// stored credential; the process cannot self-heal from that.
    async fn refresh(&self) -> Result<Duration> {
        let current = self.refresh_token.read().await.clone();
        let tokens = match auth::refresh_access_token(&self.http, &self.client_id, &current).await {
            Ok(tokens) => tokens,
            Err(err) => {
                if matches!(err.downcast_ref::<BotError>(), Some(BotError::CredentialRejected(_))) {
                    self.store.clear().await?;
                }
                return Err(err);
            }
        };

        *self.access_token.write().await = tokens.access_token;
        if let Some(rotated) = tokens.refresh_token {
            self.store.save(&rotated).await?;
            *self.refresh_token.write().await = rotated;
        }

        let delay =
            Duration::from_secs(tokens.expires_in.saturating_sub(REFRESH_MARGIN_SECS).max(30));
        info!("[Spotify] Access token refreshed; next refresh in {}s", delay.as_secs());
        Ok(delay)
    }

    fn spawn_refresh_task(self: &Arc<Self>, mut delay: Duration) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay).await;
                match client.refresh().await {
                    Ok(next) => delay = next,
                    Err(err) => {
                        error!("[Spotify] Token refresh failed: {err}; re-authorization required");
                        break;
                    }
                }
            }
        });
    }

    async fn bearer(&self) -> String {
        self.access_token.read().await.clone()
    }

    /// Id of the device currently marked active.
    async fn active_device_id(&self) -> Result<String> {
        let devices: DevicesResponse = self
            .http
            .get(format!("{API_BASE}/me/player/devices"))
            .bearer_auth(self.bearer().await)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        devices
            .devices
            .into_iter()
            .find(|device| device.is_active)
            .and_then(|device| device.id)
            .ok_or_else(|| BotError::NoActiveDevice.into())
    }

    async fn user_queue(&self) -> Result<QueueResponse> {
        let queue = self
            .http
            .get(format!("{API_BASE}/me/player/queue"))
            .bearer_auth(self.bearer().await)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(queue)
    }
}

#[async_trait]
impl MusicControl for SpotifyClient {
    async fn find_song(&self, query: &str) -> Result<Option<Track>> {
        let results: SearchResponse = self
            .http
            .get(format!("{API_BASE}/search"))
            .bearer_auth(self.bearer().await)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(results.tracks.items.into_iter().next().map(Track::from))
    }

    async fn add_to_queue(&self, query: &str) -> Result<Option<Track>> {
        let Some(track) = self.find_song(query).await? else {
            return Ok(None);
        };
        let device_id = self.active_device_id().await?;

        info!("[Spotify] Queueing {} on device {device_id}", track.uri);
        self.http
            .post(format!("{API_BASE}/me/player/queue"))
            .bearer_auth(self.bearer().await)
            .query(&[("uri", track.uri.as_str()), ("device_id", device_id.as_str())])
            .send()
            .await?
            .error_for_status()?;

        Ok(Some(track))
    }

    async fn current_song(&self) -> Result<Option<Track>> {
        let response = self
            .http
            .get(format!("{API_BASE}/me/player/currently-playing"))
            .bearer_auth(self.bearer().await)
            .send()
            .await?
            .error_for_status()?;

        // Nothing playing at all.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let playing: CurrentlyPlaying = response.json().await?;
        if !playing.is_playing || playing.currently_playing_type != "track" {
            return Ok(None);
        }
        Ok(playing.item.map(Track::from))
    }

    async fn next_song(&self) -> Result<Option<Track>> {
        let queue = self.user_queue().await?;
        Ok(queue.queue.into_iter().next().map(Track::from))
    }

    async fn queued_songs(&self) -> Result<Vec<String>> {
        let queue = self.user_queue().await?;
        Ok(queue.queue.into_iter().map(|track| track.name).collect())
    }

    async fn skip(&self) -> Result<()> {
        let device_id = self.active_device_id().await?;
        self.http
            .post(format!("{API_BASE}/me/player/next"))
            .bearer_auth(self.bearer().await)
            .query(&[("device_id", device_id.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let device_id = self.active_device_id().await?;
        self.http
            .put(format!("{API_BASE}/me/player/pause"))
            .bearer_auth(self.bearer().await)
            .query(&[("device_id", device_id.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        let device_id = self.active_device_id().await?;
        self.http
            .put(format!("{API_BASE}/me/player/play"))
            .bearer_auth(self.bearer().await)
            .query(&[("device_id", device_id.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

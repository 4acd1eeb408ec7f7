//! Composition root: config, logging, collaborators, registry, and the
//! single event loop driving dispatch and playback advancement.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{error, info};

use jukebot_commands::{SongAction, SongCommands, SongRewards, SONG_COMMANDS};
use jukebot_config::{config_dir, config_file_path, load_config, BotConfig, TokenStore};
use jukebot_core::MusicControl;
use jukebot_events::{Dispatcher, Registry};
use jukebot_logging::init_logger;
use jukebot_spotify::SpotifyClient;
use jukebot_tts::{
    RandomVoiceReward, Sequencer, SkipTtsReward, SpeakerReward, StreamElementsTts, TtsSystem,
};
use jukebot_twitch::{ChatEvent, TwitchAdapter, TwitchConfig};

use crate::overlay;

pub async fn run(refresh_token: Option<String>) -> Result<()> {
    let config_dir = config_dir();
    let config = load_config(&config_file_path(&config_dir)).await?;
    init_logger(&config.log.dir, &config.log.level);

    let twitch_token = std::env::var("JUKEBOT_TWITCH_TOKEN")
        .ok()
        .or_else(|| config.twitch.token.clone());
    let Some(twitch_token) = twitch_token else {
        bail!("Missing Twitch token! Set JUKEBOT_TWITCH_TOKEN or twitch.token in config.yaml");
    };
    if config.twitch.channel.is_empty() {
        bail!("Missing twitch.channel in config.yaml");
    }

    // The single durable credential. A freshly supplied value is stored
    // once; absence of both is fatal.
    let store = TokenStore::new(&config_dir);
    if let Some(fresh) = refresh_token {
        store.save(&fresh).await?;
    }
    if store.load().await?.is_none() {
        bail!("Missing Spotify refresh token! Run `jukebot auth` once or pass --refresh-token");
    }

    let spotify = SpotifyClient::connect(config.spotify.client_id.clone(), store).await?;
    let music: Arc<dyn MusicControl> = spotify;

    // Overlay server renders the audio; its `ended` reports drive the
    // sequencer's completion transition.
    let (sink, mut player_rx) = overlay::spawn(&config.overlay.bind).await?;
    let sequencer = Arc::new(Sequencer::new(sink));

    let tts = Arc::new(TtsSystem::new(
        Arc::new(StreamElementsTts::new()),
        sequencer.clone(),
        config
            .tts
            .speakers
            .iter()
            .map(|binding| (binding.reward_id.clone(), binding.voice.clone())),
    ));

    let mut registry = Registry::new();
    registry.register_commands(SONG_COMMANDS, Arc::new(SongCommands::new(music.clone())));

    let song_rewards = Arc::new(SongRewards::new(music.clone(), song_reward_bindings(&config)));
    registry.register_rewards(song_rewards.reward_ids().to_vec(), song_rewards.clone());

    registry.register_rewards(tts.speaker_reward_ids(), Arc::new(SpeakerReward(tts.clone())));
    if let Some(id) = &config.tts.skip_reward {
        registry.register_reward(id, Arc::new(SkipTtsReward(tts.clone())));
    }
    if let Some(id) = &config.tts.random_reward {
        registry.register_reward(id, Arc::new(RandomVoiceReward(tts.clone())));
    }

    info!("[Main] Commands: {}", registry.command_names().join(", "));
    info!("[Main] Rewards bound: {}", registry.reward_ids().len());

    let nick = if config.twitch.nick.is_empty() {
        config.twitch.channel.clone()
    } else {
        config.twitch.nick.clone()
    };
    let (events_tx, mut events_rx) = mpsc::channel(64);
    let twitch_config = TwitchConfig::new(twitch_token, nick, config.twitch.channel.clone());
    let (adapter, sender) = TwitchAdapter::new(twitch_config, events_tx);
    let dispatcher = Dispatcher::new(registry, Arc::new(sender));

    tokio::spawn(async move {
        if let Err(err) = adapter.start().await {
            error!("[Twitch] Adapter stopped: {err}");
        }
    });

    // Single event loop: chat events and overlay playback reports.
    loop {
        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                let result = match event {
                    ChatEvent::Command(event) => dispatcher.on_command(event).await,
                    ChatEvent::Reward(event) => dispatcher.on_reward(event).await,
                };
                if let Err(err) = result {
                    // Contract violations and credential failures land
                    // here; halt automated action rather than limp on.
                    error!("[Main] Handler failed: {err:#}");
                    return Err(err);
                }
            }
            report = player_rx.recv() => {
                let Some(report) = report else { break };
                match report {
                    overlay::PlayerEvent::Ended => sequencer.on_playback_complete().await?,
                }
            }
        }
    }

    Ok(())
}

fn song_reward_bindings(config: &BotConfig) -> Vec<(String, SongAction)> {
    let rewards = &config.spotify.rewards;
    [
        (rewards.skip.clone(), SongAction::Skip),
        (rewards.add.clone(), SongAction::Add),
        (rewards.pause.clone(), SongAction::Pause),
        (rewards.resume.clone(), SongAction::Resume),
    ]
    .into_iter()
    .filter_map(|(id, action)| id.map(|id| (id, action)))
    .collect()
}

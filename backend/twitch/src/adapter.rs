//! Twitch chat adapter — connects to Twitch's IRC endpoint over TCP,
//! requests the tags/commands capabilities, and forwards parsed chat events
//! to the dispatcher loop. Outbound delivery goes through a cloneable
//! [`TwitchSender`] backed by a writer task.

use anyhow::Result;
use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};
use tracing::{error, info};

use jukebot_events::{ChatSink, CommandEvent, RewardEvent};

use crate::irc;

/// One dispatchable chat event.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Command(CommandEvent),
    Reward(RewardEvent),
}

pub struct TwitchConfig {
    pub server: String,
    pub port: u16,
    /// OAuth chat token; a missing `oauth:` prefix is added on connect.
    pub token: String,
    pub nick: String,
    /// Channel to join, without the `#` prefix.
    pub channel: String,
}

impl TwitchConfig {
    pub fn new(token: String, nick: String, channel: String) -> Self {
        Self {
            server: "irc.chat.twitch.tv".to_string(),
            port: 6667,
            token,
            nick,
            channel,
        }
    }
}

/// Cloneable outbound handle. Formats delivery calls as raw IRC lines and
/// hands them to the adapter's writer task.
#[derive(Clone)]
pub struct TwitchSender {
    out_tx: mpsc::Sender<String>,
    channel: String,
}

impl TwitchSender {
    async fn send_line(&self, line: String) -> Result<()> {
        self.out_tx
            .send(line)
            .await
            .map_err(|_| anyhow::anyhow!("chat connection closed"))
    }
}

#[async_trait]
impl ChatSink for TwitchSender {
    async fn say(&self, message: &str, channel: &str) -> Result<()> {
        let channel = if channel.is_empty() { &self.channel } else { channel };
        self.send_line(format!("PRIVMSG #{channel} :{message}")).await
    }

    async fn whisper(&self, user: &str, message: &str) -> Result<()> {
        self.send_line(format!("PRIVMSG #{} :/w {user} {message}", self.channel)).await
    }
}

pub struct TwitchAdapter {
    config: TwitchConfig,
    events_tx: mpsc::Sender<ChatEvent>,
    out_rx: mpsc::Receiver<String>,
    out_tx: mpsc::Sender<String>,
}

impl TwitchAdapter {
    /// Build the adapter and its outbound sender handle.
    pub fn new(config: TwitchConfig, events_tx: mpsc::Sender<ChatEvent>) -> (Self, TwitchSender) {
        let (out_tx, out_rx) = mpsc::channel(64);
        let sender = TwitchSender { out_tx: out_tx.clone(), channel: config.channel.clone() };
        (Self { config, events_tx, out_rx, out_tx }, sender)
    }

    /// Connect, authenticate, join, and run the read loop until the
    /// connection drops.
    pub async fn start(mut self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server, self.config.port);
        info!("[Twitch] Connecting to {addr}");

        let stream = TcpStream::connect(&addr).await?;
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let token = if self.config.token.starts_with("oauth:") {
            self.config.token.clone()
        } else {
            format!("oauth:{}", self.config.token)
        };
        writer.write_all(format!("PASS {token}\r\n").as_bytes()).await?;
        writer.write_all(format!("NICK {}\r\n", self.config.nick).as_bytes()).await?;
        writer
            .write_all(b"CAP REQ :twitch.tv/tags twitch.tv/commands\r\n")
            .await?;
        writer
            .write_all(format!("JOIN #{}\r\n", self.config.channel).as_bytes())
            .await?;

        info!("[Twitch] Joined #{} as {}", self.config.channel, self.config.nick);

        // Writer task: drains the outbound queue.
        let mut out_rx = self.out_rx;
        tokio::spawn(async move {
            while let Some(line) = out_rx.recv().await {
                if writer.write_all(format!("{line}\r\n").as_bytes()).await.is_err() {
                    error!("[Twitch] Outbound write failed; dropping connection");
                    break;
                }
            }
        });

        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(payload) = line.strip_prefix("PING ") {
                let _ = self.out_tx.send(format!("PONG {payload}")).await;
                continue;
            }

            let Some(msg) = irc::parse_privmsg(&line) else { continue };
            if let Some(event) = irc::classify(msg) {
                if self.events_tx.send(event).await.is_err() {
                    // Dispatcher loop is gone; nothing left to do.
                    break;
                }
            }
        }

        info!("[Twitch] Connection closed");
        Ok(())
    }
}

mod auth_cmd;
mod overlay;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jukebot")]
#[command(about = "Twitch chat bot driving Spotify playback and TTS rewards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to chat and start handling commands and rewards
    Run {
        /// Spotify refresh token; stored durably on first use
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// One-time Spotify authorization (PKCE)
    Auth {
        /// Override the configured Spotify client id
        #[arg(long)]
        client_id: Option<String>,
        /// Port for the local redirect listener
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { refresh_token } => run::run(refresh_token).await,
        Commands::Auth { client_id, port } => auth_cmd::run_auth(client_id, port).await,
    }
}

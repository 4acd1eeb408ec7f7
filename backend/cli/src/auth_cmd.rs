//! One-time Spotify authorization (PKCE).
//!
//! Prints the authorization URL, waits for the redirect on a local
//! listener, exchanges the code, and stores the refresh token. The wait is
//! a single blocking receive on a oneshot channel; the listener hands the
//! code over and is torn down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use tokio::sync::oneshot;

use jukebot_config::{config_dir, config_file_path, load_config, TokenStore};
use jukebot_spotify::auth;

type CodeSender = Arc<Mutex<Option<oneshot::Sender<Result<String, String>>>>>;

pub async fn run_auth(client_id: Option<String>, port: u16) -> Result<()> {
    let config_dir = config_dir();
    let config = load_config(&config_file_path(&config_dir)).await?;
    let client_id = client_id.unwrap_or(config.spotify.client_id);
    if client_id.is_empty() {
        bail!("Missing Spotify client id (set spotify.client_id in config.yaml or pass --client-id)");
    }

    let redirect_uri = format!("http://localhost:{port}/callback");
    let pkce = auth::generate_pkce();
    let url = auth::authorize_url(&client_id, &redirect_uri, &pkce.challenge);

    let (code_tx, code_rx) = oneshot::channel();
    let shared: CodeSender = Arc::new(Mutex::new(Some(code_tx)));

    let app = Router::new().route("/callback", get(callback)).with_state(shared);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to bind redirect listener on port {port}"))?;
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    println!("Open this URL in your browser and approve access:\n\n{url}\n");

    let code = code_rx
        .await?
        .map_err(|err| anyhow::anyhow!("authorization failed: {err}"))?;
    server.abort();

    let http = reqwest::Client::new();
    let tokens = auth::exchange_code(&http, &client_id, &code, &redirect_uri, &pkce.verifier).await?;
    let refresh_token = tokens
        .refresh_token
        .context("token response carried no refresh token")?;

    TokenStore::new(&config_dir).save(&refresh_token).await?;
    println!("Authorization complete; refresh token stored.");
    Ok(())
}

async fn callback(
    State(shared): State<CodeSender>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let Some(tx) = shared.lock().unwrap().take() else {
        return "Already received a code. You can close this tab.".to_string();
    };

    if let Some(error) = params.get("error") {
        let _ = tx.send(Err(error.clone()));
        return format!("Authorization failed: {error}");
    }
    match params.get("code") {
        Some(code) => {
            let _ = tx.send(Ok(code.clone()));
            "Code received. You can close this tab now.".to_string()
        }
        None => {
            let _ = tx.send(Err("no code provided".to_string()));
            "No code provided (something went wrong)".to_string()
        }
    }
}

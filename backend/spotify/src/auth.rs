//! Spotify account-service calls: PKCE material, the one-time
//! authorization-code exchange, and refresh-token rotation.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use jukebot_core::BotError;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

/// Scopes the bot needs: queue mutation and playback-state reads.
pub const SCOPES: &[&str] = &["user-modify-playback-state", "user-read-playback-state"];

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    /// Rotated refresh token; absent when the provider keeps the old one.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    error_description: Option<String>,
}

/// PKCE verifier/challenge pair (S256).
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const VERIFIER_LEN: usize = 64;

pub fn generate_pkce() -> Pkce {
    let mut rng = rand::thread_rng();
    let verifier: String = (0..VERIFIER_LEN)
        .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
        .collect();
    let challenge = challenge_for(&verifier);
    Pkce { verifier, challenge }
}

/// URL-safe unpadded base64 of the verifier's SHA-256 digest.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Authorization URL the broadcaster opens in a browser.
pub fn authorize_url(client_id: &str, redirect_uri: &str, challenge: &str) -> String {
    let mut url = reqwest::Url::parse(AUTHORIZE_URL).expect("static url");
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", challenge)
        .append_pair("scope", &SCOPES.join(" "));
    url.to_string()
}

/// One-time authorization-code exchange at the end of the PKCE flow.
pub async fn exchange_code(
    http: &Client,
    client_id: &str,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<TokenResponse> {
    request_token(
        http,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", client_id),
            ("code_verifier", code_verifier),
        ],
    )
    .await
}

/// Exchange a refresh token for a fresh access token. Must be re-invoked
/// strictly before the returned `expires_in` elapses.
pub async fn refresh_access_token(
    http: &Client,
    client_id: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    request_token(
        http,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ],
    )
    .await
}

async fn request_token(http: &Client, form: &[(&str, &str)]) -> Result<TokenResponse> {
    let response = http
        .post(TOKEN_URL)
        .form(form)
        .send()
        .await
        .context("token request failed")?;

    // 4xx means the grant itself was rejected; the credential is dead.
    if response.status().is_client_error() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let description = serde_json::from_str::<TokenErrorBody>(&body)
            .map(|err| err.error_description.unwrap_or(err.error))
            .unwrap_or_else(|_| format!("status {status}"));
        return Err(BotError::CredentialRejected(description).into());
    }

    let response = response.error_for_status().context("token endpoint error")?;
    Ok(response.json().await?)
}

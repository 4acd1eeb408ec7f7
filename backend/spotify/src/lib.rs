pub mod auth;
pub mod client;
pub mod models;

pub use auth::{authorize_url, exchange_code, generate_pkce, Pkce, TokenResponse, SCOPES};
pub use client::SpotifyClient;

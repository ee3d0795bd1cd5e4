//! # Google Login
//!
//! Authorization code flow against Google, done with plain HTTP calls.
//!
//! ## Flow
//! 1. `/auth/google` stores a random state in the `oauth_state` cookie and redirects to Google
//! 2. Google redirects back to the callback with `code` and the same `state`
//! 3. The code is exchanged for an access token, which fetches the OpenID profile
//! 4. The profile is matched to a local account by Google id, then by email, otherwise a new
//!    `user` account without a password is created
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;

use crate::{
    config::GoogleConfig,
    users::{
        find_user_by_email, find_user_by_google_id, find_user_by_username, insert_user, link_google_id,
        NewUser, Role, User,
    },
};

pub const STATE_COOKIE: &str = "oauth_state";

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPE: &str = "openid email profile";

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    #[serde(rename = "sub")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub fn authorize_url(google: &GoogleConfig, state: &str) -> String {
    format!(
        "{AUTHORIZE_URL}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        urlencoding::encode(&google.client_id),
        urlencoding::encode(&google.callback_url),
        urlencoding::encode(SCOPE),
        urlencoding::encode(state),
    )
}

pub async fn fetch_profile(
    http: &reqwest::Client,
    google: &GoogleConfig,
    code: &str,
) -> Result<GoogleProfile, reqwest::Error> {
    let token: TokenResponse = http
        .post(TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", google.callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    http.get(USERINFO_URL)
        .bearer_auth(token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// `base`, then `base_<short_id>`, then `base_<short_id>_2`, `_3`, ... until one is free.
fn unique_username(connection: &Connection, base: String, short_id: &str) -> rusqlite::Result<String> {
    if find_user_by_username(connection, &base)?.is_none() {
        return Ok(base);
    }

    let suffixed = format!("{base}_{short_id}");
    let mut candidate = suffixed.clone();
    let mut n = 2;

    while find_user_by_username(connection, &candidate)?.is_some() {
        candidate = format!("{suffixed}_{n}");
        n += 1;
    }

    Ok(candidate)
}

/// Finds or creates the local account behind a Google profile.
pub fn resolve_identity(connection: &Connection, profile: &GoogleProfile) -> rusqlite::Result<User> {
    if let Some(user) = find_user_by_google_id(connection, &profile.id)? {
        info!("User {} found by Google ID", user.username);
        return Ok(user);
    }

    let email = profile.email.as_deref().unwrap_or_default();

    if let Some(mut user) = find_user_by_email(connection, email)? {
        info!("User {} found by email, linking Google ID", user.username);
        link_google_id(connection, user.user_id, &profile.id)?;
        user.google_id = Some(profile.id.clone());
        return Ok(user);
    }

    let short_id: String = profile.id.chars().take(8).collect();
    let base = match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => format!("user_{short_id}"),
    };
    let username = unique_username(connection, base, &short_id)?;

    let first_name = profile.given_name.clone().unwrap_or_default();
    let last_name = profile.family_name.clone().unwrap_or_default();

    let user_id = insert_user(
        connection,
        &NewUser {
            username: &username,
            password_hash: "",
            first_name: &first_name,
            last_name: &last_name,
            email,
            dob: None,
            phone_number: None,
            role: Role::User,
            google_id: Some(&profile.id),
        },
    )?;
    info!("Created user {username} from Google profile");

    Ok(User {
        user_id,
        username,
        password: String::new(),
        first_name: Some(first_name),
        last_name: Some(last_name),
        email: Some(email.to_string()),
        phone_number: None,
        role: Role::User,
        google_id: Some(profile.id.clone()),
    })
}

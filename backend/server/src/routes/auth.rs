use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tokio::task::spawn_blocking;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    oauth::{authorize_url, fetch_profile, resolve_identity, STATE_COOKIE},
    render::{render, Page},
    session::{end_session, start_session, SessionData},
    state::AppState,
    users::{find_user_by_username, insert_user, username_or_email_taken, NewUser, Role},
};

const BCRYPT_COST: u32 = 10;
const LOGIN_FAILED: &str = r#"<div class="error-message">Username atau password salah.</div>"#;
const OAUTH_STATE_PATH: &str = "/auth/google";

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    username: String,
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    dob: String,
    #[serde(default)]
    phone_number: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// bcrypt is CPU bound, so it runs on the blocking pool instead of a worker thread.
async fn hash_password(password: String) -> Result<String, AppError> {
    Ok(spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await??)
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    Ok(spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}

pub async fn index() -> Redirect {
    Redirect::to("/login")
}

pub async fn login_page() -> Html<String> {
    Html(render(Page::Login, &[("error", "")]))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = {
        let db = state.db.lock().await;
        find_user_by_username(&db, form.username.trim())?
    };

    let verified = match &user {
        Some(user) if !user.password.is_empty() => {
            verify_password(form.password.clone(), user.password.clone()).await?
        }
        _ => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        warn!("Rejected login for {:?}", form.username);
        let html = render(Page::Login, &[("error", LOGIN_FAILED)]);
        return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
    };

    let jar = start_session(&state, jar, SessionData::Member { user_id: user.user_id }).await;
    info!("User {} logged in", user.username);

    Ok((jar, Redirect::to("/dashboard")).into_response())
}

pub async fn register_page() -> Html<String> {
    Html(render(Page::Register, &[]))
}

/// New accounts are always plain users; admins are made from the admin pages or the CLI.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::bad_request("Username dan password wajib diisi."));
    }

    let password_hash = hash_password(form.password.clone()).await?;

    let user_id = {
        let db = state.db.lock().await;

        if username_or_email_taken(&db, username, email)? {
            return Err(AppError::bad_request(
                "Username atau email sudah terdaftar. Silakan pilih yang lain.",
            ));
        }

        insert_user(
            &db,
            &NewUser {
                username,
                password_hash: &password_hash,
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
                email,
                dob: non_empty(&form.dob),
                phone_number: non_empty(&form.phone_number),
                role: Role::User,
                google_id: None,
            },
        )?
    };

    let jar = start_session(&state, jar, SessionData::Member { user_id }).await;
    info!("Registered user {username}");

    Ok((jar, Redirect::to("/dashboard")).into_response())
}

pub async fn guest(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let jar = start_session(&state, jar, SessionData::Guest).await;

    (jar, Redirect::to("/dashboard"))
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let jar = end_session(&state, jar).await;

    (jar, Redirect::to("/login"))
}

pub async fn google_start(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(google) = &state.config.google else {
        warn!("Google login requested but OAuth is not configured");
        return Redirect::to("/login").into_response();
    };

    let csrf = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((STATE_COOKIE, csrf.clone()))
        .path(OAUTH_STATE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.production);

    (jar.add(cookie), Redirect::to(&authorize_url(google, &csrf))).into_response()
}

pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let expected = jar.get(STATE_COOKIE).map(|cookie| cookie.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(OAUTH_STATE_PATH));
    let to_login = |jar: CookieJar| -> Result<Response, AppError> {
        Ok((jar, Redirect::to("/login")).into_response())
    };

    if let Some(error) = &query.error {
        warn!("Google login refused: {error}");
        return to_login(jar);
    }

    let (Some(google), Some(code), Some(returned)) = (&state.config.google, &query.code, &query.state) else {
        return to_login(jar);
    };

    if expected.as_deref() != Some(returned.as_str()) {
        warn!("Google login state mismatch");
        return to_login(jar);
    }

    let profile = match fetch_profile(&state.http, google, code).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Google profile exchange failed: {e}");
            return to_login(jar);
        }
    };

    let user = {
        let db = state.db.lock().await;
        resolve_identity(&db, &profile)?
    };

    let jar = start_session(&state, jar, SessionData::Member { user_id: user.user_id }).await;
    info!("User {} logged in with Google", user.username);

    Ok((jar, Redirect::to("/dashboard")).into_response())
}

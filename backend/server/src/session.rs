//! # Sessions
//!
//! Server-side sessions kept in memory, the browser only holds a random id.
//!
//! Cookies
//! - sid: UUID v4 session id, http-only browser-session cookie; the server forgets it after the
//!   configured TTL (24 hours by default)
//!
//! A session is either a logged-in user (by `user_id`) or a guest. The user row is reloaded
//! on every request, so role changes apply immediately and a deleted user is logged out.
//!
//! ## Extractors
//! - [`Visitor`]: member or guest, anything else is sent to `/login`
//! - [`Member`]: logged-in user only, guests are sent to `/login`
//! - [`Admin`]: logged-in admin only, everyone else gets the 403 access denied page
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    render::{render, Page},
    state::AppState,
    users::{find_user_by_id, User},
};

pub const SESSION_COOKIE: &str = "sid";
pub const GUEST_NAME: &str = "Tamu";
pub const GUEST_ROLE: &str = "guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionData {
    Member { user_id: i64 },
    Guest,
}

struct Entry {
    data: SessionData,
    expires_at: Instant,
}

pub struct Sessions {
    entries: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn create(&self, data: SessionData) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            id,
            Entry {
                data,
                expires_at: now + self.ttl,
            },
        );

        id
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionData> {
        {
            let entries = self.entries.read().await;
            match entries.get(&id) {
                Some(entry) if entry.expires_at > Instant::now() => return Some(entry.data),
                Some(_) => {}
                None => return None,
            }
        }

        self.remove(id).await;
        None
    }

    pub async fn remove(&self, id: Uuid) {
        self.entries.write().await.remove(&id);
    }
}

pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Replaces whatever session the jar carried with a fresh one.
pub async fn start_session(state: &AppState, jar: CookieJar, data: SessionData) -> CookieJar {
    if let Some(old) = session_id(&jar) {
        state.sessions.remove(old).await;
    }

    let id = state.sessions.create(data).await;
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.production);

    jar.add(cookie)
}

pub async fn end_session(state: &AppState, jar: CookieJar) -> CookieJar {
    if let Some(id) = session_id(&jar) {
        state.sessions.remove(id).await;
    }

    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub enum Visitor {
    Member(User),
    Guest,
}

impl Visitor {
    pub fn username(&self) -> &str {
        match self {
            Visitor::Member(user) => &user.username,
            Visitor::Guest => GUEST_NAME,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            Visitor::Member(user) => user.role.as_str(),
            Visitor::Guest => GUEST_ROLE,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Visitor::Guest)
    }
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<Visitor>, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(id) = session_id(&jar) else {
        return Ok(None);
    };

    match state.sessions.get(id).await {
        Some(SessionData::Guest) => Ok(Some(Visitor::Guest)),
        Some(SessionData::Member { user_id }) => {
            let db = state.db.lock().await;
            Ok(find_user_by_id(&db, user_id)?.map(Visitor::Member))
        }
        None => Ok(None),
    }
}

fn to_login() -> Response {
    Redirect::to("/login").into_response()
}

impl FromRequestParts<Arc<AppState>> for Visitor {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(Some(visitor)) => Ok(visitor),
            Ok(None) => Err(to_login()),
            Err(e) => Err(e.into_response()),
        }
    }
}

pub struct Member(pub User);

impl FromRequestParts<Arc<AppState>> for Member {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(Some(Visitor::Member(user))) => Ok(Member(user)),
            Ok(_) => Err(to_login()),
            Err(e) => Err(e.into_response()),
        }
    }
}

pub struct Admin(pub User);

impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(Some(Visitor::Member(user))) if user.is_admin() => Ok(Admin(user)),
            Ok(_) => Err((StatusCode::FORBIDDEN, Html(render(Page::AccessDenied, &[]))).into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_resolve_until_removed() {
        let sessions = Sessions::new(Duration::from_secs(60));
        let member = sessions.create(SessionData::Member { user_id: 7 }).await;
        let guest = sessions.create(SessionData::Guest).await;

        assert_eq!(sessions.get(member).await, Some(SessionData::Member { user_id: 7 }));
        assert_eq!(sessions.get(guest).await, Some(SessionData::Guest));

        sessions.remove(member).await;
        assert_eq!(sessions.get(member).await, None);
        assert_eq!(sessions.get(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let sessions = Sessions::new(Duration::ZERO);
        let id = sessions.create(SessionData::Guest).await;

        assert_eq!(sessions.get(id).await, None);
        assert!(sessions.entries.read().await.is_empty());
    }

    #[test]
    fn session_id_ignores_malformed_cookies() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "not-a-uuid"));
        assert_eq!(session_id(&jar), None);

        let id = Uuid::new_v4();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, id.to_string()));
        assert_eq!(session_id(&jar), Some(id));
    }
}

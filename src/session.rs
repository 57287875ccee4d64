use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use axum::{
    Form,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::AppError;
use crate::history::HistoryLookup;
use crate::models::AdminProfile;
use crate::templates;

pub const SESSION_COOKIE: &str = "session";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Bearer token and profile of a logged-in administrator
///
/// Handed explicitly to every remote call that needs authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    token: String,
    admin: AdminProfile,
}

impl Credential {
    pub fn new(token: impl Into<String>, admin: AdminProfile) -> Self {
        Credential {
            token: token.into(),
            admin,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn admin(&self) -> &AdminProfile {
        &self.admin
    }

    /// Name shown in the page header: the admin's name, then e-mail, then "Admin"
    pub fn display_name(&self) -> &str {
        self.admin
            .name
            .as_deref()
            .or(self.admin.email.as_deref())
            .unwrap_or("Admin")
    }
}

struct Session {
    credential: Credential,
    expires_at: SystemTime,
    lookup: HistoryLookup,
}

/// Server-side sessions keyed by the opaque id kept in the session cookie
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a new session for a logged-in admin.
    ///
    /// Expired sessions are purged on the way.
    ///
    /// # Arguments
    /// * `credential` - Token and profile returned by the remote login
    ///
    /// # Returns
    /// * `String` - A unique session ID for the session cookie
    pub fn create(&self, credential: Credential) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = Session {
            credential,
            expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
            lookup: HistoryLookup::default(),
        };
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, s| s.expires_at > SystemTime::now());
        sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Looks up the credential of a session that has not expired.
    ///
    /// # Arguments
    /// * `session_id` - The session ID from the cookie
    ///
    /// # Returns
    /// * `Option<Credential>` - The credential if the session is valid, None otherwise
    pub fn credential(&self, session_id: &str) -> Option<Credential> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .filter(|s| s.expires_at > SystemTime::now())
            .map(|s| s.credential.clone())
    }

    pub fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id);
    }

    /// Run `f` against the session's barcode lookup
    ///
    /// Returns `None` if the session no longer exists.
    pub fn with_lookup<T>(&self, session_id: &str, f: impl FnOnce(&mut HistoryLookup) -> T) -> Option<T> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.get_mut(session_id).map(|s| f(&mut s.lookup))
    }
}

/// Extractor for admin pages: the session id plus its credential
///
/// Rejects with [`AppError::MissingCredential`] before the handler runs, so
/// no remote call is made without a token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub id: String,
    pub credential: Credential,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::MissingCredential)?;
        let credential = state
            .sessions
            .credential(&id)
            .ok_or(AppError::MissingCredential)?;
        Ok(AdminSession { id, credential })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Serves the login page.
///
/// # Arguments
/// * `query` - `error` carries a message to show above the form
///
/// # Returns
/// * `Result<Html<String>, AppError>` - The rendered login page
pub async fn serve_login_page(Query(query): Query<LoginQuery>) -> Result<Html<String>, AppError> {
    render_login(None, query.error).map(Html)
}

/// Handles admin login.
///
/// Exchanges the submitted credentials for a bearer token at the remote API
/// and keeps the token in a new server-side session.
///
/// # Arguments
/// * `jar` - Request cookies, returned with the session cookie added
/// * `form` - Submitted e-mail and password
///
/// # Returns
/// * `Response` - A redirect to `/admin` on success; otherwise the login page
///   again with 400 for blank input, 401 for rejected credentials or 502 when
///   the remote API cannot be reached
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return login_failure(
            StatusCode::BAD_REQUEST,
            email,
            "Email and password are required".to_string(),
        );
    }

    match state.api.login(email, &form.password).await {
        Ok(login) => {
            let credential = Credential::new(login.token, login.admin);
            log::info!("admin {} logged in", credential.display_name());
            let session_id = state.sessions.create(credential);
            let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
            cookie.set_path("/");
            cookie.set_http_only(true);
            (jar.add(cookie), Redirect::to("/admin")).into_response()
        }
        Err(AppError::Status { status, message }) if status == 400 || status == 401 => {
            login_failure(StatusCode::UNAUTHORIZED, email, message)
        }
        Err(e) => login_failure(StatusCode::BAD_GATEWAY, email, e.to_string()),
    }
}

/// Handle logout: drop the server-side session and clear the cookie
pub async fn handle_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), Redirect::to("/login"))
}

fn login_failure(status: StatusCode, email: &str, message: String) -> Response {
    match render_login(Some(email), Some(message)) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn render_login(email: Option<&str>, error: Option<String>) -> Result<String, AppError> {
    templates::render(
        "login",
        &json!({
            "title": "Admin Login",
            "email": email.unwrap_or_default(),
            "banner": { "loading": false, "error": error },
        }),
    )
}

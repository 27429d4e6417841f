use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::password::{generate_salt, hash_password, verify_password};
use crate::errors::AppError;
use crate::models::user::User;
use crate::session::{session_id_from_headers, SessionStore, SESSION_COOKIE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// GET /
/// Already-authenticated callers are sent straight to the main workflow.
pub async fn login_view(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if current_user(&state, &headers).is_some() {
        return Redirect::to("/summarization").into_response();
    }
    Json(json!({ "message": "Sign in with POST / {username, password}" })).into_response()
}

/// POST /
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user = authenticate(&state.db, &req.username, &req.password).await?;

    // A fresh session on every login; nothing from the anonymous session survives.
    let sid = state.sessions.create();
    state
        .sessions
        .bind_user(sid, user.id)
        .ok_or(AppError::Unauthorized)?;
    tracing::info!(user_id = user.id, "login successful");

    let headers = AppendHeaders([(SET_COOKIE, session_cookie(&state.sessions, sid))]);
    let body = Json(json!({
        "message": "Login successful!",
        "next": "/summarization"
    }));
    Ok((headers, body).into_response())
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(sid) = session_id_from_headers(&headers, &state.sessions) {
        state.sessions.remove(sid);
    }
    let headers = AppendHeaders([(SET_COOKIE, clear_cookie())]);
    (headers, Redirect::to("/")).into_response()
}

/// GET /register
pub async fn register_view(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if current_user(&state, &headers).is_some() {
        return Redirect::to("/summarization").into_response();
    }
    Json(json!({
        "message": "Register with POST /register {username, email, password, confirm_password}"
    }))
    .into_response()
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = req.username.trim().to_string();
    register_user(&state.db, &req).await?;
    Ok(Json(json!({
        "message": format!("Registration for {username} received"),
        "next": "/"
    })))
}

/// Looks up the user and checks the password. Unknown user and hash mismatch
/// fail identically.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match user {
        Some(user) if verify_password(password, &user.password_salt, &user.password_hash) => {
            Ok(user)
        }
        _ => Err(AppError::InvalidCredentials),
    }
}

/// Creates a user row, enforcing the registration form rules and the
/// case-sensitive username/email uniqueness of the store.
pub async fn register_user(pool: &SqlitePool, req: &RegisterRequest) -> Result<i64, AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    // Pre-insert check so the duplicate email gets its dedicated message.
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation(
            "Email is already registered. Please try again.".to_string(),
        ));
    }

    let salt = generate_salt();
    let hash = hash_password(&req.password, &salt);
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, password_salt, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(username)
    .bind(&req.email)
    .bind(&hash)
    .bind(&salt)
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(AppError::Validation(
            "Username or email is already taken".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.message().contains("UNIQUE"))
        .unwrap_or(false)
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn current_user(state: &AppState, headers: &HeaderMap) -> Option<i64> {
    session_id_from_headers(headers, &state.sessions).and_then(|sid| state.sessions.user_id(sid))
}

fn session_cookie(store: &SessionStore, sid: uuid::Uuid) -> String {
    format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400",
        store.cookie_value(sid)
    )
}

fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn req(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
            confirm_password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let pool = test_pool().await;
        register_user(&pool, &req("alice", "alice@example.com"))
            .await
            .unwrap();

        let user = authenticate(&pool, "alice", "hunter2").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_without_new_row() {
        let pool = test_pool().await;
        register_user(&pool, &req("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = register_user(&pool, &req("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = test_pool().await;
        register_user(&pool, &req("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = register_user(&pool, &req("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_password_mismatch_rejected() {
        let pool = test_pool().await;
        let mut request = req("alice", "alice@example.com");
        request.confirm_password = "different".to_string();
        let err = register_user(&pool, &request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_fail_alike() {
        let pool = test_pool().await;
        register_user(&pool, &req("alice", "alice@example.com"))
            .await
            .unwrap();

        let wrong = authenticate(&pool, "alice", "nope").await.unwrap_err();
        let unknown = authenticate(&pool, "mallory", "nope").await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a(at)b.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.co"));
    }
}

//! Authorization interceptor for the guarded routes. Replaces the original
//! design's per-route decorators with one explicit middleware layer.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use crate::session::session_id_from_headers;
use crate::state::AppState;

/// The authenticated caller, injected into request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

/// The verified session id for the current request.
#[derive(Debug, Clone, Copy)]
pub struct SessionId(pub Uuid);

/// Rejects requests without a live, user-bound session by redirecting to the
/// login screen. On success, `CurrentUser` and `SessionId` become available to
/// handlers as extensions.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session_id = session_id_from_headers(request.headers(), &state.sessions);

    let authenticated = session_id.and_then(|sid| {
        state.sessions.user_id(sid).map(|user_id| (sid, user_id))
    });

    match authenticated {
        Some((sid, user_id)) => {
            request.extensions_mut().insert(CurrentUser { id: user_id });
            request.extensions_mut().insert(SessionId(sid));
            next.run(request).await
        }
        None => Redirect::to("/").into_response(),
    }
}

//! Server-side session state, keyed by a uuid carried in a signed cookie.
//!
//! The session holds the authenticated user id plus the two transient
//! workflow buffers: staged annotation results and the replacement queue.
//! Entries expire lazily after [`SESSION_TTL`]; an expired or tampered
//! session is indistinguishable from no session at all.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::article::{PendingReplacement, StagedArticle};

pub const SESSION_COOKIE: &str = "session";
const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Default, Clone)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub staged: Vec<StagedArticle>,
    pub replace_queue: Vec<PendingReplacement>,
}

struct SessionEntry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// Explicitly constructed session store, injected through `AppState`.
#[derive(Clone)]
pub struct SessionStore {
    secret: String,
    ttl: Duration,
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new(secret: String) -> Self {
        Self::with_ttl(secret, Duration::hours(SESSION_TTL_HOURS))
    }

    pub fn with_ttl(secret: String, ttl: Duration) -> Self {
        Self {
            secret,
            ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a fresh, anonymous session and returns its id.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let entry = SessionEntry {
            data: SessionData::default(),
            expires_at: Utc::now() + self.ttl,
        };
        self.inner.write().expect("session lock").insert(id, entry);
        id
    }

    pub fn remove(&self, id: Uuid) {
        self.inner.write().expect("session lock").remove(&id);
    }

    /// Runs `f` against the live session, refreshing its expiry.
    /// Returns `None` for unknown or expired sessions.
    fn with_entry<R>(&self, id: Uuid, f: impl FnOnce(&mut SessionData) -> R) -> Option<R> {
        let mut map = self.inner.write().expect("session lock");
        let expired = match map.get(&id) {
            Some(entry) => entry.expires_at < Utc::now(),
            None => return None,
        };
        if expired {
            map.remove(&id);
            return None;
        }
        let entry = map.get_mut(&id).expect("checked above");
        entry.expires_at = Utc::now() + self.ttl;
        Some(f(&mut entry.data))
    }

    pub fn user_id(&self, id: Uuid) -> Option<i64> {
        self.with_entry(id, |data| data.user_id).flatten()
    }

    pub fn bind_user(&self, id: Uuid, user_id: i64) -> Option<()> {
        self.with_entry(id, |data| {
            data.user_id = Some(user_id);
        })
    }

    pub fn staged(&self, id: Uuid) -> Vec<StagedArticle> {
        self.with_entry(id, |data| data.staged.clone())
            .unwrap_or_default()
    }

    pub fn append_staged(&self, id: Uuid, results: Vec<StagedArticle>) -> Option<()> {
        self.with_entry(id, |data| data.staged.extend(results))
    }

    pub fn replacements(&self, id: Uuid) -> Vec<PendingReplacement> {
        self.with_entry(id, |data| data.replace_queue.clone())
            .unwrap_or_default()
    }

    pub fn set_replacements(&self, id: Uuid, queue: Vec<PendingReplacement>) -> Option<()> {
        self.with_entry(id, |data| data.replace_queue = queue)
    }

    /// Pops the head of the replacement queue, returning it together with the
    /// number of items still pending.
    pub fn pop_replacement(&self, id: Uuid) -> Option<(PendingReplacement, usize)> {
        self.with_entry(id, |data| {
            if data.replace_queue.is_empty() {
                None
            } else {
                let head = data.replace_queue.remove(0);
                Some((head, data.replace_queue.len()))
            }
        })
        .flatten()
    }

    // ── signed cookie codec ────────────────────────────────────────────────

    /// `<uuid>.<sha256(uuid + secret)>`, hex-encoded signature.
    pub fn cookie_value(&self, id: Uuid) -> String {
        format!("{id}.{}", self.sign(&id.to_string()))
    }

    /// Extracts and verifies the session id from a raw cookie value.
    /// A bad signature is treated as no session.
    pub fn parse_cookie_value(&self, raw: &str) -> Option<Uuid> {
        let (id_part, sig) = raw.split_once('.')?;
        if self.sign(id_part) != sig {
            return None;
        }
        Uuid::parse_str(id_part).ok()
    }

    fn sign(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        hasher.update(self.secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Pulls the verified session id out of a request's `Cookie` header.
pub fn session_id_from_headers(
    headers: &axum::http::HeaderMap,
    store: &SessionStore,
) -> Option<Uuid> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE {
            return store.parse_cookie_value(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::article::SentimentLabel;

    fn store() -> SessionStore {
        SessionStore::new("test-secret".to_string())
    }

    fn staged(url: &str) -> StagedArticle {
        StagedArticle {
            url: url.to_string(),
            title: Some("Title".to_string()),
            author: "Author".to_string(),
            date: None,
            summary: "A summary.".to_string(),
            senti_score: 0.9,
            senti_label: SentimentLabel::Positive,
            tags: "one, two".to_string(),
        }
    }

    #[test]
    fn test_bind_and_read_user() {
        let store = store();
        let id = store.create();
        assert_eq!(store.user_id(id), None);
        store.bind_user(id, 7).unwrap();
        assert_eq!(store.user_id(id), Some(7));
    }

    #[test]
    fn test_unknown_session_is_none() {
        let store = store();
        assert_eq!(store.user_id(Uuid::new_v4()), None);
    }

    #[test]
    fn test_expired_session_is_absent() {
        let store = SessionStore::with_ttl("s".to_string(), Duration::hours(-1));
        let id = store.create();
        assert!(store.bind_user(id, 1).is_none());
        assert_eq!(store.user_id(id), None);
        assert!(store.staged(id).is_empty());
    }

    #[test]
    fn test_cookie_roundtrip() {
        let store = store();
        let id = store.create();
        let cookie = store.cookie_value(id);
        assert_eq!(store.parse_cookie_value(&cookie), Some(id));
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let store = store();
        let id = store.create();
        let cookie = store.cookie_value(id);
        let other = Uuid::new_v4();
        let forged = format!("{other}.{}", cookie.split_once('.').unwrap().1);
        assert_eq!(store.parse_cookie_value(&forged), None);
        assert_eq!(store.parse_cookie_value("garbage"), None);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let store = store();
        let id = store.create();
        let cookie = store.cookie_value(id);
        let other = SessionStore::new("other-secret".to_string());
        assert_eq!(other.parse_cookie_value(&cookie), None);
    }

    #[test]
    fn test_staged_results_accumulate() {
        let store = store();
        let id = store.create();
        store
            .append_staged(id, vec![staged("https://a.example/1")])
            .unwrap();
        store
            .append_staged(id, vec![staged("https://a.example/2")])
            .unwrap();
        let staged = store.staged(id);
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[1].url, "https://a.example/2");
    }

    #[test]
    fn test_replacement_queue_pops_in_order() {
        let store = store();
        let id = store.create();
        let queue: Vec<PendingReplacement> = (0..3)
            .map(|i| PendingReplacement {
                new: staged(&format!("https://a.example/{i}")),
                folder_id: 1,
                old_id: i,
            })
            .collect();
        store.set_replacements(id, queue).unwrap();

        let (first, remaining) = store.pop_replacement(id).unwrap();
        assert_eq!(first.old_id, 0);
        assert_eq!(remaining, 2);
        let (second, remaining) = store.pop_replacement(id).unwrap();
        assert_eq!(second.old_id, 1);
        assert_eq!(remaining, 1);
        let (third, remaining) = store.pop_replacement(id).unwrap();
        assert_eq!(third.old_id, 2);
        assert_eq!(remaining, 0);
        assert!(store.pop_replacement(id).is_none());
    }
}

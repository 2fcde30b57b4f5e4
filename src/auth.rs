use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hash a password with a fresh random salt. Stored as `salt$hash`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(stored: &str, provided: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, provided) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

struct Session {
    user_id: Uuid,
    issued: Instant,
}

/// Token-keyed session store with TTL expiry. Kept in process memory and
/// passed to handlers through shared state; sessions do not survive a
/// server restart.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh token bound to the user.
    pub fn issue(&self, user_id: Uuid) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                issued: Instant::now(),
            },
        );
        token
    }

    /// Look up the user behind a token. Expired entries are dropped on the
    /// spot.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(token) {
            Some(session) if session.issued.elapsed() < self.ttl => Some(session.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }

    /// Drop all expired sessions.
    pub fn cleanup(&self) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|_, session| session.issued.elapsed() < self.ttl);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password(&stored, "hunter2"));
        assert!(!verify_password(&stored, "hunter3"));
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("no-salt-separator", "anything"));
    }

    #[test]
    fn issue_and_resolve() {
        let store = SessionStore::new(Duration::from_secs(60));
        let user_id = Uuid::new_v4();
        let token = store.issue(user_id);
        assert_eq!(store.resolve(&token), Some(user_id));
        assert_eq!(store.resolve("not-a-token"), None);
    }

    #[test]
    fn revoked_token_stops_resolving() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.issue(Uuid::new_v4());
        store.revoke(&token);
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn expired_token_stops_resolving() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.issue(Uuid::new_v4());
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn cleanup_drops_expired_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        store.issue(Uuid::new_v4());
        store.issue(Uuid::new_v4());
        store.cleanup();
        assert_eq!(store.len(), 0);
    }
}

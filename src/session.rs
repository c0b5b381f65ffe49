//! Per-browser session table relaying the backend's access/refresh tokens.
//!
//! A session is created from a backend token pair at login and identified by
//! an opaque id stored in a cookie. Reading a session refreshes the access
//! token once its marker has passed. The per-session async lock is held for
//! the duration of the refresh call, so concurrent readers of an expired
//! session wait for the one in-flight refresh instead of starting their own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use uuid::Uuid;

use crate::client::{ApiClient, ClientError};
use crate::core::helpers::now_epoch;
use crate::models::models::{SessionUser, TokenPair};

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch second after which the access token is refreshed.
    pub expires_at: i64,
    /// Epoch second after which the refresh token is no longer usable.
    pub refresh_deadline: i64,
    pub user: SessionUser,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.user.username
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session expired")]
    Expired,

    #[error("token refresh failed: {0}")]
    RefreshFailed(#[from] ClientError),
}

type Slot = Arc<tokio::sync::Mutex<Session>>;

/// Slots busy with a read are kept; that read drops them itself if lapsed.
fn sweep_lapsed(slots: &mut HashMap<String, Slot>, now: i64) {
    slots.retain(|_, slot| match slot.try_lock() {
        Ok(session) => now <= session.refresh_deadline,
        Err(_) => true,
    });
}

pub struct SessionStore {
    slots: Mutex<HashMap<String, Slot>>,
    access_lifetime: i64,
    refresh_lifetime: i64,
}

impl SessionStore {
    pub fn new(access_lifetime: i64, refresh_lifetime: i64) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            access_lifetime,
            refresh_lifetime,
        }
    }

    fn slot(&self, id: &str) -> Option<Slot> {
        self.slots.lock().ok()?.get(id).cloned()
    }

    /// Opens a session for a freshly issued token pair. Sessions whose
    /// refresh token has lapsed are swept out at the same time.
    pub fn start(&self, pair: TokenPair, issued_at: i64) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            access_token: pair.access,
            refresh_token: pair.refresh,
            expires_at: issued_at + self.access_lifetime,
            refresh_deadline: issued_at + self.refresh_lifetime,
            user: pair.user.unwrap_or_default(),
        };
        if let Ok(mut slots) = self.slots.lock() {
            sweep_lapsed(&mut slots, now_epoch());
            slots.insert(session.id.clone(), Arc::new(tokio::sync::Mutex::new(session.clone())));
        }
        session
    }

    pub fn end(&self, id: &str) -> bool {
        self.slots
            .lock()
            .map(|mut slots| slots.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the live session for `id`, refreshing its access token first
    /// when the marker has passed.
    ///
    /// `Ok(None)` means there is no such session. A failed refresh or a lapsed
    /// refresh token drops the session and reports why.
    pub async fn read(&self, id: &str, api: &ApiClient) -> Result<Option<Session>, SessionError> {
        let Some(slot) = self.slot(id) else {
            return Ok(None);
        };
        let mut session = slot.lock().await;

        // Dropped while we waited on a refresh that failed.
        if !self.slot(id).is_some_and(|current| Arc::ptr_eq(&current, &slot)) {
            return Err(SessionError::Expired);
        }

        let now = now_epoch();
        if now > session.refresh_deadline {
            drop(session);
            self.end(id);
            return Err(SessionError::Expired);
        }

        if now > session.expires_at {
            match api.refresh_token(&session.refresh_token).await {
                Ok(fresh) => {
                    session.access_token = fresh.access;
                    if let Some(refresh) = fresh.refresh {
                        session.refresh_token = refresh;
                    }
                    session.expires_at = now_epoch() + self.access_lifetime;
                    log::debug!("refreshed access token for {}", session.user.username);
                }
                Err(err) => {
                    log::warn!("token refresh failed for {}: {}", session.user.username, err);
                    drop(session);
                    self.end(id);
                    return Err(SessionError::RefreshFailed(err));
                }
            }
        }

        Ok(Some(session.clone()))
    }
}

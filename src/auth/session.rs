use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "rtf_session";

/// Payload of the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub sid: Uuid,   // server-side session ID
    pub iat: usize,  // issued at
    pub exp: usize,  // expiration time
    pub iss: String, // issuer
    pub aud: String, // audience
}

#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

/// Live sessions of this process, keyed by session ID.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    pub async fn start(&self, user_id: i64) -> anyhow::Result<Session> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now
            .checked_add(self.ttl)
            .context("session expiry is out of range")?;
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            expires_at,
        };
        let mut map = self.inner.write().await;
        map.retain(|_, s| s.expires_at > now);
        map.insert(session.id, session);
        Ok(session)
    }

    /// Returns the session if it is still live; drops it when expired.
    pub async fn resolve(&self, id: Uuid) -> Option<Session> {
        let now = OffsetDateTime::now_utc();
        let found = self.inner.read().await.get(&id).copied();
        match found {
            Some(s) if s.expires_at > now => Some(s),
            Some(_) => {
                self.inner.write().await.remove(&id);
                None
            }
            None => None,
        }
    }

    pub async fn end(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }

    pub async fn end_all_for(&self, user_id: i64) {
        self.inner.write().await.retain(|_, s| s.user_id != user_id);
    }
}

/// Signing and verification keys for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.session)
    }
}

impl SessionKeys {
    pub fn sign(&self, session: &Session) -> anyhow::Result<String> {
        let claims = Claims {
            sub: session.user_id.to_string(),
            sid: session.id,
            iat: OffsetDateTime::now_utc().unix_timestamp() as usize,
            exp: session.expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = session.user_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

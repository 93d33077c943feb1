use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::session::{SessionKeys, SESSION_COOKIE};
use crate::{cookies, error::AppError, state::AppState, users::repo::StoreError, users::User};

/// The logged-in user behind the request's session cookie.
/// Requests without a live session are redirected to `/login`.
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookies::read(&parts.headers, SESSION_COOKIE).ok_or_else(|| {
            debug!("no session cookie");
            AppError::Unauthenticated
        })?;

        let claims = SessionKeys::from_ref(state).verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            AppError::Unauthenticated
        })?;

        let session = match state.sessions.resolve(claims.sid).await {
            Some(s) if s.user_id.to_string() == claims.sub => s,
            _ => {
                debug!(user_id = %claims.sub, "session no longer live");
                return Err(AppError::Unauthenticated);
            }
        };

        let user = match state.users.get_by_id(session.user_id).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                state.sessions.end(session.id).await;
                return Err(AppError::Unauthenticated);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(CurrentUser {
            user,
            session_id: session.id,
        })
    }
}

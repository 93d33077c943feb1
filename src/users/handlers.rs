use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Html, Response},
    routing::get,
    Router,
};
use tracing::{info, instrument};

use crate::{
    auth::CurrentUser,
    error::AppError,
    flash::{self, Flash},
    state::AppState,
    users::search::{SearchCriteria, SearchParams},
    views,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/buscar", get(search_form))
        .route("/buscar_rivales", get(search_rivals))
        .route("/perfil", get(profile))
        .route("/usuarios", get(list_users))
        .route("/eliminar/:id", get(delete_user))
}

pub async fn search_form(_current: CurrentUser) -> Html<String> {
    Html(views::search_page(&SearchParams::default(), None))
}

#[instrument(skip(state, _current))]
pub async fn search_rivals(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, AppError> {
    let criteria = SearchCriteria::try_from(&params)?;
    let results = state.users.search(&criteria).await?;
    info!(matches = results.len(), filtered = !criteria.is_empty(), "search done");
    Ok(Html(views::search_page(&params, Some(&results))))
}

pub async fn profile(current: CurrentUser, headers: HeaderMap) -> Response {
    let pending = Flash::pending(&headers);
    flash::page(pending, views::profile_page(&current.user, pending))
}

#[instrument(skip(state, _current, headers))]
pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let users = state.users.list_all().await?;
    let pending = Flash::pending(&headers);
    Ok(flash::page(pending, views::users_page(&users, pending)))
}

/// Deletes any user by id. The deleted user's sessions end with it.
#[instrument(skip(state, current), fields(by = current.user.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.users.delete(id).await?;
    state.sessions.end_all_for(id).await;
    info!(user_id = id, "user deleted");
    Ok(Flash::UserDeleted.redirect("/usuarios"))
}

use axum::{
    extract::{FromRef, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{normalize_email, LoginForm, RegisterForm},
        extractors::CurrentUser,
        password::{hash_in_background, verify_in_background},
        session::{SessionKeys, SESSION_COOKIE},
    },
    cookies::{self, SameSite},
    error::AppError,
    flash::{self, Flash},
    state::AppState,
    users::{repo::StoreError, NewUser},
    verification::generate_code,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(show_register))
        .route("/registrar", post(register))
        .route("/login", get(show_login))
        .route("/iniciar_sesion", post(login))
        .route("/logout", get(logout))
}

pub async fn show_register() -> Html<String> {
    Html(views::register_page(None))
}

pub async fn show_login(headers: HeaderMap) -> Response {
    let pending = Flash::pending(&headers);
    flash::page(pending, views::login_page(pending))
}

/// Creates the account, then emails its verification code. A delivery
/// failure is reported inline; the account is kept.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let reg = form.validate().map_err(|e| {
        warn!(error = %e, "invalid registration");
        e
    })?;

    let password_hash = hash_in_background(reg.password).await?;
    let code = generate_code(&mut rand::thread_rng());

    let user = state
        .users
        .create(NewUser {
            name: reg.name,
            email: reg.email,
            password_hash,
            skill: reg.skill,
            location: reg.location,
            age: reg.age,
            gender: reg.gender,
            sport: reg.sport,
            verification_code: code,
        })
        .await
        .map_err(|e| {
            if matches!(e, StoreError::UniqueConstraintViolation) {
                warn!("email already registered");
            }
            AppError::from(e)
        })?;
    info!(user_id = user.id, email = %user.email, "user registered");

    state
        .notifier
        .send_verification_email(&user.email, &user.verification_code)
        .await?;

    Ok(Flash::Registered.redirect("/login"))
}

/// Unknown email and wrong password fail identically, and both pay for one
/// Argon2 verification.
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = normalize_email(&form.email);

    let user = match state.users.get_by_email(&email).await {
        Ok(u) => Some(u),
        Err(StoreError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let matches = verify_in_background(form.password, stored_hash).await?;
    let user = match user {
        Some(u) if matches => u,
        Some(u) => {
            warn!(user_id = u.id, "login invalid password");
            return Err(AppError::Auth);
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Auth);
        }
    };

    let cfg = &state.config.session;
    let max_age = cfg.max_age_secs()?;
    let session = state.sessions.start(user.id).await?;
    let token = SessionKeys::from_ref(&state).sign(&session)?;
    let session_cookie = cookies::build(
        SESSION_COOKIE,
        &token,
        max_age,
        SameSite::Strict,
        cfg.secure_cookie,
    );

    info!(user_id = user.id, "user logged in");
    Ok((
        AppendHeaders([
            (SET_COOKIE, session_cookie),
            (SET_COOKIE, Flash::LoggedIn.cookie()),
        ]),
        Redirect::to("/perfil"),
    )
        .into_response())
}

#[instrument(skip(state, current), fields(user_id = current.user.id))]
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Response {
    state.sessions.end(current.session_id).await;
    info!("user logged out");
    (
        AppendHeaders([
            (SET_COOKIE, cookies::expire(SESSION_COOKIE)),
            (SET_COOKIE, Flash::LoggedOut.cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

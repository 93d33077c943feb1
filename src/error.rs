use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::{
    auth::session::SESSION_COOKIE, cookies, flash::Flash, mail::DeliveryError,
    users::repo::StoreError, views,
};

pub const DELIVERY_FAILED_TEXT: &str =
    "Error sending the verification email. Please contact support.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("email already registered")]
    UniqueConstraintViolation,
    #[error("invalid credentials")]
    Auth,
    #[error("authentication required")]
    Unauthenticated,
    #[error("verification email delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound,
            StoreError::UniqueConstraintViolation => AppError::UniqueConstraintViolation,
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Html(views::message_page("Invalid input", &msg)),
            )
                .into_response(),
            AppError::UniqueConstraintViolation => (
                StatusCode::CONFLICT,
                Html(views::register_page(Some(
                    "An account with this email already exists",
                ))),
            )
                .into_response(),
            AppError::Auth => Flash::BadCredentials.redirect("/login"),
            AppError::Unauthenticated => (
                AppendHeaders([(SET_COOKIE, cookies::expire(SESSION_COOKIE))]),
                Redirect::to("/login"),
            )
                .into_response(),
            AppError::Delivery(e) => {
                error!(error = %e, "error sending verification email");
                (StatusCode::BAD_GATEWAY, Html(DELIVERY_FAILED_TEXT)).into_response()
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(views::message_page("Not found", "That user does not exist.")),
            )
                .into_response(),
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::message_page(
                        "Something went wrong",
                        "Please try again later.",
                    )),
                )
                    .into_response()
            }
        }
    }
}

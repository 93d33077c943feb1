use axum::{
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};

use crate::cookies::{self, SameSite};

pub const FLASH_COOKIE: &str = "rtf_flash";
const FLASH_TTL_SECS: i64 = 60;

/// One-shot notice carried to the next rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Registered,
    LoggedIn,
    BadCredentials,
    LoggedOut,
    UserDeleted,
}

impl Flash {
    const ALL: [Flash; 5] = [
        Flash::Registered,
        Flash::LoggedIn,
        Flash::BadCredentials,
        Flash::LoggedOut,
        Flash::UserDeleted,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Flash::Registered => "registered",
            Flash::LoggedIn => "logged_in",
            Flash::BadCredentials => "bad_credentials",
            Flash::LoggedOut => "logged_out",
            Flash::UserDeleted => "user_deleted",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::Registered => "Account created. Check your email for the verification code.",
            Flash::LoggedIn => "Logged in successfully",
            Flash::BadCredentials => "Incorrect email or password",
            Flash::LoggedOut => "Session closed",
            Flash::UserDeleted => "User deleted",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Reads the pending flash, if any. Unknown keys are ignored.
    pub fn pending(headers: &HeaderMap) -> Option<Self> {
        cookies::read(headers, FLASH_COOKIE).and_then(|k| Self::from_key(&k))
    }

    pub fn cookie(self) -> String {
        cookies::build(FLASH_COOKIE, self.key(), FLASH_TTL_SECS, SameSite::Lax, false)
    }

    /// Sets this flash and redirects with 303.
    pub fn redirect(self, to: &str) -> Response {
        (AppendHeaders([(SET_COOKIE, self.cookie())]), Redirect::to(to)).into_response()
    }
}

/// Renders a page that consumed `flash`, clearing the cookie when one was shown.
pub fn page(flash: Option<Flash>, html: String) -> Response {
    match flash {
        Some(_) => (
            AppendHeaders([(SET_COOKIE, cookies::expire(FLASH_COOKIE))]),
            Html(html),
        )
            .into_response(),
        None => Html(html).into_response(),
    }
}

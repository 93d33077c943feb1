use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;

/// Form body of `/registrar`. Fields default to empty so missing ones
/// surface as validation errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub skill: String,
    #[serde(default)]
    pub location: String,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub sport: Option<String>,
}

/// Form body of `/iniciar_sesion`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A registration that passed validation; the password is still plain text.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub skill: String,
    pub location: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub sport: Option<String>,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(value: String, field: &str) -> Result<String, AppError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RegisterForm {
    pub fn validate(self) -> Result<Registration, AppError> {
        let name = required(self.name, "Name")?;
        let email = normalize_email(&required(self.email, "Email")?);
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Email is not valid".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }
        let skill = required(self.skill, "Skill")?;
        let location = required(self.location, "Location")?;
        let age = match optional(self.age) {
            Some(a) => match a.parse::<i32>() {
                Ok(n) if (0..=150).contains(&n) => Some(n),
                _ => return Err(AppError::Validation("Age must be between 0 and 150".into())),
            },
            None => None,
        };
        Ok(Registration {
            name,
            email,
            password: self.password,
            skill,
            location,
            age,
            gender: optional(self.gender),
            sport: optional(self.sport),
        })
    }
}

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use super::repo_types::User;
use crate::error::AppError;

/// Raw query-string parameters of `/buscar_rivales`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub location: Option<String>,
    pub skill: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub sport: Option<String>,
}

/// AND of every present criterion; an empty set matches everyone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub location: Option<String>,
    pub skill: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub sport: Option<String>,
}

fn present(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl TryFrom<&SearchParams> for SearchCriteria {
    type Error = AppError;

    fn try_from(p: &SearchParams) -> Result<Self, Self::Error> {
        let age = match present(&p.age) {
            Some(a) => Some(
                a.parse::<i32>()
                    .map_err(|_| AppError::Validation("Age must be a whole number".into()))?,
            ),
            None => None,
        };
        Ok(Self {
            location: present(&p.location),
            skill: present(&p.skill),
            age,
            gender: present(&p.gender),
            sport: present(&p.sport),
        })
    }
}

impl SearchCriteria {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// In-process evaluation, same semantics as [`SearchCriteria::push_where`].
    pub fn matches(&self, user: &User) -> bool {
        fn eq(want: &Option<String>, have: Option<&str>) -> bool {
            want.as_deref().map_or(true, |w| have == Some(w))
        }
        eq(&self.location, Some(&user.location))
            && eq(&self.skill, Some(&user.skill))
            && self.age.map_or(true, |a| user.age == Some(a))
            && eq(&self.gender, user.gender.as_deref())
            && eq(&self.sport, user.sport.as_deref())
    }

    /// Appends a `WHERE` clause with bound parameters to `qb`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(location) = &self.location {
            qb.push(" AND location = ").push_bind(location.clone());
        }
        if let Some(skill) = &self.skill {
            qb.push(" AND skill = ").push_bind(skill.clone());
        }
        if let Some(age) = self.age {
            qb.push(" AND age = ").push_bind(age);
        }
        if let Some(gender) = &self.gender {
            qb.push(" AND gender = ").push_bind(gender.clone());
        }
        if let Some(sport) = &self.sport {
            qb.push(" AND sport = ").push_bind(sport.clone());
        }
    }
}

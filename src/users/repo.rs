use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::repo_types::{NewUser, User};
use super::search::SearchCriteria;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email already registered")]
    UniqueConstraintViolation,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::UniqueConstraintViolation
            }
            other => StoreError::Database(other),
        }
    }
}

/// Persistent table of users. Every call is a single round trip.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, skill, location, age, gender, sport, verification_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, email, password_hash, skill, location, age, gender, sport,
                      verification_code, created_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.skill)
        .bind(user.location)
        .bind(user.age)
        .bind(user.gender)
        .bind(user.sport)
        .bind(user.verification_code)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, skill, location, age, gender, sport,
                   verification_code, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, skill, location, age, gender, sport,
                   verification_code, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, skill, location, age, gender, sport,
                   verification_code, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<User>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, name, email, password_hash, skill, location, age, gender, sport, \
             verification_code, created_at FROM users",
        );
        criteria.push_where(&mut qb);
        qb.push(" ORDER BY id");
        let rows = qb.build_query_as::<User>().fetch_all(&self.db).await?;
        Ok(rows)
    }
}

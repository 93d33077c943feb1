use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User};
use super::search::SearchCriteria;

/// In-process store with the same contract as the Postgres one.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<User>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.rows.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueConstraintViolation);
        }
        inner.next_id += 1;
        let row = User {
            id: inner.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            skill: user.skill,
            location: user.location,
            age: user.age,
            gender: user.gender,
            sport: user.sport,
            verification_code: user.verification_code,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner
            .rows
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.rows.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|u| u.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .filter(|u| criteria.matches(u))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, location: &str, skill: &str) -> NewUser {
        NewUser {
            name: "Player".into(),
            email: email.into(),
            password_hash: "hash".into(),
            skill: skill.into(),
            location: location.into(),
            age: None,
            gender: None,
            sport: None,
            verification_code: "AB12CD".into(),
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let store = MemoryUserStore::default();
        let a = store.create(new_user("a@x.com", "Madrid", "tennis")).await.unwrap();
        let b = store.create(new_user("b@x.com", "Madrid", "tennis")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.get_by_email("b@x.com").await.unwrap().id, b.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_second_row() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@x.com", "Madrid", "tennis")).await.unwrap();
        let err = store
            .create(new_user("a@x.com", "Sevilla", "chess"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueConstraintViolation));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_row_and_reports_missing_ids() {
        let store = MemoryUserStore::default();
        let a = store.create(new_user("a@x.com", "Madrid", "tennis")).await.unwrap();
        let b = store.create(new_user("b@x.com", "Madrid", "tennis")).await.unwrap();

        store.delete(a.id).await.unwrap();
        let ids: Vec<i64> = store.list_all().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![b.id]);
        assert!(matches!(store.get_by_id(a.id).await, Err(StoreError::NotFound)));

        assert!(matches!(store.delete(999).await, Err(StoreError::NotFound)));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_narrows_to_intersection() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@x.com", "Madrid", "tennis")).await.unwrap();
        store.create(new_user("b@x.com", "Madrid", "chess")).await.unwrap();
        store.create(new_user("c@x.com", "Sevilla", "tennis")).await.unwrap();

        let all = store.search(&SearchCriteria::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let madrid = SearchCriteria {
            location: Some("Madrid".into()),
            ..Default::default()
        };
        let found = store.search(&madrid).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|u| u.location == "Madrid"));

        let both = SearchCriteria {
            skill: Some("tennis".into()),
            ..madrid
        };
        let found = store.search(&both).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "a@x.com");
    }
}

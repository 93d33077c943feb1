use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::mail::{SmtpNotifier, VerificationNotifier};
use crate::users::repo::{PgUserStore, UserStore};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionStore,
    pub notifier: Arc<dyn VerificationNotifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let notifier = Arc::new(SmtpNotifier::new(&config.mail).context("configure smtp relay")?)
            as Arc<dyn VerificationNotifier>;
        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;

        Ok(Self::from_parts(config, users, notifier))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn VerificationNotifier>,
    ) -> Self {
        let sessions = SessionStore::new(time::Duration::seconds(
            config.session.ttl_minutes.saturating_mul(60),
        ));
        Self {
            config,
            users,
            sessions,
            notifier,
        }
    }
}

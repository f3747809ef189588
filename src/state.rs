use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
    identity::IdentityVerifier,
    notifications::Notifier,
    storage::BlobStore,
};

/// Everything a workflow needs, handed to each handler through axum state.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt_secret: Arc<str>,
    pub notifier: Arc<dyn Notifier>,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            orm: create_orm_conn(&pool),
            pool,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            notifier,
            blobs,
            identity,
        }
    }
}

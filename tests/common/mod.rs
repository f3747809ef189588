#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum_booking_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::business::CreateBusinessRequest,
    entity::users::ActiveModel as UserActive,
    identity::{ExternalIdentity, IdentityError, IdentityVerifier},
    middleware::auth::AuthUser,
    models::Role,
    notifications::{NotifyError, Notifier, PushMessage},
    services::business_service,
    state::AppState,
    storage::{BlobStore, StorageError, UploadedFile},
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use uuid::Uuid;

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<PushMessage>>,
}

impl RecordingNotifier {
    pub fn sent_to(&self, address: &str) -> Vec<PushMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == address)
            .cloned()
            .collect()
    }

    /// Notifications go out on a spawned task; poll briefly for them.
    pub async fn wait_for(&self, address: &str, count: usize) -> Vec<PushMessage> {
        for _ in 0..50 {
            let sent = self.sent_to(address);
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent_to(address)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(
        &self,
        folder: &str,
        owner: Uuid,
        file: &UploadedFile,
    ) -> Result<String, StorageError> {
        let url = format!("memory://{folder}/{owner}/{}", file.file_name);
        self.blobs
            .lock()
            .unwrap()
            .insert(url.clone(), file.bytes.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.blobs.lock().unwrap().remove(url);
        Ok(())
    }
}

/// Accepts exactly one token and answers with a fixed identity.
pub struct StaticIdentityVerifier {
    pub token: String,
    pub identity: ExternalIdentity,
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, identity_token: &str) -> Result<ExternalIdentity, IdentityError> {
        if identity_token == self.token {
            Ok(self.identity.clone())
        } else {
            Err(IdentityError::InvalidToken("unexpected token".into()))
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub blobs: Arc<MemoryBlobStore>,
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        apple_client_id: None,
        upload_dir: PathBuf::from("target/test-uploads"),
        public_base_url: "http://localhost".into(),
        expo_push_url: "http://localhost/push".into(),
        expo_access_token: None,
        max_upload_bytes: 1024 * 1024,
        request_timeout_secs: 5,
    }
}

pub fn state_with(
    pool: sqlx::PgPool,
    config: &AppConfig,
    identity: Arc<dyn IdentityVerifier>,
) -> TestApp {
    let notifier = Arc::new(RecordingNotifier::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let state = AppState::new(pool, config, notifier.clone(), blobs.clone(), identity);
    TestApp {
        state,
        notifier,
        blobs,
    }
}

/// Connect to `TEST_DATABASE_URL`; `None` means the test should be skipped.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    setup_with_identity(Arc::new(StaticIdentityVerifier {
        token: "unused".into(),
        identity: ExternalIdentity {
            subject: "unused".into(),
            email: None,
        },
    }))
    .await
}

pub async fn setup_with_identity(
    identity: Arc<dyn IdentityVerifier>,
) -> anyhow::Result<Option<TestApp>> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test: set TEST_DATABASE_URL to run database-backed tests.");
        return Ok(None);
    };
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    Ok(Some(state_with(pool, &test_config(&database_url), identity)))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: Role, name: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        last_name: Set(None),
        email: Set(unique_email(name)),
        password_hash: Set(None),
        role: Set(Some(role.as_str().to_string())),
        apple_id: Set(None),
        push_token: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: Some(role),
    })
}

pub async fn set_push_token(state: &AppState, user: &AuthUser, token: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET push_token = $1 WHERE id = $2")
        .bind(token)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;
    Ok(())
}

/// A business with a "Hair" category holding Cut (30 min, 20) and Wash (10 min, 5).
pub async fn create_salon(state: &AppState, owner: &AuthUser) -> anyhow::Result<Uuid> {
    let request: CreateBusinessRequest = serde_json::from_value(serde_json::json!({
        "name": "Fade Room",
        "tag": "barber",
        "phone_number": "+34 600 000 000",
        "coordinates": { "latitude": 41.39, "longitude": 2.17, "location": "Barcelona" },
        "staff": [{ "name": "Ana" }],
        "categories": [{
            "title": "Hair",
            "services": [
                { "title": "Cut", "time": 30, "price": 20, "description": "Scissor cut" },
                { "title": "Wash", "time": 10, "price": "5" }
            ]
        }]
    }))?;
    let business = request.validate()?;
    let created = business_service::create_business(state, owner, business, vec![], vec![])
        .await?
        .data
        .expect("created business");
    Ok(created.business_id)
}

pub async fn count(state: &AppState, sql: &str, id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as(sql).bind(id).fetch_one(&state.pool).await?;
    Ok(n)
}

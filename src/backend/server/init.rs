/**
 * Server Initialization
 *
 * Wires the engines to their stores and the router to the engines.
 *
 * # Initialization Process
 *
 * 1. Open the database when `DATABASE_URL` is configured, otherwise fall
 *    back to the in-memory stores
 * 2. Build the Auth, Invite and Content engines around the stores, the
 *    system clock and one tracing span each
 * 3. Create the router
 * 4. Start the housekeeping task
 */

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use crate::backend::auth::ledger::{PgLoginAttemptLedger, PgTokenLedger};
use crate::backend::auth::service::{AuthService, AuthStores};
use crate::backend::auth::users::PgUserRepository;
use crate::backend::clock::{Clock, SystemClock};
use crate::backend::content::files::{FileStore, LocalFileStore};
use crate::backend::content::service::ContentService;
use crate::backend::content::{ContentCatalog, ContentStore, ContentType, PgContentStore};
use crate::backend::invites::model::{InviteRepository, PgInviteRepository};
use crate::backend::invites::service::InviteService;
use crate::backend::middleware::ClientIpSource;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::housekeeping;
use crate::backend::server::state::AppState;
use crate::backend::store::memory::{
    MemoryContentStore, MemoryFileStore, MemoryInviteRepository, MemoryLoginAttemptLedger, MemoryTokenLedger,
    MemoryUserRepository,
};
use crate::shared::AppConfig;

/// Every persistence port the engines need
#[derive(Clone)]
pub struct Stores {
    pub auth: AuthStores,
    pub invites: Arc<dyn InviteRepository>,
    pub notes: Arc<dyn ContentStore>,
    pub pdfs: Arc<dyn ContentStore>,
    pub files: Arc<dyn FileStore>,
}

impl Stores {
    /// Process-local stores; everything is lost on exit
    pub fn memory() -> Self {
        Self {
            auth: AuthStores {
                users: Arc::new(MemoryUserRepository::new()),
                tokens: Arc::new(MemoryTokenLedger::new()),
                attempts: Arc::new(MemoryLoginAttemptLedger::new()),
            },
            invites: Arc::new(MemoryInviteRepository::new()),
            notes: Arc::new(MemoryContentStore::new(ContentType::Note)),
            pdfs: Arc::new(MemoryContentStore::new(ContentType::Pdf)),
            files: Arc::new(MemoryFileStore::new()),
        }
    }

    /// Database-backed stores; uploaded files go under `pdf_dir`
    pub fn postgres(pool: &PgPool, pdf_dir: &Path) -> Self {
        Self {
            auth: AuthStores {
                users: Arc::new(PgUserRepository::new(pool.clone())),
                tokens: Arc::new(PgTokenLedger::new(pool.clone())),
                attempts: Arc::new(PgLoginAttemptLedger::new(pool.clone())),
            },
            invites: Arc::new(PgInviteRepository::new(pool.clone())),
            notes: Arc::new(PgContentStore::new(pool.clone(), ContentType::Note)),
            pdfs: Arc::new(PgContentStore::new(pool.clone(), ContentType::Pdf)),
            files: Arc::new(LocalFileStore::new(pdf_dir)),
        }
    }
}

/// Build the router state from stores and a clock
///
/// Tests pass in-memory stores and a manual clock here; the server passes
/// whatever [`create_app`] selected and the system clock.
pub fn build_state(
    config: &AppConfig,
    stores: Stores,
    clock: Arc<dyn Clock>,
    db_pool: Option<PgPool>,
) -> AppState {
    let content = ContentCatalog::new(stores.notes, stores.pdfs);

    let auth = AuthService::new(
        stores.auth,
        clock.clone(),
        &config.auth,
        tracing::info_span!("auth"),
    );
    let invites = InviteService::new(
        stores.invites.clone(),
        content.clone(),
        clock.clone(),
        tracing::info_span!("invites"),
    );
    let content = ContentService::new(
        content,
        stores.invites,
        stores.files,
        clock,
        tracing::info_span!("content"),
    );

    AppState {
        auth: Arc::new(auth),
        invites: Arc::new(invites),
        content: Arc::new(content),
        client_ip_source: ClientIpSource::from_trust(config.trust_proxy_headers),
        db_pool,
    }
}

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails only when `DATABASE_URL` is set and the pool cannot be opened.
pub async fn create_app(config: &AppConfig) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("Initializing noteshare backend server");

    let db_pool = match config.database_url.as_deref() {
        Some(url) => Some(load_database(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set. Using in-memory stores; data will not survive a restart.");
            None
        }
    };

    let stores = match &db_pool {
        Some(pool) => Stores::postgres(pool, &config.pdf_storage_dir),
        None => Stores::memory(),
    };

    let app_state = build_state(config, stores, Arc::new(SystemClock), db_pool);
    let app = create_router(app_state.clone());

    housekeeping::spawn(app_state.auth.clone(), config.housekeeping_interval);

    tracing::info!(
        interval_secs = config.housekeeping_interval.as_secs(),
        trust_proxy_headers = config.trust_proxy_headers,
        "Router configured with periodic housekeeping task"
    );

    Ok(app)
}

/**
 * Application State Management
 *
 * `AppState` is the router state: the two engines, the content service
 * (whose catalog serves the normal read path), the client address policy,
 * and the database pool when one is configured.
 * Everything is behind `Arc`, so cloning the state per request is cheap.
 *
 * The `FromRef` implementations let handlers extract just the part they use,
 * e.g. `State(auth): State<Arc<AuthService>>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::auth::service::AuthService;
use crate::backend::content::service::ContentService;
use crate::backend::content::ContentCatalog;
use crate::backend::invites::service::InviteService;
use crate::backend::middleware::ClientIpSource;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub invites: Arc<InviteService>,
    pub content: Arc<ContentService>,
    pub client_ip_source: ClientIpSource,
    /// `None` when running on in-memory stores
    pub db_pool: Option<PgPool>,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<InviteService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.invites.clone()
    }
}

impl FromRef<AppState> for Arc<ContentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.content.clone()
    }
}

impl FromRef<AppState> for ContentCatalog {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.content.catalog().clone()
    }
}

impl FromRef<AppState> for ClientIpSource {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.client_ip_source
    }
}

use axum::Router;
use std::sync::Arc;

use crate::webserver::state::AppState;

pub mod status;
pub mod webhooks;
pub mod ws;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(ws::routes())
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(webhooks::routes())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::DashboardConfig;
    use crate::dashboard::testing::FakeProvider;
    use crate::dashboard::DashboardService;
    use crate::store::IncidentStore;
    use crate::webserver::state::AppState;

    pub fn state() -> (Arc<AppState>, Arc<FakeProvider>) {
        let provider = FakeProvider::new();
        let dashboard = DashboardService::new(DashboardConfig::default(), provider.clone());
        let store = IncidentStore::open_in_memory().unwrap();
        (Arc::new(AppState::new(dashboard, store, 16)), provider)
    }
}

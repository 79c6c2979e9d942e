use routes::create_router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::services::{
    market_data::fx_rates::{EcbRateSource, RateSource},
    shared::env::Settings,
    storage::RateStore,
};

pub mod errors;
pub mod handlers;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<RateStore>,
    pub source: Arc<dyn RateSource>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store = RateStore::from_settings(&settings)?;
        let source = EcbRateSource::from_settings(&settings);
        Ok(AppState {
            settings: Arc::new(settings),
            store: Arc::new(store),
            source: Arc::new(source),
        })
    }
}

pub async fn api(settings: Settings) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let router = create_router(AppState::from_settings(settings)?);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    Ok(axum::serve(listener, router.into_make_service()).await?)
}

use std::sync::Arc;

use sharetrip_service::{PgStore, SharetripService, Stores};
use sharetrip_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SharetripService>,
}
impl AppState {
	pub async fn new(config: sharetrip_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let store = PgStore::new(db);
		let service = SharetripService::new(config, Stores::shared(Arc::new(store)));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: SharetripService) -> Self {
		Self { service: Arc::new(service) }
	}
}

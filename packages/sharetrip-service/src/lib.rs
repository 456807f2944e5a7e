pub mod booking;
pub mod compatibility;
pub mod search;
pub mod store;

mod error;

pub use booking::{BookingRequest, BookingResult, StatusUpdateRequest};
pub use compatibility::{CompatibilityScore, Personalization};
pub use error::{ConflictKind, Error, Result};
pub use search::{SearchRequest, SearchResponse, TourMatch};
pub use store::{memory::InMemoryStore, postgres::PgStore};

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;
use uuid::Uuid;

use sharetrip_config::{Config, GroupFillPricing};
use sharetrip_domain::{
	booking::{Booking, BookingStatus},
	profile::{EmbeddingOwner, UserPreferenceProfile},
	tour::TourSnapshot,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a store needs to admit one booking inside its per-tour critical section.
#[derive(Clone, Debug)]
pub struct BookingDraft {
	pub tour_id: Uuid,
	pub traveler_id: Uuid,
	pub headcount: u32,
	pub pricing: Option<GroupFillPricing>,
	pub now: OffsetDateTime,
}

/// Tour catalog and booking ledger.
pub trait TourStore
where
	Self: Send + Sync,
{
	/// Active share trips, each read together with its fill counts.
	fn eligible_tours<'a>(&'a self) -> BoxFuture<'a, Result<Vec<TourSnapshot>>>;

	fn tour<'a>(&'a self, tour_id: Uuid) -> BoxFuture<'a, Result<Option<TourSnapshot>>>;

	fn booking<'a>(&'a self, booking_id: Uuid) -> BoxFuture<'a, Result<Option<Booking>>>;

	/// Re-reads the ledger, runs the admission check and persists the booking as one step that no
	/// other commit on the same tour can interleave with.
	fn commit_booking<'a>(&'a self, draft: &'a BookingDraft) -> BoxFuture<'a, Result<Booking>>;

	/// Compare-and-set on the booking status. `None` means the booking no longer has `expected`.
	fn update_booking_status<'a>(
		&'a self,
		booking_id: Uuid,
		expected: BookingStatus,
		next: BookingStatus,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Booking>>>;
}

pub trait PreferenceSource
where
	Self: Send + Sync,
{
	fn profile<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<UserPreferenceProfile>>>;
}

pub trait EmbeddingSource
where
	Self: Send + Sync,
{
	fn embedding<'a>(
		&'a self,
		owner: EmbeddingOwner,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Vec<f32>>>>;

	/// Missing owners are simply absent from the map.
	fn embeddings<'a>(
		&'a self,
		owner: EmbeddingOwner,
		owner_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Stores {
	pub tours: Arc<dyn TourStore>,
	pub preferences: Arc<dyn PreferenceSource>,
	pub embeddings: Arc<dyn EmbeddingSource>,
}
impl Stores {
	pub fn new(
		tours: Arc<dyn TourStore>,
		preferences: Arc<dyn PreferenceSource>,
		embeddings: Arc<dyn EmbeddingSource>,
	) -> Self {
		Self { tours, preferences, embeddings }
	}

	/// Uses one backend for all three roles.
	pub fn shared<S>(store: Arc<S>) -> Self
	where
		S: TourStore + PreferenceSource + EmbeddingSource + 'static,
	{
		Self { tours: store.clone(), preferences: store.clone(), embeddings: store }
	}
}

pub struct SharetripService {
	pub cfg: Config,
	pub stores: Stores,
}
impl SharetripService {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		Self { cfg, stores }
	}
}

//! Process-local backend. Each tour owns a mutex over its row and ledger, which makes that mutex
//! the single writer for the tour's seats.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, RwLock},
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{BookingDraft, BoxFuture, EmbeddingSource, Error, PreferenceSource, Result, TourStore};
use sharetrip_domain::{
	booking::{Booking, BookingStatus},
	capacity::{self, FillSnapshot},
	profile::{EmbeddingOwner, UserPreferenceProfile},
	tour::{Tour, TourSnapshot, TourStatus},
};

struct TourEntry {
	tour: Tour,
	ledger: Vec<Booking>,
}
impl TourEntry {
	fn snapshot(&self) -> TourSnapshot {
		TourSnapshot { tour: self.tour.clone(), fill: FillSnapshot::from_ledger(&self.ledger) }
	}
}

#[derive(Default)]
pub struct InMemoryStore {
	tours: RwLock<HashMap<Uuid, Arc<Mutex<TourEntry>>>>,
	booking_tours: RwLock<HashMap<Uuid, Uuid>>,
	profiles: RwLock<HashMap<Uuid, UserPreferenceProfile>>,
	embeddings: RwLock<HashMap<(EmbeddingOwner, Uuid), Vec<f32>>>,
}
impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a tour. An existing ledger is kept.
	pub fn upsert_tour(&self, tour: Tour) {
		let mut tours = self.tours.write().unwrap_or_else(|err| err.into_inner());

		match tours.get(&tour.tour_id) {
			Some(entry) => entry.lock().unwrap_or_else(|err| err.into_inner()).tour = tour,
			None => {
				tours.insert(
					tour.tour_id,
					Arc::new(Mutex::new(TourEntry { tour, ledger: Vec::new() })),
				);
			},
		}
	}

	pub fn set_tour_status(&self, tour_id: Uuid, status: TourStatus) -> bool {
		let Some(entry) = self.entry(tour_id) else {
			return false;
		};

		entry.lock().unwrap_or_else(|err| err.into_inner()).tour.status = status;

		true
	}

	/// Seeds a booking without admission checks.
	pub fn insert_booking(&self, booking: Booking) -> Result<()> {
		let entry = self.entry(booking.tour_id).ok_or_else(|| Error::NotFound {
			message: format!("Tour {} does not exist.", booking.tour_id),
		})?;

		self.booking_tours
			.write()
			.unwrap_or_else(|err| err.into_inner())
			.insert(booking.booking_id, booking.tour_id);
		entry.lock().unwrap_or_else(|err| err.into_inner()).ledger.push(booking);

		Ok(())
	}

	pub fn upsert_profile(&self, profile: UserPreferenceProfile) {
		self.profiles.write().unwrap_or_else(|err| err.into_inner()).insert(profile.user_id, profile);
	}

	pub fn upsert_embedding(&self, owner: EmbeddingOwner, owner_id: Uuid, vector: Vec<f32>) {
		self.embeddings
			.write()
			.unwrap_or_else(|err| err.into_inner())
			.insert((owner, owner_id), vector);
	}

	fn entry(&self, tour_id: Uuid) -> Option<Arc<Mutex<TourEntry>>> {
		self.tours.read().unwrap_or_else(|err| err.into_inner()).get(&tour_id).cloned()
	}

	fn commit(&self, draft: &BookingDraft) -> Result<Booking> {
		let entry = self.entry(draft.tour_id).ok_or_else(|| Error::NotFound {
			message: format!("Tour {} does not exist.", draft.tour_id),
		})?;
		let mut entry = entry.lock().unwrap_or_else(|err| err.into_inner());
		let admission = capacity::admit(
			&entry.tour,
			&entry.ledger,
			draft.traveler_id,
			draft.headcount,
			draft.pricing.as_ref(),
		)?;
		let booking = Booking {
			booking_id: Uuid::new_v4(),
			tour_id: draft.tour_id,
			traveler_id: draft.traveler_id,
			headcount: draft.headcount,
			price_at_booking: admission.price_at_booking,
			currency: entry.tour.currency.clone(),
			status: admission.status,
			created_at: draft.now,
			updated_at: draft.now,
		};

		self.booking_tours
			.write()
			.unwrap_or_else(|err| err.into_inner())
			.insert(booking.booking_id, booking.tour_id);
		entry.ledger.push(booking.clone());

		Ok(booking)
	}

	fn compare_and_set(
		&self,
		booking_id: Uuid,
		expected: BookingStatus,
		next: BookingStatus,
		now: OffsetDateTime,
	) -> Option<Booking> {
		let tour_id =
			*self.booking_tours.read().unwrap_or_else(|err| err.into_inner()).get(&booking_id)?;
		let entry = self.entry(tour_id)?;
		let mut entry = entry.lock().unwrap_or_else(|err| err.into_inner());
		let booking = entry
			.ledger
			.iter_mut()
			.find(|booking| booking.booking_id == booking_id && booking.status == expected)?;

		booking.status = next;
		booking.updated_at = now;

		Some(booking.clone())
	}
}

impl TourStore for InMemoryStore {
	fn eligible_tours<'a>(&'a self) -> BoxFuture<'a, Result<Vec<TourSnapshot>>> {
		Box::pin(async move {
			let entries = self
				.tours
				.read()
				.unwrap_or_else(|err| err.into_inner())
				.values()
				.cloned()
				.collect::<Vec<_>>();
			let snapshots = entries
				.iter()
				.map(|entry| entry.lock().unwrap_or_else(|err| err.into_inner()).snapshot())
				.filter(|snapshot| snapshot.tour.is_eligible())
				.collect::<Vec<_>>();

			Ok(snapshots)
		})
	}

	fn tour<'a>(&'a self, tour_id: Uuid) -> BoxFuture<'a, Result<Option<TourSnapshot>>> {
		Box::pin(async move {
			Ok(self
				.entry(tour_id)
				.map(|entry| entry.lock().unwrap_or_else(|err| err.into_inner()).snapshot()))
		})
	}

	fn booking<'a>(&'a self, booking_id: Uuid) -> BoxFuture<'a, Result<Option<Booking>>> {
		Box::pin(async move {
			let tour_id = self
				.booking_tours
				.read()
				.unwrap_or_else(|err| err.into_inner())
				.get(&booking_id)
				.copied();
			let Some(entry) = tour_id.and_then(|tour_id| self.entry(tour_id)) else {
				return Ok(None);
			};
			let entry = entry.lock().unwrap_or_else(|err| err.into_inner());

			Ok(entry.ledger.iter().find(|booking| booking.booking_id == booking_id).cloned())
		})
	}

	fn commit_booking<'a>(&'a self, draft: &'a BookingDraft) -> BoxFuture<'a, Result<Booking>> {
		Box::pin(async move { self.commit(draft) })
	}

	fn update_booking_status<'a>(
		&'a self,
		booking_id: Uuid,
		expected: BookingStatus,
		next: BookingStatus,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Booking>>> {
		Box::pin(async move { Ok(self.compare_and_set(booking_id, expected, next, now)) })
	}
}

impl PreferenceSource for InMemoryStore {
	fn profile<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<UserPreferenceProfile>>> {
		Box::pin(async move {
			Ok(self.profiles.read().unwrap_or_else(|err| err.into_inner()).get(&user_id).cloned())
		})
	}
}

impl EmbeddingSource for InMemoryStore {
	fn embedding<'a>(
		&'a self,
		owner: EmbeddingOwner,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
		Box::pin(async move {
			Ok(self
				.embeddings
				.read()
				.unwrap_or_else(|err| err.into_inner())
				.get(&(owner, owner_id))
				.cloned())
		})
	}

	fn embeddings<'a>(
		&'a self,
		owner: EmbeddingOwner,
		owner_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, Vec<f32>>>> {
		Box::pin(async move {
			let embeddings = self.embeddings.read().unwrap_or_else(|err| err.into_inner());

			Ok(owner_ids
				.iter()
				.filter_map(|owner_id| {
					embeddings.get(&(owner, *owner_id)).map(|vector| (*owner_id, vector.clone()))
				})
				.collect())
		})
	}
}

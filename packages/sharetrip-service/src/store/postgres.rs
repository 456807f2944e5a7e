//! Postgres backend. Booking commits lock the tour row, so every admission for a tour runs after
//! the previous one has committed or rolled back.

use std::collections::HashMap;

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{BookingDraft, BoxFuture, EmbeddingSource, Error, PreferenceSource, Result, TourStore};
use sharetrip_domain::{
	booking::{Booking, BookingStatus},
	capacity::{self, FillSnapshot},
	profile::{EmbeddingOwner, UserPreferenceProfile},
	tour::{CancellationPolicy, Tour, TourCategory, TourSnapshot, TourStatus},
};
use sharetrip_storage::{
	bookings,
	db::Db,
	embeddings,
	models::{BookingRow, PreferenceRow, TourFillRow, TourRow},
	preferences, tours,
};

#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { pool: db.pool }
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	pub async fn insert_tour(&self, tour: &Tour) -> Result<()> {
		tours::insert_tour(&self.pool, &tour_to_row(tour)?).await?;

		Ok(())
	}

	pub async fn upsert_profile(&self, profile: &UserPreferenceProfile) -> Result<()> {
		let row = PreferenceRow {
			user_id: profile.user_id,
			cities: profile.cities.clone(),
			countries: profile.countries.clone(),
			budget_min: profile.budget_min,
			budget_max: profile.budget_max,
			languages: profile.languages.clone(),
			travel_styles: profile.travel_styles.clone(),
			accessibility: profile.accessibility.clone(),
			min_host_rating: profile.min_host_rating,
			instant_book_only: profile.instant_book_only,
			updated_at: OffsetDateTime::now_utc(),
		};

		preferences::upsert_profile(&self.pool, &row).await?;

		Ok(())
	}

	pub async fn upsert_embedding(
		&self,
		owner: EmbeddingOwner,
		owner_id: Uuid,
		vector: Vec<f32>,
	) -> Result<()> {
		let row = sharetrip_storage::models::EmbeddingRow {
			owner_type: owner.as_str().to_string(),
			owner_id,
			vec: vector,
			updated_at: OffsetDateTime::now_utc(),
		};

		embeddings::upsert_embedding(&self.pool, &row).await?;

		Ok(())
	}

	async fn commit(&self, draft: &BookingDraft) -> Result<Booking> {
		let mut tx = self.pool.begin().await?;
		let tour = tours::lock_tour(&mut *tx, draft.tour_id).await?.ok_or_else(|| {
			Error::NotFound { message: format!("Tour {} does not exist.", draft.tour_id) }
		})?;
		let tour = tour_from_row(tour)?;
		let ledger = bookings::ledger_for_tour(&mut *tx, draft.tour_id)
			.await?
			.into_iter()
			.map(booking_from_row)
			.collect::<Result<Vec<_>>>()?;
		let admission = capacity::admit(
			&tour,
			&ledger,
			draft.traveler_id,
			draft.headcount,
			draft.pricing.as_ref(),
		)?;
		let booking = Booking {
			booking_id: Uuid::new_v4(),
			tour_id: tour.tour_id,
			traveler_id: draft.traveler_id,
			headcount: draft.headcount,
			price_at_booking: admission.price_at_booking,
			currency: tour.currency.clone(),
			status: admission.status,
			created_at: draft.now,
			updated_at: draft.now,
		};

		bookings::insert_booking(&mut *tx, &booking_to_row(&booking)?).await?;
		tx.commit().await?;

		Ok(booking)
	}
}

impl TourStore for PgStore {
	fn eligible_tours<'a>(&'a self) -> BoxFuture<'a, Result<Vec<TourSnapshot>>> {
		Box::pin(async move {
			tours::list_eligible_with_fill(&self.pool)
				.await?
				.into_iter()
				.map(snapshot_from_row)
				.collect()
		})
	}

	fn tour<'a>(&'a self, tour_id: Uuid) -> BoxFuture<'a, Result<Option<TourSnapshot>>> {
		Box::pin(async move {
			tours::get_with_fill(&self.pool, tour_id).await?.map(snapshot_from_row).transpose()
		})
	}

	fn booking<'a>(&'a self, booking_id: Uuid) -> BoxFuture<'a, Result<Option<Booking>>> {
		Box::pin(async move {
			bookings::get_booking(&self.pool, booking_id).await?.map(booking_from_row).transpose()
		})
	}

	fn commit_booking<'a>(&'a self, draft: &'a BookingDraft) -> BoxFuture<'a, Result<Booking>> {
		Box::pin(self.commit(draft))
	}

	fn update_booking_status<'a>(
		&'a self,
		booking_id: Uuid,
		expected: BookingStatus,
		next: BookingStatus,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Booking>>> {
		Box::pin(async move {
			bookings::update_status_if(
				&self.pool,
				booking_id,
				expected.as_str(),
				next.as_str(),
				now,
			)
			.await?
			.map(booking_from_row)
			.transpose()
		})
	}
}

impl PreferenceSource for PgStore {
	fn profile<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<UserPreferenceProfile>>> {
		Box::pin(async move {
			let row = preferences::get_profile(&self.pool, user_id).await?;

			Ok(row.map(|row| UserPreferenceProfile {
				user_id: row.user_id,
				cities: row.cities,
				countries: row.countries,
				budget_min: row.budget_min,
				budget_max: row.budget_max,
				languages: row.languages,
				travel_styles: row.travel_styles,
				accessibility: row.accessibility,
				min_host_rating: row.min_host_rating,
				instant_book_only: row.instant_book_only,
			}))
		})
	}
}

impl EmbeddingSource for PgStore {
	fn embedding<'a>(
		&'a self,
		owner: EmbeddingOwner,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
		Box::pin(async move {
			let row = embeddings::get_embedding(&self.pool, owner.as_str(), owner_id).await?;

			Ok(row.map(|row| row.vec))
		})
	}

	fn embeddings<'a>(
		&'a self,
		owner: EmbeddingOwner,
		owner_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, Vec<f32>>>> {
		Box::pin(async move {
			let rows = embeddings::get_embeddings(&self.pool, owner.as_str(), owner_ids).await?;

			Ok(rows.into_iter().map(|row| (row.owner_id, row.vec)).collect())
		})
	}
}

fn snapshot_from_row(row: TourFillRow) -> Result<TourSnapshot> {
	let fill = FillSnapshot {
		confirmed_headcount: to_u32("confirmed_headcount", row.confirmed_headcount)?,
		pending_headcount: to_u32("pending_headcount", row.pending_headcount)?,
	};

	Ok(TourSnapshot { tour: tour_from_row(row.tour)?, fill })
}

fn tour_from_row(row: TourRow) -> Result<Tour> {
	Ok(Tour {
		tour_id: row.tour_id,
		host_id: row.host_id,
		title: row.title,
		city: row.city,
		country: row.country,
		start_times: row.start_times,
		duration_mins: to_u32("duration_mins", row.duration_mins)?,
		base_price: row.base_price,
		currency: row.currency,
		min_group: to_u32("min_group", row.min_group)?,
		max_group: to_u32("max_group", row.max_group)?,
		target_count: row.target_count.map(|value| to_u32("target_count", value)).transpose()?,
		languages: row.languages,
		travel_styles: row.travel_styles,
		accessibility: row.accessibility,
		cancellation_policy: CancellationPolicy::parse(&row.cancellation_policy)
			.ok_or_else(|| corrupt("cancellation_policy", &row.cancellation_policy))?,
		instant_book: row.instant_book,
		early_bird_until: row.early_bird_until,
		pay_what_you_want: row.pay_what_you_want,
		category: TourCategory::parse(&row.category)
			.ok_or_else(|| corrupt("category", &row.category))?,
		status: TourStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?,
		host_rating: row.host_rating,
		created_at: row.created_at,
	})
}

fn tour_to_row(tour: &Tour) -> Result<TourRow> {
	Ok(TourRow {
		tour_id: tour.tour_id,
		host_id: tour.host_id,
		title: tour.title.clone(),
		city: tour.city.clone(),
		country: tour.country.clone(),
		start_times: tour.start_times.clone(),
		duration_mins: to_i32("duration_mins", tour.duration_mins)?,
		base_price: tour.base_price,
		currency: tour.currency.clone(),
		min_group: to_i32("min_group", tour.min_group)?,
		max_group: to_i32("max_group", tour.max_group)?,
		target_count: tour.target_count.map(|value| to_i32("target_count", value)).transpose()?,
		languages: tour.languages.clone(),
		travel_styles: tour.travel_styles.clone(),
		accessibility: tour.accessibility.clone(),
		cancellation_policy: tour.cancellation_policy.as_str().to_string(),
		instant_book: tour.instant_book,
		early_bird_until: tour.early_bird_until,
		pay_what_you_want: tour.pay_what_you_want,
		category: tour.category.as_str().to_string(),
		status: tour.status.as_str().to_string(),
		host_rating: tour.host_rating,
		created_at: tour.created_at,
		updated_at: tour.created_at,
	})
}

fn booking_from_row(row: BookingRow) -> Result<Booking> {
	Ok(Booking {
		booking_id: row.booking_id,
		tour_id: row.tour_id,
		traveler_id: row.traveler_id,
		headcount: to_u32("headcount", row.headcount)?,
		price_at_booking: row.price_at_booking,
		currency: row.currency,
		status: BookingStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?,
		created_at: row.created_at,
		updated_at: row.updated_at,
	})
}

fn booking_to_row(booking: &Booking) -> Result<BookingRow> {
	Ok(BookingRow {
		booking_id: booking.booking_id,
		tour_id: booking.tour_id,
		traveler_id: booking.traveler_id,
		headcount: to_i32("headcount", booking.headcount)?,
		price_at_booking: booking.price_at_booking,
		currency: booking.currency.clone(),
		status: booking.status.as_str().to_string(),
		created_at: booking.created_at,
		updated_at: booking.updated_at,
	})
}

fn to_u32<T>(column: &str, value: T) -> Result<u32>
where
	T: Copy + std::fmt::Display + TryInto<u32>,
{
	value.try_into().map_err(|_| corrupt(column, &value.to_string()))
}

fn to_i32(field: &str, value: u32) -> Result<i32> {
	i32::try_from(value).map_err(|_| Error::invalid_at(&format!("$.{field}"), "is out of range."))
}

fn corrupt(column: &str, value: &str) -> Error {
	Error::Storage { message: format!("Column {column} holds an unexpected value '{value}'.") }
}

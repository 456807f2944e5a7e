use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TourRow {
	pub tour_id: Uuid,
	pub host_id: Uuid,
	pub title: String,
	pub city: String,
	pub country: String,
	pub start_times: Vec<OffsetDateTime>,
	pub duration_mins: i32,
	pub base_price: f64,
	pub currency: String,
	pub min_group: i32,
	pub max_group: i32,
	pub target_count: Option<i32>,
	pub languages: Vec<String>,
	pub travel_styles: Vec<String>,
	pub accessibility: Vec<String>,
	pub cancellation_policy: String,
	pub instant_book: bool,
	pub early_bird_until: Option<OffsetDateTime>,
	pub pay_what_you_want: bool,
	pub category: String,
	pub status: String,
	pub host_rating: f32,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// A tour row and the seat totals of its ledger, read in one statement.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TourFillRow {
	#[sqlx(flatten)]
	pub tour: TourRow,
	pub confirmed_headcount: i64,
	pub pending_headcount: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct BookingRow {
	pub booking_id: Uuid,
	pub tour_id: Uuid,
	pub traveler_id: Uuid,
	pub headcount: i32,
	pub price_at_booking: f64,
	pub currency: String,
	pub status: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PreferenceRow {
	pub user_id: Uuid,
	pub cities: Vec<String>,
	pub countries: Vec<String>,
	pub budget_min: Option<f64>,
	pub budget_max: Option<f64>,
	pub languages: Vec<String>,
	pub travel_styles: Vec<String>,
	pub accessibility: Vec<String>,
	pub min_host_rating: Option<f32>,
	pub instant_book_only: bool,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EmbeddingRow {
	pub owner_type: String,
	pub owner_id: Uuid,
	pub vec: Vec<f32>,
	pub updated_at: OffsetDateTime,
}

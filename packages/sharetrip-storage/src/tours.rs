use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Result,
	models::{TourFillRow, TourRow},
};

const TOUR_COLUMNS: &str = "\
	t.tour_id,
	t.host_id,
	t.title,
	t.city,
	t.country,
	t.start_times,
	t.duration_mins,
	t.base_price,
	t.currency,
	t.min_group,
	t.max_group,
	t.target_count,
	t.languages,
	t.travel_styles,
	t.accessibility,
	t.cancellation_policy,
	t.instant_book,
	t.early_bird_until,
	t.pay_what_you_want,
	t.category,
	t.status,
	t.host_rating,
	t.created_at,
	t.updated_at";

const FILL_COLUMNS: &str = "\
	COALESCE(SUM(b.headcount) FILTER (WHERE b.status = 'confirmed'), 0)::BIGINT AS confirmed_headcount,
	COALESCE(SUM(b.headcount) FILTER (WHERE b.status = 'pending'), 0)::BIGINT AS pending_headcount";

pub async fn insert_tour<'e, E>(executor: E, tour: &TourRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO tours (
	tour_id,
	host_id,
	title,
	city,
	country,
	start_times,
	duration_mins,
	base_price,
	currency,
	min_group,
	max_group,
	target_count,
	languages,
	travel_styles,
	accessibility,
	cancellation_policy,
	instant_book,
	early_bird_until,
	pay_what_you_want,
	category,
	status,
	host_rating,
	created_at,
	updated_at
)
VALUES (
	$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
	$13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
)",
	)
	.bind(tour.tour_id)
	.bind(tour.host_id)
	.bind(tour.title.as_str())
	.bind(tour.city.as_str())
	.bind(tour.country.as_str())
	.bind(&tour.start_times)
	.bind(tour.duration_mins)
	.bind(tour.base_price)
	.bind(tour.currency.as_str())
	.bind(tour.min_group)
	.bind(tour.max_group)
	.bind(tour.target_count)
	.bind(&tour.languages)
	.bind(&tour.travel_styles)
	.bind(&tour.accessibility)
	.bind(tour.cancellation_policy.as_str())
	.bind(tour.instant_book)
	.bind(tour.early_bird_until)
	.bind(tour.pay_what_you_want)
	.bind(tour.category.as_str())
	.bind(tour.status.as_str())
	.bind(tour.host_rating)
	.bind(tour.created_at)
	.bind(tour.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Active share trips with their seat totals. Each row is one consistent read of tour and ledger.
pub async fn list_eligible_with_fill<'e, E>(executor: E) -> Result<Vec<TourFillRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
{TOUR_COLUMNS},
{FILL_COLUMNS}
FROM tours t
LEFT JOIN bookings b ON b.tour_id = t.tour_id
WHERE t.status = 'active' AND t.category = 'share_trip'
GROUP BY t.tour_id
ORDER BY t.tour_id"
	);
	let rows = sqlx::query_as::<_, TourFillRow>(&sql).fetch_all(executor).await?;

	Ok(rows)
}

pub async fn get_with_fill<'e, E>(executor: E, tour_id: Uuid) -> Result<Option<TourFillRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
{TOUR_COLUMNS},
{FILL_COLUMNS}
FROM tours t
LEFT JOIN bookings b ON b.tour_id = t.tour_id
WHERE t.tour_id = $1
GROUP BY t.tour_id"
	);
	let row = sqlx::query_as::<_, TourFillRow>(&sql).bind(tour_id).fetch_optional(executor).await?;

	Ok(row)
}

/// Locks the tour row for the rest of the transaction. Every booking commit for the tour goes
/// through this lock, which serializes capacity checks per tour.
pub async fn lock_tour<'e, E>(executor: E, tour_id: Uuid) -> Result<Option<TourRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
{TOUR_COLUMNS}
FROM tours t
WHERE t.tour_id = $1
FOR UPDATE"
	);
	let row = sqlx::query_as::<_, TourRow>(&sql).bind(tour_id).fetch_optional(executor).await?;

	Ok(row)
}

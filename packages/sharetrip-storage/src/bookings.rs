use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, models::BookingRow};

const UNIQUE_VIOLATION: &str = "23505";

pub async fn ledger_for_tour<'e, E>(executor: E, tour_id: Uuid) -> Result<Vec<BookingRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, BookingRow>(
		"\
SELECT
	booking_id,
	tour_id,
	traveler_id,
	headcount,
	price_at_booking,
	currency,
	status,
	created_at,
	updated_at
FROM bookings
WHERE tour_id = $1
ORDER BY created_at, booking_id",
	)
	.bind(tour_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn get_booking<'e, E>(executor: E, booking_id: Uuid) -> Result<Option<BookingRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, BookingRow>(
		"\
SELECT
	booking_id,
	tour_id,
	traveler_id,
	headcount,
	price_at_booking,
	currency,
	status,
	created_at,
	updated_at
FROM bookings
WHERE booking_id = $1",
	)
	.bind(booking_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn insert_booking<'e, E>(executor: E, booking: &BookingRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO bookings (
	booking_id,
	tour_id,
	traveler_id,
	headcount,
	price_at_booking,
	currency,
	status,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
	)
	.bind(booking.booking_id)
	.bind(booking.tour_id)
	.bind(booking.traveler_id)
	.bind(booking.headcount)
	.bind(booking.price_at_booking)
	.bind(booking.currency.as_str())
	.bind(booking.status.as_str())
	.bind(booking.created_at)
	.bind(booking.updated_at)
	.execute(executor)
	.await;

	match result {
		Ok(_) => Ok(()),
		Err(sqlx::Error::Database(err)) if err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
			Err(Error::Conflict(format!(
				"Traveler {} already holds an active booking on tour {}.",
				booking.traveler_id, booking.tour_id
			))),
		Err(err) => Err(err.into()),
	}
}

/// Moves a booking to `next` only if it is still in `expected`. Returns `None` when the booking
/// is missing or its status changed underneath the caller. `price_at_booking` is never written.
pub async fn update_status_if<'e, E>(
	executor: E,
	booking_id: Uuid,
	expected: &str,
	next: &str,
	now: OffsetDateTime,
) -> Result<Option<BookingRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, BookingRow>(
		"\
UPDATE bookings
SET
	status = $1,
	updated_at = $2
WHERE booking_id = $3 AND status = $4
RETURNING
	booking_id,
	tour_id,
	traveler_id,
	headcount,
	price_at_booking,
	currency,
	status,
	created_at,
	updated_at",
	)
	.bind(next)
	.bind(now)
	.bind(booking_id)
	.bind(expected)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

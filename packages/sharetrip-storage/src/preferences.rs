use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Result, models::PreferenceRow};

pub async fn get_profile<'e, E>(executor: E, user_id: Uuid) -> Result<Option<PreferenceRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, PreferenceRow>(
		"\
SELECT
	user_id,
	cities,
	countries,
	budget_min,
	budget_max,
	languages,
	travel_styles,
	accessibility,
	min_host_rating,
	instant_book_only,
	updated_at
FROM user_preferences
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn upsert_profile<'e, E>(executor: E, profile: &PreferenceRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO user_preferences (
	user_id,
	cities,
	countries,
	budget_min,
	budget_max,
	languages,
	travel_styles,
	accessibility,
	min_host_rating,
	instant_book_only,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (user_id)
DO UPDATE
SET
	cities = EXCLUDED.cities,
	countries = EXCLUDED.countries,
	budget_min = EXCLUDED.budget_min,
	budget_max = EXCLUDED.budget_max,
	languages = EXCLUDED.languages,
	travel_styles = EXCLUDED.travel_styles,
	accessibility = EXCLUDED.accessibility,
	min_host_rating = EXCLUDED.min_host_rating,
	instant_book_only = EXCLUDED.instant_book_only,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(profile.user_id)
	.bind(&profile.cities)
	.bind(&profile.countries)
	.bind(profile.budget_min)
	.bind(profile.budget_max)
	.bind(&profile.languages)
	.bind(&profile.travel_styles)
	.bind(&profile.accessibility)
	.bind(profile.min_host_rating)
	.bind(profile.instant_book_only)
	.bind(profile.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

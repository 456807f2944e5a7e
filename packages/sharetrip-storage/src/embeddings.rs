use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Error, Result, models::EmbeddingRow};

const OWNER_TYPES: [&str; 2] = ["USER", "TOUR"];

pub async fn get_embedding<'e, E>(
	executor: E,
	owner_type: &str,
	owner_id: Uuid,
) -> Result<Option<EmbeddingRow>>
where
	E: PgExecutor<'e>,
{
	check_owner_type(owner_type)?;

	let row = sqlx::query_as::<_, EmbeddingRow>(
		"\
SELECT owner_type, owner_id, vec, updated_at
FROM embeddings
WHERE owner_type = $1 AND owner_id = $2",
	)
	.bind(owner_type)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn get_embeddings<'e, E>(
	executor: E,
	owner_type: &str,
	owner_ids: &[Uuid],
) -> Result<Vec<EmbeddingRow>>
where
	E: PgExecutor<'e>,
{
	check_owner_type(owner_type)?;

	if owner_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, EmbeddingRow>(
		"\
SELECT owner_type, owner_id, vec, updated_at
FROM embeddings
WHERE owner_type = $1 AND owner_id = ANY($2)",
	)
	.bind(owner_type)
	.bind(owner_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn upsert_embedding<'e, E>(executor: E, embedding: &EmbeddingRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	check_owner_type(embedding.owner_type.as_str())?;

	sqlx::query(
		"\
INSERT INTO embeddings (owner_type, owner_id, vec, updated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (owner_type, owner_id)
DO UPDATE
SET
	vec = EXCLUDED.vec,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(embedding.owner_type.as_str())
	.bind(embedding.owner_id)
	.bind(&embedding.vec)
	.bind(embedding.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

fn check_owner_type(owner_type: &str) -> Result<()> {
	if OWNER_TYPES.contains(&owner_type) {
		Ok(())
	} else {
		Err(Error::InvalidArgument(format!("Unknown embedding owner type '{owner_type}'.")))
	}
}

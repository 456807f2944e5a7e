pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_tours.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_tours.sql")),
				"tables/002_bookings.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_bookings.sql")),
				"tables/003_user_preferences.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_user_preferences.sql")),
				"tables/004_embeddings.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_embeddings.sql")),
				_ => {},
			}

			out.push('\n');

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use crate::schema::render_schema;

	#[test]
	fn schema_expands_every_table() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir"));

		for table in ["tours", "bookings", "user_preferences", "embeddings"] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
				"missing table {table}"
			);
		}

		assert!(sql.contains("uq_bookings_active_traveler"));
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{env} is not a valid Postgres DSN: {source}")]
	InvalidDsn { env: &'static str, source: sqlx::Error },
	#[error("No admin database (postgres, template1) accepted a connection: {source}")]
	AdminUnavailable { source: sqlx::Error },
	#[error("Failed to {action} test database {name}: {source}")]
	Lifecycle { action: &'static str, name: String, source: sqlx::Error },
}

//! Disposable Postgres databases for the ignored integration tests.
//!
//! Each [`TestDatabase`] lives on the server named by `SHARETRIP_PG_DSN` and is dropped again on
//! [`TestDatabase::cleanup`] or, failing that, when the value goes out of scope.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use sharetrip_config::{Config, Matching, Postgres, Pricing, Search, Service, Storage};

pub const DSN_ENV: &str = "SHARETRIP_PG_DSN";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|source| Error::InvalidDsn { env: DSN_ENV, source })?;
		let (admin, mut conn) = connect_admin(&base).await?;
		let name = format!("sharetrip_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|source| Error::Lifecycle { action: "create", name: name.clone(), source })?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin, dropped: false })
	}

	/// Storage settings pointing at this database.
	pub fn postgres(&self, pool_max_conns: u32) -> Postgres {
		Postgres { dsn: self.dsn.clone(), pool_max_conns }
	}

	/// A complete service config backed by this database, with default search, pricing and
	/// matching sections.
	pub fn config(&self, pool_max_conns: u32) -> Config {
		Config {
			service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
			storage: Storage { postgres: self.postgres(pool_max_conns) },
			search: Search::default(),
			pricing: Pricing::default(),
			matching: Matching::default(),
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.admin).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let admin = self.admin.clone();
		// The async runtime driving the test may already be shutting down, so cleanup gets its own.
		let worker = thread::spawn(move || {
			let outcome = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| err.to_string())
				.and_then(|runtime| {
					runtime.block_on(drop_database(&name, &admin)).map_err(|err| err.to_string())
				});

			if let Err(err) = outcome {
				eprintln!("Leaked test database {name}: {err}");
			}
		});
		let _ = worker.join();
	}
}

/// `None` when the ignored Postgres tests should skip.
pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

async fn connect_admin(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::AdminUnavailable {
		source: last_err.unwrap_or_else(|| sqlx::Error::Protocol("no admin database tried".into())),
	})
}

async fn drop_database(name: &str, admin: &PgConnectOptions) -> Result<()> {
	let lifecycle = |source| Error::Lifecycle { action: "drop", name: name.to_string(), source };
	let mut conn = PgConnection::connect_with(admin).await.map_err(lifecycle)?;

	// Pools from the test may still hold sessions.
	sqlx::query(
		"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await
	.map_err(lifecycle)?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await.map_err(lifecycle)?;

	Ok(())
}

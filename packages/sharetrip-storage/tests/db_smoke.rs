use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

use sharetrip_storage::{
	Error,
	bookings,
	db::Db,
	embeddings,
	models::{BookingRow, EmbeddingRow, PreferenceRow, TourRow},
	preferences, tours,
};
use sharetrip_testkit::TestDatabase;

fn sample_tour(tour_id: Uuid, status: &str, category: &str) -> TourRow {
	let now = datetime!(2026-10-01 09:00 UTC);

	TourRow {
		tour_id,
		host_id: Uuid::new_v4(),
		title: "Old town food walk".to_string(),
		city: "Lisbon".to_string(),
		country: "Portugal".to_string(),
		start_times: vec![datetime!(2026-11-02 10:00 UTC)],
		duration_mins: 180,
		base_price: 100.0,
		currency: "EUR".to_string(),
		min_group: 2,
		max_group: 8,
		target_count: None,
		languages: vec!["English".to_string()],
		travel_styles: vec!["foodie".to_string()],
		accessibility: Vec::new(),
		cancellation_policy: "flexible".to_string(),
		instant_book: true,
		early_bird_until: None,
		pay_what_you_want: false,
		category: category.to_string(),
		status: status.to_string(),
		host_rating: 4.8,
		created_at: now,
		updated_at: now,
	}
}

fn sample_booking(tour_id: Uuid, traveler_id: Uuid, headcount: i32, status: &str) -> BookingRow {
	let now = OffsetDateTime::now_utc();

	BookingRow {
		booking_id: Uuid::new_v4(),
		tour_id,
		traveler_id,
		headcount,
		price_at_booking: 100.0 * f64::from(headcount),
		currency: "EUR".to_string(),
		status: status.to_string(),
		created_at: now,
		updated_at: now,
	}
}

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let db = Db::connect(&test_db.postgres(2)).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SHARETRIP_PG_DSN to run."]
async fn db_connects_and_bootstraps_twice() {
	let Some(base_dsn) = sharetrip_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps_twice; set SHARETRIP_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema().await.expect("Schema bootstrap must be repeatable.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name IN ('tours', 'bookings', 'user_preferences', 'embeddings')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 4);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SHARETRIP_PG_DSN to run."]
async fn eligible_listing_reports_fill_from_ledger() {
	let Some(base_dsn) = sharetrip_testkit::env_dsn() else {
		eprintln!(
			"Skipping eligible_listing_reports_fill_from_ledger; set SHARETRIP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let active = sample_tour(Uuid::new_v4(), "active", "share_trip");
	let paused = sample_tour(Uuid::new_v4(), "paused", "share_trip");
	let private = sample_tour(Uuid::new_v4(), "active", "private");

	for tour in [&active, &paused, &private] {
		tours::insert_tour(&db.pool, tour).await.expect("Failed to insert tour.");
	}

	bookings::insert_booking(
		&db.pool,
		&sample_booking(active.tour_id, Uuid::new_v4(), 3, "confirmed"),
	)
	.await
	.expect("Failed to insert booking.");
	bookings::insert_booking(&db.pool, &sample_booking(active.tour_id, Uuid::new_v4(), 2, "pending"))
		.await
		.expect("Failed to insert booking.");
	bookings::insert_booking(
		&db.pool,
		&sample_booking(active.tour_id, Uuid::new_v4(), 4, "cancelled"),
	)
	.await
	.expect("Failed to insert booking.");

	let rows = tours::list_eligible_with_fill(&db.pool).await.expect("Failed to list tours.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].tour.tour_id, active.tour_id);
	assert_eq!(rows[0].confirmed_headcount, 3);
	assert_eq!(rows[0].pending_headcount, 2);

	let paused_row = tours::get_with_fill(&db.pool, paused.tour_id)
		.await
		.expect("Failed to read tour.")
		.expect("Expected paused tour to exist.");

	assert_eq!(paused_row.confirmed_headcount, 0);
	assert_eq!(paused_row.tour.status, "paused");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SHARETRIP_PG_DSN to run."]
async fn active_booking_per_traveler_is_unique() {
	let Some(base_dsn) = sharetrip_testkit::env_dsn() else {
		eprintln!(
			"Skipping active_booking_per_traveler_is_unique; set SHARETRIP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let tour = sample_tour(Uuid::new_v4(), "active", "share_trip");
	let traveler_id = Uuid::new_v4();

	tours::insert_tour(&db.pool, &tour).await.expect("Failed to insert tour.");

	let first = sample_booking(tour.tour_id, traveler_id, 2, "pending");

	bookings::insert_booking(&db.pool, &first).await.expect("Failed to insert first booking.");

	let duplicate = bookings::insert_booking(
		&db.pool,
		&sample_booking(tour.tour_id, traveler_id, 1, "confirmed"),
	)
	.await;

	assert!(matches!(duplicate, Err(Error::Conflict(_))), "Unexpected result: {duplicate:?}");

	let cancelled = bookings::update_status_if(
		&db.pool,
		first.booking_id,
		"pending",
		"cancelled",
		OffsetDateTime::now_utc(),
	)
	.await
	.expect("Failed to update status.")
	.expect("Expected the pending booking to move.");

	assert_eq!(cancelled.status, "cancelled");
	assert_eq!(cancelled.price_at_booking, first.price_at_booking);

	bookings::insert_booking(&db.pool, &sample_booking(tour.tour_id, traveler_id, 1, "pending"))
		.await
		.expect("A cancelled booking must not block a new one.");

	let stale = bookings::update_status_if(
		&db.pool,
		first.booking_id,
		"pending",
		"confirmed",
		OffsetDateTime::now_utc(),
	)
	.await
	.expect("Failed to run conditional update.");

	assert!(stale.is_none());
	assert_eq!(
		bookings::ledger_for_tour(&db.pool, tour.tour_id).await.expect("Failed to read ledger.").len(),
		2
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SHARETRIP_PG_DSN to run."]
async fn preferences_and_embeddings_upsert() {
	let Some(base_dsn) = sharetrip_testkit::env_dsn() else {
		eprintln!("Skipping preferences_and_embeddings_upsert; set SHARETRIP_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let user_id = Uuid::new_v4();
	let mut profile = PreferenceRow {
		user_id,
		cities: vec!["Lisbon".to_string()],
		countries: Vec::new(),
		budget_min: Some(20.0),
		budget_max: Some(120.0),
		languages: vec!["English".to_string()],
		travel_styles: Vec::new(),
		accessibility: Vec::new(),
		min_host_rating: None,
		instant_book_only: false,
		updated_at: OffsetDateTime::now_utc(),
	};

	preferences::upsert_profile(&db.pool, &profile).await.expect("Failed to insert profile.");

	profile.budget_max = Some(80.0);

	preferences::upsert_profile(&db.pool, &profile).await.expect("Failed to update profile.");

	let stored = preferences::get_profile(&db.pool, user_id)
		.await
		.expect("Failed to read profile.")
		.expect("Expected profile to exist.");

	assert_eq!(stored.budget_max, Some(80.0));

	let tour_id = Uuid::new_v4();

	embeddings::upsert_embedding(
		&db.pool,
		&EmbeddingRow {
			owner_type: "TOUR".to_string(),
			owner_id: tour_id,
			vec: vec![0.5, 0.5, 0.0],
			updated_at: OffsetDateTime::now_utc(),
		},
	)
	.await
	.expect("Failed to upsert embedding.");

	let rows = embeddings::get_embeddings(&db.pool, "TOUR", &[tour_id, Uuid::new_v4()])
		.await
		.expect("Failed to read embeddings.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].vec, vec![0.5, 0.5, 0.0]);
	assert!(matches!(
		embeddings::get_embedding(&db.pool, "HOST", tour_id).await,
		Err(Error::InvalidArgument(_))
	));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

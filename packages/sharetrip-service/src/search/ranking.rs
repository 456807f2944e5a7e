use std::cmp::Ordering;

use serde::Serialize;

use crate::search::Candidate;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
	PriceLow,
	PriceHigh,
	SpotsLeft,
	StartingSoon,
	Rating,
	#[default]
	Compatible,
}
impl SortStrategy {
	/// Unknown or missing strategies fall back to `compatible`.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
			Some("price_low") => Self::PriceLow,
			Some("price_high") => Self::PriceHigh,
			Some("spots_left") => Self::SpotsLeft,
			Some("starting_soon") => Self::StartingSoon,
			Some("rating") => Self::Rating,
			_ => Self::Compatible,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::PriceLow => "price_low",
			Self::PriceHigh => "price_high",
			Self::SpotsLeft => "spots_left",
			Self::StartingSoon => "starting_soon",
			Self::Rating => "rating",
			Self::Compatible => "compatible",
		}
	}
}

/// Orders candidates in place. Every strategy ends on tour id so the order is total.
pub fn rank(candidates: &mut [Candidate], strategy: SortStrategy) {
	candidates.sort_by(|a, b| compare(a, b, strategy).then_with(|| by_id(a, b)));
}

pub fn compare(a: &Candidate, b: &Candidate, strategy: SortStrategy) -> Ordering {
	match strategy {
		SortStrategy::PriceLow => a
			.quote
			.effective_price
			.total_cmp(&b.quote.effective_price)
			.then_with(|| a.quote.base_price.total_cmp(&b.quote.base_price)),
		SortStrategy::PriceHigh => b
			.quote
			.effective_price
			.total_cmp(&a.quote.effective_price)
			.then_with(|| b.quote.base_price.total_cmp(&a.quote.base_price)),
		SortStrategy::SpotsLeft => b.spots_left.cmp(&a.spots_left),
		SortStrategy::StartingSoon => match (a.next_start, b.next_start) {
			(Some(a), Some(b)) => a.cmp(&b),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		},
		SortStrategy::Rating => b.snapshot.tour.host_rating.total_cmp(&a.snapshot.tour.host_rating),
		SortStrategy::Compatible => b
			.snapshot
			.tour
			.host_rating
			.total_cmp(&a.snapshot.tour.host_rating)
			.then_with(|| b.spots_left.cmp(&a.spots_left))
			.then_with(|| b.snapshot.tour.created_at.cmp(&a.snapshot.tour.created_at)),
	}
}

/// Offset pagination. `page` is 1-based.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
	let offset = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);

	items.into_iter().skip(offset).take(limit as usize).collect()
}

fn by_id(a: &Candidate, b: &Candidate) -> Ordering {
	a.snapshot.tour.tour_id.cmp(&b.snapshot.tour.tour_id)
}

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime, macros::datetime};
	use uuid::Uuid;

	use crate::search::{
		Candidate,
		ranking::{SortStrategy, paginate, rank},
	};
	use sharetrip_domain::{
		capacity::FillSnapshot,
		tour::{CancellationPolicy, Tour, TourCategory, TourSnapshot, TourStatus},
	};

	const NOW: OffsetDateTime = datetime!(2026-11-02 08:00 UTC);

	fn candidate(id: u128) -> Candidate {
		let tour = Tour {
			tour_id: Uuid::from_u128(id),
			host_id: Uuid::from_u128(1_000 + id),
			title: format!("Tour {id}"),
			city: "Lisbon".to_string(),
			country: "Portugal".to_string(),
			start_times: vec![NOW + Duration::days(3)],
			duration_mins: 120,
			base_price: 50.0,
			currency: "EUR".to_string(),
			min_group: 2,
			max_group: 8,
			target_count: None,
			languages: Vec::new(),
			travel_styles: Vec::new(),
			accessibility: Vec::new(),
			cancellation_policy: CancellationPolicy::Flexible,
			instant_book: true,
			early_bird_until: None,
			pay_what_you_want: false,
			category: TourCategory::ShareTrip,
			status: TourStatus::Active,
			host_rating: 4.5,
			created_at: NOW - Duration::days(10),
		};
		let fill = FillSnapshot { confirmed_headcount: 0, pending_headcount: 0 };

		Candidate::new(TourSnapshot { tour, fill }, None, NOW)
	}

	fn ranked_ids(mut candidates: Vec<Candidate>, strategy: SortStrategy) -> Vec<u128> {
		rank(&mut candidates, strategy);

		candidates.iter().map(|candidate| candidate.snapshot.tour.tour_id.as_u128()).collect()
	}

	fn priced(id: u128, effective: f64, base: f64) -> Candidate {
		let mut candidate = candidate(id);

		candidate.quote.effective_price = effective;
		candidate.quote.base_price = base;

		candidate
	}

	#[test]
	fn price_strategies_break_ties_on_base_price() {
		let candidates = vec![priced(1, 80.0, 100.0), priced(2, 80.0, 80.0), priced(3, 60.0, 60.0)];

		assert_eq!(ranked_ids(candidates.clone(), SortStrategy::PriceLow), vec![3, 2, 1]);
		assert_eq!(ranked_ids(candidates, SortStrategy::PriceHigh), vec![1, 2, 3]);
	}

	#[test]
	fn spots_left_sorts_descending() {
		let candidates = [(1, 3), (2, 7), (3, 5)]
			.into_iter()
			.map(|(id, spots)| Candidate { spots_left: spots, ..candidate(id) })
			.collect();

		assert_eq!(ranked_ids(candidates, SortStrategy::SpotsLeft), vec![2, 3, 1]);
	}

	#[test]
	fn starting_soon_puts_tours_without_upcoming_start_last() {
		let candidates = vec![
			Candidate { next_start: Some(NOW + Duration::days(1)), ..candidate(1) },
			Candidate { next_start: None, ..candidate(2) },
			Candidate { next_start: Some(NOW + Duration::hours(2)), ..candidate(3) },
		];

		assert_eq!(ranked_ids(candidates, SortStrategy::StartingSoon), vec![3, 1, 2]);
	}

	#[test]
	fn rating_sorts_descending() {
		let candidates = [(1, 4.1), (2, 4.9), (3, 4.5)]
			.into_iter()
			.map(|(id, rating)| {
				let mut candidate = candidate(id);

				candidate.snapshot.tour.host_rating = rating;

				candidate
			})
			.collect();

		assert_eq!(ranked_ids(candidates, SortStrategy::Rating), vec![2, 3, 1]);
	}

	#[test]
	fn compatible_orders_by_rating_then_spots_then_recency() {
		let mut few_spots = candidate(1);
		let mut older = candidate(2);
		let mut newer = candidate(3);
		let mut best_rated = candidate(4);

		for candidate in [&mut few_spots, &mut older, &mut newer] {
			candidate.snapshot.tour.host_rating = 4.8;
		}

		best_rated.snapshot.tour.host_rating = 4.9;
		few_spots.spots_left = 2;
		older.spots_left = 6;
		newer.spots_left = 6;
		older.snapshot.tour.created_at = NOW - Duration::days(20);
		newer.snapshot.tour.created_at = NOW - Duration::days(2);

		assert_eq!(
			ranked_ids(vec![few_spots, older, newer, best_rated], SortStrategy::Compatible),
			vec![4, 3, 2, 1]
		);
	}

	#[test]
	fn full_ties_fall_back_to_tour_id() {
		for strategy in [
			SortStrategy::PriceLow,
			SortStrategy::PriceHigh,
			SortStrategy::SpotsLeft,
			SortStrategy::StartingSoon,
			SortStrategy::Rating,
			SortStrategy::Compatible,
		] {
			let candidates = vec![candidate(9), candidate(4), candidate(7)];

			assert_eq!(ranked_ids(candidates, strategy), vec![4, 7, 9], "{}", strategy.as_str());
		}
	}

	#[test]
	fn unknown_sort_falls_back_to_compatible() {
		assert_eq!(SortStrategy::parse(None), SortStrategy::Compatible);
		assert_eq!(SortStrategy::parse(Some("cheapest")), SortStrategy::Compatible);
		assert_eq!(SortStrategy::parse(Some(" Price_Low ")), SortStrategy::PriceLow);
	}

	#[test]
	fn pagination_uses_one_based_offsets() {
		let items = (0..45).collect::<Vec<u32>>();

		assert_eq!(paginate(items.clone(), 1, 20), (0..20).collect::<Vec<_>>());
		assert_eq!(paginate(items.clone(), 3, 20), (40..45).collect::<Vec<_>>());
		assert!(paginate(items, 4, 20).is_empty());
	}
}

//! Per-user compatibility scoring.
//!
//! Runs as three stages. The profile stage either yields a profile or hands over to the trending
//! fallback. The embedding stage either yields vectors or hands over to heuristic-only scoring.
//! The scoring stage always succeeds. Lookup failures are logged and never reach the caller.

use std::{cmp::Ordering, collections::HashMap, time::Duration};

use serde::Serialize;
use uuid::Uuid;

use crate::{
	EmbeddingSource, PreferenceSource, SharetripService,
	search::{Candidate, ranking::SortStrategy},
};
use sharetrip_config::{CompatibilityWeights, Matching};
use sharetrip_domain::{
	contains_label,
	profile::{EmbeddingOwner, UserPreferenceProfile},
	similarity,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Personalization {
	/// No user, or a user whose profile is unavailable under a non-default sort.
	None,
	Vector,
	Heuristic,
	Trending,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CompatibilityScore {
	pub heuristic_score: f32,
	pub vector_similarity: Option<f32>,
	pub combined_score: f32,
}

pub(crate) enum ProfileStage {
	Ready(UserPreferenceProfile),
	Trending,
}

pub(crate) enum EmbeddingStage {
	Vectors { user: Vec<f32>, tours: HashMap<Uuid, Vec<f32>> },
	HeuristicOnly,
}

impl SharetripService {
	/// Annotates candidates with compatibility scores and, under the default sort, reorders them.
	pub(crate) async fn personalize(
		&self,
		user_id: Uuid,
		candidates: &mut Vec<Candidate>,
		strategy: SortStrategy,
	) -> Personalization {
		let profile = match profile_stage(self.stores.preferences.as_ref(), user_id).await {
			ProfileStage::Ready(profile) => profile,
			ProfileStage::Trending => {
				if strategy != SortStrategy::Compatible {
					return Personalization::None;
				}

				candidates.truncate(self.cfg.search.trending_limit as usize);

				return Personalization::Trending;
			},
		};
		let tour_ids =
			candidates.iter().map(|candidate| candidate.snapshot.tour.tour_id).collect::<Vec<_>>();
		let timeout = Duration::from_millis(self.cfg.matching.embedding_timeout_ms);
		let embeddings =
			embedding_stage(self.stores.embeddings.as_ref(), user_id, &tour_ids, timeout).await;
		let mode = score_stage(&profile, &embeddings, candidates, &self.cfg.matching);

		if strategy == SortStrategy::Compatible {
			order_by_compatibility(candidates);
		}

		mode
	}
}

pub(crate) async fn profile_stage(source: &dyn PreferenceSource, user_id: Uuid) -> ProfileStage {
	match source.profile(user_id).await {
		Ok(Some(profile)) => ProfileStage::Ready(profile),
		Ok(None) => {
			tracing::debug!(user_id = %user_id, "No preference profile; serving trending tours.");

			ProfileStage::Trending
		},
		Err(err) => {
			tracing::warn!(
				error = %err,
				user_id = %user_id,
				"Preference lookup failed; serving trending tours."
			);

			ProfileStage::Trending
		},
	}
}

pub(crate) async fn embedding_stage(
	source: &dyn EmbeddingSource,
	user_id: Uuid,
	tour_ids: &[Uuid],
	timeout: Duration,
) -> EmbeddingStage {
	let lookup = async {
		let Some(user) = source.embedding(EmbeddingOwner::User, user_id).await? else {
			return Ok(None);
		};
		let tours = source.embeddings(EmbeddingOwner::Tour, tour_ids).await?;

		Ok::<_, crate::Error>(Some((user, tours)))
	};

	match tokio::time::timeout(timeout, lookup).await {
		Ok(Ok(Some((user, tours)))) => EmbeddingStage::Vectors { user, tours },
		Ok(Ok(None)) => {
			tracing::debug!(user_id = %user_id, "No user embedding; scoring heuristically.");

			EmbeddingStage::HeuristicOnly
		},
		Ok(Err(err)) => {
			tracing::warn!(
				error = %err,
				user_id = %user_id,
				"Embedding lookup failed; scoring heuristically."
			);

			EmbeddingStage::HeuristicOnly
		},
		Err(_) => {
			tracing::warn!(
				user_id = %user_id,
				timeout_ms = timeout.as_millis() as u64,
				"Embedding lookup timed out; scoring heuristically."
			);

			EmbeddingStage::HeuristicOnly
		},
	}
}

pub(crate) fn score_stage(
	profile: &UserPreferenceProfile,
	embeddings: &EmbeddingStage,
	candidates: &mut [Candidate],
	matching: &Matching,
) -> Personalization {
	let mut used_vectors = false;

	for candidate in candidates.iter_mut() {
		let heuristic = heuristic_score(profile, candidate, &matching.weights);
		let similarity = match embeddings {
			EmbeddingStage::Vectors { user, tours } => tours
				.get(&candidate.snapshot.tour.tour_id)
				.filter(|tour| similarity::is_usable_pair(user, tour))
				.map(|tour| similarity::cosine_similarity(user, tour)),
			EmbeddingStage::HeuristicOnly => None,
		};

		used_vectors |= similarity.is_some();
		candidate.compatibility = Some(blend(heuristic, similarity, matching.similarity_weight));
	}

	if used_vectors { Personalization::Vector } else { Personalization::Heuristic }
}

/// Heuristic fit in `[0, 1]`.
pub fn heuristic_score(
	profile: &UserPreferenceProfile,
	candidate: &Candidate,
	weights: &CompatibilityWeights,
) -> f32 {
	let tour = &candidate.snapshot.tour;
	let mut score = weights.base;

	if contains_label(&profile.cities, &tour.city) {
		score += weights.city;
	}
	if contains_label(&profile.countries, &tour.country) {
		score += weights.country;
	}

	score += budget_adjustment(profile, candidate.quote.effective_price, weights);

	if !profile.travel_styles.is_empty() {
		let matched = profile
			.travel_styles
			.iter()
			.filter(|style| contains_label(&tour.travel_styles, style))
			.count();

		score += weights.travel_style * matched as f32 / profile.travel_styles.len() as f32;
	}

	if profile.languages.iter().any(|language| contains_label(&tour.languages, language)) {
		score += weights.language;
	}
	if let Some(min) = profile.min_host_rating {
		score +=
			if tour.host_rating >= min { weights.host_rating_met } else { weights.host_rating_missed };
	}
	if !profile.accessibility.is_empty()
		&& profile.accessibility.iter().all(|need| contains_label(&tour.accessibility, need))
	{
		score += weights.accessibility;
	}
	if profile.instant_book_only && !tour.instant_book {
		score += weights.instant_book_mismatch;
	}

	let progress = candidate.quote.progress;

	if progress < weights.low_fill_below {
		score += weights.low_fill;
	} else if progress > weights.high_fill_above {
		score += weights.high_fill;
	}

	if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
}

pub fn blend(heuristic: f32, similarity: Option<f32>, similarity_weight: f32) -> CompatibilityScore {
	let combined_score = match similarity {
		// Cosine similarity can be negative; the combined score stays in [0, 1].
		Some(similarity) =>
			(similarity_weight * similarity + (1.0 - similarity_weight) * heuristic).clamp(0.0, 1.0),
		None => heuristic,
	};

	CompatibilityScore { heuristic_score: heuristic, vector_similarity: similarity, combined_score }
}

/// Combined score desc, then heuristic desc. The sort is stable so remaining ties keep the prior
/// order.
pub fn order_by_compatibility(candidates: &mut [Candidate]) {
	candidates.sort_by(|a, b| match (a.compatibility, b.compatibility) {
		(Some(a), Some(b)) => b
			.combined_score
			.total_cmp(&a.combined_score)
			.then_with(|| b.heuristic_score.total_cmp(&a.heuristic_score)),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	});
}

fn budget_adjustment(
	profile: &UserPreferenceProfile,
	price: f64,
	weights: &CompatibilityWeights,
) -> f32 {
	match (profile.budget_min, profile.budget_max) {
		(None, None) => 0.0,
		(Some(min), _) if price < min => weights.budget_below,
		(_, Some(max)) if price > max => weights.budget_above,
		_ => weights.budget_within,
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;
	use uuid::Uuid;

	use crate::{
		compatibility::{blend, heuristic_score, order_by_compatibility},
		search::Candidate,
	};
	use sharetrip_config::CompatibilityWeights;
	use sharetrip_domain::{
		capacity::FillSnapshot,
		profile::UserPreferenceProfile,
		tour::{CancellationPolicy, Tour, TourCategory, TourSnapshot, TourStatus},
	};

	fn candidate(confirmed: u32) -> Candidate {
		let now = datetime!(2026-11-01 08:00 UTC);
		let tour = Tour {
			tour_id: Uuid::new_v4(),
			host_id: Uuid::new_v4(),
			title: "Tapas crawl".to_string(),
			city: "Seville".to_string(),
			country: "Spain".to_string(),
			start_times: vec![datetime!(2026-11-03 19:00 UTC)],
			duration_mins: 150,
			base_price: 60.0,
			currency: "EUR".to_string(),
			min_group: 2,
			max_group: 10,
			target_count: None,
			languages: vec!["Spanish".to_string(), "English".to_string()],
			travel_styles: vec!["foodie".to_string(), "nightlife".to_string()],
			accessibility: vec!["wheelchair".to_string()],
			cancellation_policy: CancellationPolicy::Moderate,
			instant_book: false,
			early_bird_until: None,
			pay_what_you_want: false,
			category: TourCategory::ShareTrip,
			status: TourStatus::Active,
			host_rating: 4.2,
			created_at: now,
		};
		let fill = FillSnapshot { confirmed_headcount: confirmed, pending_headcount: 0 };

		Candidate::new(TourSnapshot { tour, fill }, None, now)
	}

	#[test]
	fn empty_profile_scores_base_plus_urgency() {
		let weights = CompatibilityWeights::default();
		let profile = UserPreferenceProfile::default();

		assert!((heuristic_score(&profile, &candidate(0), &weights) - 0.55).abs() < 1e-6);
		assert!((heuristic_score(&profile, &candidate(6), &weights) - 0.5).abs() < 1e-6);
		assert!((heuristic_score(&profile, &candidate(9), &weights) - 0.6).abs() < 1e-6);
	}

	#[test]
	fn full_match_is_clamped_to_one() {
		let weights = CompatibilityWeights::default();
		let profile = UserPreferenceProfile {
			cities: vec!["seville".to_string()],
			countries: vec!["Spain".to_string()],
			budget_min: Some(20.0),
			budget_max: Some(80.0),
			languages: vec!["English".to_string()],
			travel_styles: vec!["foodie".to_string()],
			accessibility: vec!["wheelchair".to_string()],
			min_host_rating: Some(4.0),
			..UserPreferenceProfile::default()
		};

		assert_eq!(heuristic_score(&profile, &candidate(0), &weights), 1.0);
	}

	#[test]
	fn poor_match_is_clamped_to_zero() {
		let weights = CompatibilityWeights { base: 0.1, ..CompatibilityWeights::default() };
		let profile = UserPreferenceProfile {
			budget_max: Some(10.0),
			min_host_rating: Some(4.9),
			travel_styles: vec!["hiking".to_string()],
			..UserPreferenceProfile::default()
		};

		assert_eq!(heuristic_score(&profile, &candidate(6), &weights), 0.0);
	}

	#[test]
	fn budget_penalty_is_asymmetric() {
		let weights = CompatibilityWeights::default();
		let below = UserPreferenceProfile { budget_min: Some(100.0), ..UserPreferenceProfile::default() };
		let above = UserPreferenceProfile { budget_max: Some(30.0), ..UserPreferenceProfile::default() };
		let below_score = heuristic_score(&below, &candidate(6), &weights);
		let above_score = heuristic_score(&above, &candidate(6), &weights);

		assert!((below_score - 0.45).abs() < 1e-6);
		assert!((above_score - 0.3).abs() < 1e-6);
	}

	#[test]
	fn travel_styles_scale_with_matched_fraction() {
		let weights = CompatibilityWeights::default();
		let profile = UserPreferenceProfile {
			travel_styles: vec!["foodie".to_string(), "hiking".to_string()],
			..UserPreferenceProfile::default()
		};

		assert!((heuristic_score(&profile, &candidate(6), &weights) - 0.6).abs() < 1e-6);
	}

	#[test]
	fn blend_uses_similarity_only_when_present() {
		let with_vector = blend(0.5, Some(1.0), 0.4);

		assert!((with_vector.combined_score - 0.7).abs() < 1e-6);
		assert_eq!(blend(0.5, None, 0.4).combined_score, 0.5);
	}

	#[test]
	fn opposed_embeddings_cannot_push_the_score_below_zero() {
		let opposed = blend(0.25, Some(-1.0), 0.4);

		assert_eq!(opposed.combined_score, 0.0);
		assert_eq!(opposed.vector_similarity, Some(-1.0));
		assert_eq!(opposed.heuristic_score, 0.25);
		assert!((blend(0.9, Some(-0.5), 0.4).combined_score - 0.34).abs() < 1e-6);
	}

	#[test]
	fn ties_keep_prior_order() {
		let mut candidates = vec![candidate(0), candidate(0), candidate(0)];

		candidates[0].compatibility = Some(blend(0.6, None, 0.4));
		candidates[1].compatibility = Some(blend(0.7, Some(0.25), 0.4));
		candidates[2].compatibility = Some(blend(0.6, None, 0.4));

		let before = candidates.iter().map(|c| c.snapshot.tour.tour_id).collect::<Vec<_>>();

		order_by_compatibility(&mut candidates);

		let after = candidates.iter().map(|c| c.snapshot.tour.tour_id).collect::<Vec<_>>();

		assert_eq!(after, vec![before[0], before[2], before[1]]);
	}
}

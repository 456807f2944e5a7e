pub mod filter;
pub mod ranking;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result, SharetripService,
	compatibility::{CompatibilityScore, Personalization},
	search::{
		filter::CompiledFilter,
		ranking::{SortStrategy, paginate},
	},
};
use sharetrip_config::GroupFillPricing;
use sharetrip_domain::{
	pricing::{self, PriceQuote},
	tour::{Tour, TourSnapshot},
};

/// Every field is optional. An empty request matches every eligible tour.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	pub cities: Vec<String>,
	pub countries: Vec<String>,
	/// `YYYY-MM-DD`.
	pub date_from: Option<String>,
	/// `YYYY-MM-DD`.
	pub date_to: Option<String>,
	pub flexible_days: u32,
	/// `morning`, `afternoon`, `evening`, `night`.
	pub start_windows: Vec<String>,
	/// `30-60m`, `1-2h`, `3-4h`, `full-day`.
	pub durations: Vec<String>,
	/// `2-5`, `6-10`, `10-16`, `16+`.
	pub group_sizes: Vec<String>,
	pub min_price: Option<f64>,
	pub max_price: Option<f64>,
	pub price_at_full_group: bool,
	pub languages: Vec<String>,
	pub travel_styles: Vec<String>,
	pub accessibility: Vec<String>,
	pub instant_book: bool,
	pub min_host_rating: Option<f32>,
	/// `drop_in`, `early_bird`, `pay_what_you_want`.
	pub deals: Vec<String>,
	pub cancellation_policies: Vec<String>,
	pub sort: Option<String>,
	pub page: Option<u32>,
	pub limit: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub items: Vec<TourMatch>,
	pub page: u32,
	pub limit: u32,
	/// Matches across all pages.
	pub total: usize,
	pub sort: SortStrategy,
	pub personalization: Personalization,
}

#[derive(Clone, Debug, Serialize)]
pub struct TourMatch {
	pub tour: Tour,
	pub effective_price: f64,
	pub dynamic_price: Option<f64>,
	pub max_group_price: f64,
	pub spots_left: u32,
	pub progress: f32,
	pub drop_in: bool,
	pub early_bird: bool,
	#[serde(with = "sharetrip_domain::time_serde::option")]
	pub next_start: Option<OffsetDateTime>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub compatibility: Option<CompatibilityScore>,
}
impl From<Candidate> for TourMatch {
	fn from(candidate: Candidate) -> Self {
		Self {
			tour: candidate.snapshot.tour,
			effective_price: candidate.quote.effective_price,
			dynamic_price: candidate.quote.dynamic_price,
			max_group_price: candidate.quote.max_group_price,
			spots_left: candidate.spots_left,
			progress: candidate.quote.progress,
			drop_in: candidate.drop_in,
			early_bird: candidate.early_bird,
			next_start: candidate.next_start,
			compatibility: candidate.compatibility,
		}
	}
}

/// A tour snapshot with everything filtering, ranking and scoring read, computed once per pass.
#[derive(Clone, Debug)]
pub struct Candidate {
	pub snapshot: TourSnapshot,
	pub quote: PriceQuote,
	pub spots_left: u32,
	pub drop_in: bool,
	pub early_bird: bool,
	pub next_start: Option<OffsetDateTime>,
	pub compatibility: Option<CompatibilityScore>,
}
impl Candidate {
	pub fn new(
		snapshot: TourSnapshot,
		pricing: Option<&GroupFillPricing>,
		now: OffsetDateTime,
	) -> Self {
		let quote = pricing::quote(&snapshot.tour, &snapshot.fill, pricing);

		Self {
			spots_left: snapshot.spots_left(),
			drop_in: snapshot.tour.is_drop_in(now),
			early_bird: snapshot.tour.has_early_bird(now),
			next_start: snapshot.tour.next_start(now),
			quote,
			snapshot,
			compatibility: None,
		}
	}
}

impl SharetripService {
	pub async fn search(&self, user_id: Option<Uuid>, req: SearchRequest) -> Result<SearchResponse> {
		self.search_at(user_id, req, OffsetDateTime::now_utc()).await
	}

	pub async fn search_at(
		&self,
		user_id: Option<Uuid>,
		req: SearchRequest,
		now: OffsetDateTime,
	) -> Result<SearchResponse> {
		let page = resolve_page(req.page)?;
		let limit = resolve_limit(req.limit, &self.cfg.search)?;
		let filter = CompiledFilter::compile(&req)?;
		let sort = SortStrategy::parse(req.sort.as_deref());
		let pricing = self.cfg.pricing.group_fill.as_ref();
		let candidates = self
			.stores
			.tours
			.eligible_tours()
			.await?
			.into_iter()
			.map(|snapshot| Candidate::new(snapshot, pricing, now))
			.collect::<Vec<_>>();
		let (mut matched, impact) = filter.apply(candidates);

		tracing::debug!(
			candidate_count_pre = impact.candidate_count_pre,
			candidate_count_post = impact.candidate_count_post,
			dropped_total = impact.dropped_total,
			top_drop_reasons = ?impact.top_drop_reasons,
			"Search filter applied."
		);

		ranking::rank(&mut matched, sort);

		let personalization = match user_id {
			Some(user_id) => self.personalize(user_id, &mut matched, sort).await,
			None => Personalization::None,
		};
		let total = matched.len();
		let items = paginate(matched, page, limit).into_iter().map(TourMatch::from).collect();

		Ok(SearchResponse { items, page, limit, total, sort, personalization })
	}
}

fn resolve_page(page: Option<u32>) -> Result<u32> {
	match page {
		Some(0) => Err(Error::invalid_at("$.page", "must be at least 1.")),
		Some(page) => Ok(page),
		None => Ok(1),
	}
}

fn resolve_limit(limit: Option<u32>, cfg: &sharetrip_config::Search) -> Result<u32> {
	match limit {
		Some(0) => Err(Error::invalid_at("$.limit", "must be at least 1.")),
		Some(limit) => Ok(limit.min(cfg.max_limit)),
		None => Ok(cfg.default_limit.min(cfg.max_limit)),
	}
}

//! Compiles a search request into a conjunction of typed predicates.
//!
//! Each predicate is independent. Bucketed predicates (windows, durations, group sizes, deals,
//! policies) are disjunctions over the recognised bucket members. Unrecognised tokens are dropped
//! at compile time, and a predicate left with no members is not emitted at all.

use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, macros::format_description};

use crate::{
	Error, Result,
	search::{Candidate, SearchRequest},
};
use sharetrip_domain::{contains_label, labels_match, tour::CancellationPolicy};

const TOP_DROP_REASONS: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartWindow {
	Morning,
	Afternoon,
	Evening,
	Night,
}
impl StartWindow {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"morning" => Some(Self::Morning),
			"afternoon" => Some(Self::Afternoon),
			"evening" => Some(Self::Evening),
			"night" => Some(Self::Night),
			_ => None,
		}
	}

	/// Hours are read in the start time's own offset.
	pub fn contains(self, start: OffsetDateTime) -> bool {
		let hour = start.hour();

		match self {
			Self::Morning => (6..12).contains(&hour),
			Self::Afternoon => (12..17).contains(&hour),
			Self::Evening => (17..21).contains(&hour),
			Self::Night => hour >= 21 || hour < 6,
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BucketRange {
	pub min: u32,
	pub max: Option<u32>,
}
impl BucketRange {
	pub fn duration_bucket(raw: &str) -> Option<Self> {
		let (min, max) = match raw.trim().to_ascii_lowercase().as_str() {
			"30-60m" => (30, Some(60)),
			"1-2h" => (60, Some(120)),
			"3-4h" => (180, Some(240)),
			"full-day" => (240, None),
			_ => return None,
		};

		Some(Self { min, max })
	}

	pub fn group_size_bucket(raw: &str) -> Option<Self> {
		let (min, max) = match raw.trim() {
			"2-5" => (2, Some(5)),
			"6-10" => (6, Some(10)),
			"10-16" => (10, Some(16)),
			"16+" => (16, None),
			_ => return None,
		};

		Some(Self { min, max })
	}

	pub fn contains(self, value: u32) -> bool {
		value >= self.min && self.max.map(|max| value <= max).unwrap_or(true)
	}

	pub fn overlaps(self, low: u32, high: u32) -> bool {
		low <= self.max.unwrap_or(u32::MAX) && high >= self.min
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Deal {
	DropIn,
	EarlyBird,
	PayWhatYouWant,
}
impl Deal {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"drop_in" => Some(Self::DropIn),
			"early_bird" => Some(Self::EarlyBird),
			"pay_what_you_want" => Some(Self::PayWhatYouWant),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PriceBasis {
	/// Base price or current dynamic price, either one in range.
	Current,
	/// Price once the group reaches its target.
	FullGroup,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TourPredicate {
	Eligible,
	Location { cities: Vec<String>, countries: Vec<String> },
	StartDate { from: Option<Date>, to: Option<Date> },
	StartWindow(Vec<StartWindow>),
	Duration(Vec<BucketRange>),
	GroupSize(Vec<BucketRange>),
	Price { min: Option<f64>, max: Option<f64>, basis: PriceBasis },
	Languages(Vec<String>),
	TravelStyles(Vec<String>),
	Accessibility(Vec<String>),
	InstantBook,
	MinHostRating(f32),
	Deals(Vec<Deal>),
	CancellationPolicies(Vec<CancellationPolicy>),
	/// Contradictory bounds. Matches nothing.
	Never,
}
impl TourPredicate {
	pub fn reason(&self) -> &'static str {
		match self {
			Self::Eligible => "not_eligible",
			Self::Location { .. } => "location",
			Self::StartDate { .. } => "start_date",
			Self::StartWindow(_) => "start_window",
			Self::Duration(_) => "duration",
			Self::GroupSize(_) => "group_size",
			Self::Price { .. } => "price",
			Self::Languages(_) => "languages",
			Self::TravelStyles(_) => "travel_styles",
			Self::Accessibility(_) => "accessibility",
			Self::InstantBook => "instant_book",
			Self::MinHostRating(_) => "min_host_rating",
			Self::Deals(_) => "deals",
			Self::CancellationPolicies(_) => "cancellation_policy",
			Self::Never => "empty_price_range",
		}
	}

	pub fn matches(&self, candidate: &Candidate) -> bool {
		let tour = &candidate.snapshot.tour;

		match self {
			Self::Eligible => tour.is_eligible(),
			Self::Location { cities, countries } => {
				(cities.is_empty() || contains_label(cities, &tour.city))
					&& (countries.is_empty() || contains_label(countries, &tour.country))
			},
			Self::StartDate { from, to } => tour.start_times.iter().any(|start| {
				let date = start.date();

				from.map(|from| date >= from).unwrap_or(true)
					&& to.map(|to| date <= to).unwrap_or(true)
			}),
			Self::StartWindow(windows) => tour
				.start_times
				.iter()
				.any(|start| windows.iter().any(|window| window.contains(*start))),
			Self::Duration(ranges) => ranges.iter().any(|range| range.contains(tour.duration_mins)),
			Self::GroupSize(ranges) =>
				ranges.iter().any(|range| range.overlaps(tour.min_group, tour.max_group)),
			Self::Price { min, max, basis } => {
				let in_range = |price: f64| {
					min.map(|min| price >= min).unwrap_or(true)
						&& max.map(|max| price <= max).unwrap_or(true)
				};

				match basis {
					PriceBasis::Current =>
						in_range(candidate.quote.base_price)
							|| in_range(candidate.quote.effective_price),
					PriceBasis::FullGroup => in_range(candidate.quote.max_group_price),
				}
			},
			Self::Languages(languages) =>
				languages.iter().any(|language| contains_label(&tour.languages, language)),
			Self::TravelStyles(styles) =>
				styles.iter().any(|style| contains_label(&tour.travel_styles, style)),
			Self::Accessibility(needs) =>
				needs.iter().all(|need| contains_label(&tour.accessibility, need)),
			Self::InstantBook => tour.instant_book,
			Self::MinHostRating(min) => tour.host_rating >= *min,
			Self::Deals(deals) => deals.iter().any(|deal| match deal {
				Deal::DropIn => candidate.drop_in,
				Deal::EarlyBird => candidate.early_bird,
				Deal::PayWhatYouWant => tour.pay_what_you_want,
			}),
			Self::CancellationPolicies(policies) => policies.contains(&tour.cancellation_policy),
			Self::Never => false,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct FilterDropReason {
	pub reason: &'static str,
	pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct FilterImpact {
	pub candidate_count_pre: usize,
	pub candidate_count_post: usize,
	pub dropped_total: usize,
	pub top_drop_reasons: Vec<FilterDropReason>,
}

#[derive(Clone, Debug)]
pub struct CompiledFilter {
	predicates: Vec<TourPredicate>,
}
impl CompiledFilter {
	pub fn compile(req: &SearchRequest) -> Result<Self> {
		let mut predicates = vec![TourPredicate::Eligible];
		let cities = clean_labels(&req.cities);
		let countries = clean_labels(&req.countries);

		if !cities.is_empty() || !countries.is_empty() {
			predicates.push(TourPredicate::Location { cities, countries });
		}

		if let Some(predicate) = compile_dates(req)? {
			predicates.push(predicate);
		}

		let windows = parse_tokens(&req.start_windows, StartWindow::parse);

		if !windows.is_empty() {
			predicates.push(TourPredicate::StartWindow(windows));
		}

		let durations = parse_tokens(&req.durations, BucketRange::duration_bucket);

		if !durations.is_empty() {
			predicates.push(TourPredicate::Duration(durations));
		}

		let group_sizes = parse_tokens(&req.group_sizes, BucketRange::group_size_bucket);

		if !group_sizes.is_empty() {
			predicates.push(TourPredicate::GroupSize(group_sizes));
		}

		if let Some(predicate) = compile_price(req)? {
			predicates.push(predicate);
		}

		let languages = clean_labels(&req.languages);

		if !languages.is_empty() {
			predicates.push(TourPredicate::Languages(languages));
		}

		let styles = clean_labels(&req.travel_styles);

		if !styles.is_empty() {
			predicates.push(TourPredicate::TravelStyles(styles));
		}

		let needs = clean_labels(&req.accessibility);

		if !needs.is_empty() {
			predicates.push(TourPredicate::Accessibility(needs));
		}

		if req.instant_book {
			predicates.push(TourPredicate::InstantBook);
		}

		if let Some(min) = req.min_host_rating {
			if !min.is_finite() {
				return Err(Error::invalid_at("$.min_host_rating", "must be a finite number."));
			}

			predicates.push(TourPredicate::MinHostRating(min));
		}

		let deals = parse_tokens(&req.deals, Deal::parse);

		if !deals.is_empty() {
			predicates.push(TourPredicate::Deals(deals));
		}

		let policies = parse_tokens(&req.cancellation_policies, CancellationPolicy::parse);

		if !policies.is_empty() {
			predicates.push(TourPredicate::CancellationPolicies(policies));
		}

		Ok(Self { predicates })
	}

	pub fn predicates(&self) -> &[TourPredicate] {
		&self.predicates
	}

	/// The first predicate the candidate fails, if any.
	pub fn evaluate(&self, candidate: &Candidate) -> Option<&TourPredicate> {
		self.predicates.iter().find(|predicate| !predicate.matches(candidate))
	}

	pub fn apply(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, FilterImpact) {
		let pre = candidates.len();
		let mut kept = Vec::with_capacity(pre);
		let mut dropped: HashMap<&'static str, usize> = HashMap::new();

		for candidate in candidates {
			match self.evaluate(&candidate) {
				None => kept.push(candidate),
				Some(predicate) => *dropped.entry(predicate.reason()).or_insert(0) += 1,
			}
		}

		let mut top_drop_reasons = dropped
			.into_iter()
			.map(|(reason, count)| FilterDropReason { reason, count })
			.collect::<Vec<_>>();

		top_drop_reasons.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(b.reason)));
		top_drop_reasons.truncate(TOP_DROP_REASONS);

		let post = kept.len();

		(
			kept,
			FilterImpact {
				candidate_count_pre: pre,
				candidate_count_post: post,
				dropped_total: pre.saturating_sub(post),
				top_drop_reasons,
			},
		)
	}
}

fn compile_dates(req: &SearchRequest) -> Result<Option<TourPredicate>> {
	let from = req.date_from.as_deref().map(|raw| parse_date("$.date_from", raw)).transpose()?;
	let to = req.date_to.as_deref().map(|raw| parse_date("$.date_to", raw)).transpose()?;

	if let (Some(from), Some(to)) = (from, to)
		&& from > to
	{
		return Err(Error::invalid_at("$.date_from", "must not be after date_to."));
	}
	if from.is_none() && to.is_none() {
		return Ok(None);
	}

	let slack = Duration::days(i64::from(req.flexible_days));
	let from = from.map(|date| date.checked_sub(slack).unwrap_or(Date::MIN));
	let to = to.map(|date| date.checked_add(slack).unwrap_or(Date::MAX));

	Ok(Some(TourPredicate::StartDate { from, to }))
}

fn parse_date(path: &str, raw: &str) -> Result<Date> {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
		.map_err(|_| Error::invalid_at(path, format!("'{raw}' is not a YYYY-MM-DD date.")))
}

fn compile_price(req: &SearchRequest) -> Result<Option<TourPredicate>> {
	for (path, value) in [("$.min_price", req.min_price), ("$.max_price", req.max_price)] {
		if let Some(value) = value {
			if !value.is_finite() {
				return Err(Error::invalid_at(path, "must be a finite number."));
			}
			if value < 0.0 {
				return Err(Error::invalid_at(path, "must not be negative."));
			}
		}
	}

	match (req.min_price, req.max_price) {
		(None, None) => Ok(None),
		(Some(min), Some(max)) if min > max => Ok(Some(TourPredicate::Never)),
		(min, max) => {
			let basis =
				if req.price_at_full_group { PriceBasis::FullGroup } else { PriceBasis::Current };

			Ok(Some(TourPredicate::Price { min, max, basis }))
		},
	}
}

fn clean_labels(labels: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();

	for label in labels {
		let trimmed = label.trim();

		if trimmed.is_empty() || out.iter().any(|seen| labels_match(seen, trimmed)) {
			continue;
		}

		out.push(trimmed.to_string());
	}

	out
}

fn parse_tokens<T, F>(tokens: &[String], parse: F) -> Vec<T>
where
	T: PartialEq,
	F: Fn(&str) -> Option<T>,
{
	let mut out = Vec::new();

	for token in tokens {
		if let Some(value) = parse(token)
			&& !out.contains(&value)
		{
			out.push(value);
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use crate::search::{
		SearchRequest,
		filter::{CompiledFilter, BucketRange, PriceBasis, StartWindow, TourPredicate},
	};

	#[test]
	fn empty_request_only_requires_eligibility() {
		let filter = CompiledFilter::compile(&SearchRequest::default()).expect("compile");

		assert_eq!(filter.predicates(), &[TourPredicate::Eligible]);
	}

	#[test]
	fn unknown_tokens_are_ignored() {
		let req = SearchRequest {
			durations: vec!["weekend".to_string()],
			group_sizes: vec!["100-200".to_string()],
			deals: vec!["flash".to_string(), "drop_in".to_string()],
			cancellation_policies: vec!["lenient".to_string()],
			..SearchRequest::default()
		};
		let filter = CompiledFilter::compile(&req).expect("compile");

		assert_eq!(filter.predicates().len(), 2);
		assert!(matches!(filter.predicates()[1], TourPredicate::Deals(_)));
	}

	#[test]
	fn inverted_price_range_compiles_to_never() {
		let req =
			SearchRequest { min_price: Some(90.0), max_price: Some(10.0), ..SearchRequest::default() };
		let filter = CompiledFilter::compile(&req).expect("compile");

		assert!(filter.predicates().contains(&TourPredicate::Never));
	}

	#[test]
	fn full_group_mode_selects_price_basis() {
		let req = SearchRequest {
			max_price: Some(50.0),
			price_at_full_group: true,
			..SearchRequest::default()
		};
		let filter = CompiledFilter::compile(&req).expect("compile");

		assert!(filter.predicates().contains(&TourPredicate::Price {
			min: None,
			max: Some(50.0),
			basis: PriceBasis::FullGroup,
		}));
	}

	#[test]
	fn malformed_input_names_the_path() {
		let cases = [
			(
				SearchRequest { date_from: Some("2026-13-01".to_string()), ..SearchRequest::default() },
				"$.date_from",
			),
			(
				SearchRequest {
					date_from: Some("2026-11-10".to_string()),
					date_to: Some("2026-11-01".to_string()),
					..SearchRequest::default()
				},
				"$.date_from",
			),
			(SearchRequest { min_price: Some(-1.0), ..SearchRequest::default() }, "$.min_price"),
			(SearchRequest { max_price: Some(f64::NAN), ..SearchRequest::default() }, "$.max_price"),
			(
				SearchRequest { min_host_rating: Some(f32::INFINITY), ..SearchRequest::default() },
				"$.min_host_rating",
			),
		];

		for (req, path) in cases {
			let err = CompiledFilter::compile(&req).expect_err("expected validation error");

			assert!(err.to_string().contains(path), "{err} should name {path}");
		}
	}

	#[test]
	fn flexible_days_widen_both_ends() {
		let req = SearchRequest {
			date_from: Some("2026-11-10".to_string()),
			date_to: Some("2026-11-12".to_string()),
			flexible_days: 2,
			..SearchRequest::default()
		};
		let filter = CompiledFilter::compile(&req).expect("compile");

		assert!(filter.predicates().contains(&TourPredicate::StartDate {
			from: Some(date!(2026-11-08)),
			to: Some(date!(2026-11-14)),
		}));
	}

	#[test]
	fn night_window_wraps_midnight() {
		assert!(StartWindow::Night.contains(datetime!(2026-11-10 23:30 UTC)));
		assert!(StartWindow::Night.contains(datetime!(2026-11-10 05:59 UTC)));
		assert!(!StartWindow::Night.contains(datetime!(2026-11-10 06:00 UTC)));
		assert!(StartWindow::Morning.contains(datetime!(2026-11-10 06:00 UTC)));
		assert!(StartWindow::Afternoon.contains(datetime!(2026-11-10 12:00 UTC)));
		assert!(StartWindow::Evening.contains(datetime!(2026-11-10 20:59 UTC)));
	}

	#[test]
	fn buckets_are_inclusive() {
		let one_to_two = BucketRange::duration_bucket("1-2h").expect("bucket");

		assert!(one_to_two.contains(60));
		assert!(one_to_two.contains(120));
		assert!(!one_to_two.contains(121));

		let full_day = BucketRange::duration_bucket("full-day").expect("bucket");

		assert!(full_day.contains(240));
		assert!(full_day.contains(600));

		let small = BucketRange::group_size_bucket("2-5").expect("bucket");

		assert!(small.overlaps(4, 12));
		assert!(small.overlaps(1, 2));
		assert!(!small.overlaps(6, 10));
	}
}

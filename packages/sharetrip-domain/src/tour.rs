use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::capacity::FillSnapshot;

/// A session starting within this window from now is a drop-in.
pub const DROP_IN_WINDOW: Duration = Duration::hours(2);

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
	Draft,
	Active,
	Paused,
	Closed,
}
impl TourStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Draft => "draft",
			Self::Active => "active",
			Self::Paused => "paused",
			Self::Closed => "closed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"draft" => Some(Self::Draft),
			"active" => Some(Self::Active),
			"paused" => Some(Self::Paused),
			"closed" => Some(Self::Closed),
			_ => None,
		}
	}
}

impl Display for TourStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TourCategory {
	ShareTrip,
	Private,
}
impl TourCategory {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ShareTrip => "share_trip",
			Self::Private => "private",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"share_trip" => Some(Self::ShareTrip),
			"private" => Some(Self::Private),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
	Flexible,
	Moderate,
	Strict,
}
impl CancellationPolicy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Flexible => "flexible",
			Self::Moderate => "moderate",
			Self::Strict => "strict",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"flexible" => Some(Self::Flexible),
			"moderate" => Some(Self::Moderate),
			"strict" => Some(Self::Strict),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tour {
	pub tour_id: Uuid,
	pub host_id: Uuid,
	pub title: String,
	pub city: String,
	pub country: String,
	#[serde(with = "crate::time_serde::vec")]
	pub start_times: Vec<OffsetDateTime>,
	pub duration_mins: u32,
	pub base_price: f64,
	pub currency: String,
	pub min_group: u32,
	pub max_group: u32,
	/// Optional fill target for group pricing and progress. Falls back to `max_group`.
	pub target_count: Option<u32>,
	pub languages: Vec<String>,
	pub travel_styles: Vec<String>,
	pub accessibility: Vec<String>,
	pub cancellation_policy: CancellationPolicy,
	pub instant_book: bool,
	#[serde(with = "crate::time_serde::option")]
	pub early_bird_until: Option<OffsetDateTime>,
	pub pay_what_you_want: bool,
	pub category: TourCategory,
	pub status: TourStatus,
	pub host_rating: f32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl Tour {
	/// Only active share trips are ever matched or booked.
	pub fn is_eligible(&self) -> bool {
		self.status == TourStatus::Active && self.category == TourCategory::ShareTrip
	}

	pub fn fill_target(&self) -> u32 {
		self.target_count.filter(|target| *target > 0).unwrap_or(self.max_group).max(1)
	}

	pub fn next_start(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
		self.start_times.iter().copied().filter(|start| *start > now).min()
	}

	pub fn is_drop_in(&self, now: OffsetDateTime) -> bool {
		self.start_times.iter().any(|start| {
			let lead = *start - now;

			lead > Duration::ZERO && lead <= DROP_IN_WINDOW
		})
	}

	pub fn has_early_bird(&self, now: OffsetDateTime) -> bool {
		self.early_bird_until.map(|until| now < until).unwrap_or(false)
	}
}

/// A tour together with the fill counts read in the same consistent snapshot.
#[derive(Clone, Debug)]
pub struct TourSnapshot {
	pub tour: Tour,
	pub fill: FillSnapshot,
}
impl TourSnapshot {
	pub fn spots_left(&self) -> u32 {
		self.fill.spots_left(self.tour.max_group)
	}
}

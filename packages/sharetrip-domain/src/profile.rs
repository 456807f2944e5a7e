use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UserPreferenceProfile {
	pub user_id: Uuid,
	pub cities: Vec<String>,
	pub countries: Vec<String>,
	pub budget_min: Option<f64>,
	pub budget_max: Option<f64>,
	pub languages: Vec<String>,
	pub travel_styles: Vec<String>,
	/// Every listed need must be covered by a tour.
	pub accessibility: Vec<String>,
	pub min_host_rating: Option<f32>,
	pub instant_book_only: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingOwner {
	User,
	Tour,
}
impl EmbeddingOwner {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "USER",
			Self::Tour => "TOUR",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"USER" => Some(Self::User),
			"TOUR" => Some(Self::Tour),
			_ => None,
		}
	}
}

impl Display for EmbeddingOwner {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EmbeddingVector {
	pub owner: EmbeddingOwner,
	pub owner_id: Uuid,
	pub vector: Vec<f32>,
}

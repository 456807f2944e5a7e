use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub pricing: Pricing,
	#[serde(default)]
	pub matching: Matching,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Size of the non-personalized set served when a user has no preference profile.
	pub trending_limit: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_limit: 20, max_limit: 100, trending_limit: 10 }
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pricing {
	/// Optional. Without it tours have no group-fill state and always sell at base price.
	pub group_fill: Option<GroupFillPricing>,
}

/// Linear fill discount: a seat costs `base * (1 - max_discount * fill)` where `fill` is the
/// confirmed share of the target group size, capped at 1.
#[derive(Clone, Debug, Deserialize)]
pub struct GroupFillPricing {
	pub max_discount: f64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Matching {
	/// Share of the combined score taken by vector similarity when both embeddings are usable.
	pub similarity_weight: f32,
	pub embedding_timeout_ms: u64,
	pub weights: CompatibilityWeights,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			similarity_weight: 0.4,
			embedding_timeout_ms: 250,
			weights: CompatibilityWeights::default(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CompatibilityWeights {
	pub base: f32,
	pub city: f32,
	pub country: f32,
	pub budget_within: f32,
	pub budget_below: f32,
	pub budget_above: f32,
	/// Upper bound, scaled by the fraction of the user's travel styles the tour offers.
	pub travel_style: f32,
	pub language: f32,
	pub host_rating_met: f32,
	pub host_rating_missed: f32,
	pub accessibility: f32,
	pub instant_book_mismatch: f32,
	pub low_fill: f32,
	pub high_fill: f32,
	/// Percent.
	pub low_fill_below: f32,
	/// Percent.
	pub high_fill_above: f32,
}
impl Default for CompatibilityWeights {
	fn default() -> Self {
		Self {
			base: 0.5,
			city: 0.2,
			country: 0.1,
			budget_within: 0.15,
			budget_below: -0.05,
			budget_above: -0.2,
			travel_style: 0.2,
			language: 0.1,
			host_rating_met: 0.1,
			host_rating_missed: -0.1,
			accessibility: 0.1,
			instant_book_mismatch: 0.0,
			low_fill: 0.05,
			high_fill: 0.1,
			low_fill_below: 50.0,
			high_fill_above: 80.0,
		}
	}
}

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CompatibilityWeights, Config, GroupFillPricing, Matching, Postgres, Pricing, Search, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (key, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::invalid(key, "must be non-empty"));
		}
	}
	for (key, value) in [
		("storage.postgres.pool_max_conns", cfg.storage.postgres.pool_max_conns),
		("search.default_limit", cfg.search.default_limit),
		("search.max_limit", cfg.search.max_limit),
		("search.trending_limit", cfg.search.trending_limit),
	] {
		if value == 0 {
			return Err(Error::invalid(key, "must be greater than zero"));
		}
	}

	if cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::invalid(
			"search.default_limit",
			"must be less than or equal to search.max_limit",
		));
	}
	if let Some(group_fill) = cfg.pricing.group_fill.as_ref()
		&& !(0.0..1.0).contains(&group_fill.max_discount)
	{
		return Err(Error::invalid(
			"pricing.group_fill.max_discount",
			"must be a finite number in the range 0.0-1.0 (exclusive)",
		));
	}
	if !(0.0..=1.0).contains(&cfg.matching.similarity_weight) {
		return Err(Error::invalid(
			"matching.similarity_weight",
			"must be a finite number in the range 0.0-1.0",
		));
	}
	if cfg.matching.embedding_timeout_ms == 0 {
		return Err(Error::invalid("matching.embedding_timeout_ms", "must be greater than zero"));
	}

	validate_weights(&cfg.matching.weights)
}

fn validate_weights(weights: &CompatibilityWeights) -> Result<()> {
	for (label, value) in [
		("base", weights.base),
		("city", weights.city),
		("country", weights.country),
		("budget_within", weights.budget_within),
		("budget_below", weights.budget_below),
		("budget_above", weights.budget_above),
		("travel_style", weights.travel_style),
		("language", weights.language),
		("host_rating_met", weights.host_rating_met),
		("host_rating_missed", weights.host_rating_missed),
		("accessibility", weights.accessibility),
		("instant_book_mismatch", weights.instant_book_mismatch),
		("low_fill", weights.low_fill),
		("high_fill", weights.high_fill),
	] {
		// NaN fails the range check too.
		if !(-1.0..=1.0).contains(&value) {
			return Err(Error::invalid(
				format!("matching.weights.{label}"),
				"must be a finite number in the range -1.0-1.0",
			));
		}
	}
	for (label, value) in
		[("low_fill_below", weights.low_fill_below), ("high_fill_above", weights.high_fill_above)]
	{
		if !(0.0..=100.0).contains(&value) {
			return Err(Error::invalid(
				format!("matching.weights.{label}"),
				"must be a percentage in 0-100",
			));
		}
	}

	if weights.low_fill_below >= weights.high_fill_above {
		return Err(Error::invalid(
			"matching.weights.low_fill_below",
			"must be less than matching.weights.high_fill_above",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.storage.postgres.dsn = cfg.storage.postgres.dsn.trim().to_string();
}

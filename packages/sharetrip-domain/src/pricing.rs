use serde::Serialize;

use crate::{capacity::FillSnapshot, tour::Tour};
use sharetrip_config::GroupFillPricing;

/// Fill-derived pricing for one tour. Always recomputed from the booking ledger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroupFillState {
	pub target_count: u32,
	pub dynamic_price: f64,
	/// Seat price once the target group is full.
	pub max_group_price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
	pub base_price: f64,
	pub effective_price: f64,
	pub dynamic_price: Option<f64>,
	pub max_group_price: f64,
	/// Confirmed share of the fill target in percent, one decimal.
	pub progress: f32,
}

pub fn group_fill_state(
	tour: &Tour,
	fill: &FillSnapshot,
	pricing: Option<&GroupFillPricing>,
) -> Option<GroupFillState> {
	let pricing = pricing?;
	let target_count = tour.fill_target();
	let fill_ratio = (f64::from(fill.confirmed_headcount) / f64::from(target_count)).min(1.0);
	let dynamic_price = round_cents(tour.base_price * (1.0 - pricing.max_discount * fill_ratio));
	let max_group_price = round_cents(tour.base_price * (1.0 - pricing.max_discount));

	Some(GroupFillState { target_count, dynamic_price, max_group_price })
}

pub fn effective_price(tour: &Tour, state: Option<&GroupFillState>) -> f64 {
	state.map(|state| state.dynamic_price).unwrap_or(tour.base_price)
}

pub fn max_group_price(tour: &Tour, state: Option<&GroupFillState>) -> f64 {
	state.map(|state| state.max_group_price).unwrap_or(tour.base_price)
}

pub fn fill_progress(tour: &Tour, fill: &FillSnapshot) -> f32 {
	let percent = f64::from(fill.confirmed_headcount) / f64::from(tour.fill_target()) * 100.0;

	((percent * 10.0).round() / 10.0) as f32
}

pub fn quote(tour: &Tour, fill: &FillSnapshot, pricing: Option<&GroupFillPricing>) -> PriceQuote {
	let state = group_fill_state(tour, fill, pricing);

	PriceQuote {
		base_price: tour.base_price,
		effective_price: effective_price(tour, state.as_ref()),
		dynamic_price: state.map(|state| state.dynamic_price),
		max_group_price: max_group_price(tour, state.as_ref()),
		progress: fill_progress(tour, fill),
	}
}

fn round_cents(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

//! Seat accounting and the admission check a store runs inside its per-tour critical section.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	booking::{Booking, BookingStatus, MAX_HEADCOUNT, MIN_HEADCOUNT},
	pricing,
	tour::{Tour, TourStatus},
};
use sharetrip_config::GroupFillPricing;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FillSnapshot {
	pub confirmed_headcount: u32,
	pub pending_headcount: u32,
}
impl FillSnapshot {
	/// Derives fill counts from a tour's booking ledger.
	pub fn from_ledger(ledger: &[Booking]) -> Self {
		let mut fill = Self::default();

		for booking in ledger {
			match booking.status {
				BookingStatus::Confirmed => fill.confirmed_headcount += booking.headcount,
				BookingStatus::Pending => fill.pending_headcount += booking.headcount,
				BookingStatus::Cancelled | BookingStatus::Completed => {},
			}
		}

		fill
	}

	pub fn occupied(&self) -> u32 {
		self.confirmed_headcount + self.pending_headcount
	}

	pub fn spots_left(&self, max_group: u32) -> u32 {
		max_group.saturating_sub(self.occupied())
	}
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AdmissionError {
	#[error("Headcount must be between {MIN_HEADCOUNT} and {MAX_HEADCOUNT}, got {headcount}.")]
	InvalidHeadcount { headcount: u32 },
	#[error("Tour is not open for booking (status '{status}').")]
	TourNotBookable { status: TourStatus },
	#[error("Traveler already holds an active booking {booking_id} on this tour.")]
	DuplicateBooking { booking_id: Uuid },
	#[error("Only {spots_left} spots left on this tour; requested {requested}.")]
	CapacityExceeded { spots_left: u32, requested: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Admission {
	pub status: BookingStatus,
	pub unit_price: f64,
	pub price_at_booking: f64,
}

pub fn validate_headcount(headcount: u32) -> Result<(), AdmissionError> {
	if (MIN_HEADCOUNT..=MAX_HEADCOUNT).contains(&headcount) {
		Ok(())
	} else {
		Err(AdmissionError::InvalidHeadcount { headcount })
	}
}

/// Decides whether `traveler_id` may take `headcount` seats given the tour's full ledger.
///
/// Callers must hold the tour's write lock from reading `ledger` until the resulting booking is
/// persisted, otherwise two admissions can both see the same free seats.
pub fn admit(
	tour: &Tour,
	ledger: &[Booking],
	traveler_id: Uuid,
	headcount: u32,
	pricing: Option<&GroupFillPricing>,
) -> Result<Admission, AdmissionError> {
	validate_headcount(headcount)?;

	if tour.status != TourStatus::Active {
		return Err(AdmissionError::TourNotBookable { status: tour.status });
	}

	if let Some(existing) = ledger
		.iter()
		.find(|booking| booking.traveler_id == traveler_id && booking.status.holds_seats())
	{
		return Err(AdmissionError::DuplicateBooking { booking_id: existing.booking_id });
	}

	let fill = FillSnapshot::from_ledger(ledger);
	let spots_left = fill.spots_left(tour.max_group);

	if headcount > spots_left {
		return Err(AdmissionError::CapacityExceeded { spots_left, requested: headcount });
	}

	let state = pricing::group_fill_state(tour, &fill, pricing);
	let unit_price = pricing::effective_price(tour, state.as_ref());
	let status = if tour.instant_book { BookingStatus::Confirmed } else { BookingStatus::Pending };

	Ok(Admission {
		status,
		unit_price,
		price_at_booking: (unit_price * f64::from(headcount) * 100.0).round() / 100.0,
	})
}

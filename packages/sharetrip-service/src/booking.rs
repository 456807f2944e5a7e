use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{BookingDraft, ConflictKind, Error, Result, SharetripService};
use sharetrip_domain::{
	booking::{ActorRole, Booking, BookingStatus, authorize_transition},
	capacity,
};

pub const INSTANT_CONFIRMED_MESSAGE: &str = "Booking confirmed instantly.";
pub const PENDING_APPROVAL_MESSAGE: &str =
	"Booking request sent. The host will confirm or decline it.";

#[derive(Clone, Debug, Deserialize)]
pub struct BookingRequest {
	pub tour_id: Uuid,
	pub headcount: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookingResult {
	pub success: bool,
	pub booking: Booking,
	pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusUpdateRequest {
	pub status: String,
}

impl SharetripService {
	pub async fn create_booking(
		&self,
		traveler_id: Uuid,
		req: BookingRequest,
	) -> Result<BookingResult> {
		capacity::validate_headcount(req.headcount)?;

		let draft = BookingDraft {
			tour_id: req.tour_id,
			traveler_id,
			headcount: req.headcount,
			pricing: self.cfg.pricing.group_fill.clone(),
			now: OffsetDateTime::now_utc(),
		};
		let booking = match self.stores.tours.commit_booking(&draft).await {
			Ok(booking) => booking,
			Err(err) => {
				tracing::info!(
					error = %err,
					tour_id = %req.tour_id,
					traveler_id = %traveler_id,
					headcount = req.headcount,
					"Booking rejected."
				);

				return Err(err);
			},
		};

		tracing::info!(
			booking_id = %booking.booking_id,
			tour_id = %booking.tour_id,
			headcount = booking.headcount,
			status = %booking.status,
			"Booking committed."
		);

		let message = match booking.status {
			BookingStatus::Confirmed => INSTANT_CONFIRMED_MESSAGE,
			_ => PENDING_APPROVAL_MESSAGE,
		};

		Ok(BookingResult { success: true, booking, message: message.to_string() })
	}

	pub async fn transition_booking(
		&self,
		booking_id: Uuid,
		actor_id: Uuid,
		req: StatusUpdateRequest,
	) -> Result<Booking> {
		let requested = BookingStatus::parse(&req.status).ok_or_else(|| {
			Error::invalid_at("$.status", format!("unknown booking status '{}'.", req.status))
		})?;
		let booking = self.stores.tours.booking(booking_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Booking {booking_id} does not exist."),
		})?;
		let tour = self.stores.tours.tour(booking.tour_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Tour {} does not exist.", booking.tour_id),
		})?;
		let role = ActorRole::resolve(actor_id, tour.tour.host_id, booking.traveler_id);

		authorize_transition(booking.status, requested, role)?;

		let updated = self
			.stores
			.tours
			.update_booking_status(booking_id, booking.status, requested, OffsetDateTime::now_utc())
			.await?
			.ok_or_else(|| {
				Error::conflict(
					ConflictKind::StaleStatus,
					format!(
						"Booking {booking_id} is no longer '{}'; reload it and retry.",
						booking.status
					),
				)
			})?;

		tracing::info!(
			booking_id = %booking_id,
			from = %booking.status,
			to = %updated.status,
			role = %role,
			"Booking status changed."
		);

		Ok(updated)
	}
}

//! Booking records and the status state machine.
//!
//! Transition rules:
//! - `pending`   -> `confirmed` (host only), `cancelled` (host or traveler)
//! - `confirmed` -> `completed` (host only), `cancelled` (host or traveler)
//! - `cancelled`, `completed` are terminal

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MIN_HEADCOUNT: u32 = 1;
pub const MAX_HEADCOUNT: u32 = 20;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
	Pending,
	Confirmed,
	Cancelled,
	Completed,
}
impl BookingStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Confirmed => "confirmed",
			Self::Cancelled => "cancelled",
			Self::Completed => "completed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"pending" => Some(Self::Pending),
			"confirmed" => Some(Self::Confirmed),
			"cancelled" => Some(Self::Cancelled),
			"completed" => Some(Self::Completed),
			_ => None,
		}
	}

	/// Pending and confirmed bookings hold seats.
	pub fn holds_seats(self) -> bool {
		matches!(self, Self::Pending | Self::Confirmed)
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Cancelled | Self::Completed)
	}

	pub fn allowed_next(self) -> &'static [BookingStatus] {
		match self {
			Self::Pending => &[Self::Confirmed, Self::Cancelled],
			Self::Confirmed => &[Self::Completed, Self::Cancelled],
			Self::Cancelled | Self::Completed => &[],
		}
	}
}

impl Display for BookingStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
	Host,
	Traveler,
	Other,
}
impl ActorRole {
	/// A host booking their own tour acts as the host.
	pub fn resolve(actor_id: Uuid, host_id: Uuid, traveler_id: Uuid) -> Self {
		if actor_id == host_id {
			Self::Host
		} else if actor_id == traveler_id {
			Self::Traveler
		} else {
			Self::Other
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Host => "host",
			Self::Traveler => "traveler",
			Self::Other => "other",
		}
	}
}

impl Display for ActorRole {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
	#[error("Cannot move booking from '{current}' to '{requested}'.")]
	Illegal { current: BookingStatus, requested: BookingStatus },
	#[error("A {role} may not move booking from '{current}' to '{requested}'.")]
	Unauthorized { current: BookingStatus, requested: BookingStatus, role: ActorRole },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Booking {
	pub booking_id: Uuid,
	pub tour_id: Uuid,
	pub traveler_id: Uuid,
	pub headcount: u32,
	/// Fixed at commit; status changes never touch it.
	pub price_at_booking: f64,
	pub currency: String,
	pub status: BookingStatus,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

pub fn authorize_transition(
	current: BookingStatus,
	requested: BookingStatus,
	role: ActorRole,
) -> Result<(), TransitionError> {
	if !current.allowed_next().contains(&requested) {
		return Err(TransitionError::Illegal { current, requested });
	}

	let permitted = match requested {
		BookingStatus::Confirmed | BookingStatus::Completed => role == ActorRole::Host,
		BookingStatus::Cancelled => matches!(role, ActorRole::Host | ActorRole::Traveler),
		BookingStatus::Pending => false,
	};

	if !permitted {
		return Err(TransitionError::Unauthorized { current, requested, role });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use uuid::Uuid;

	use crate::booking::{ActorRole, BookingStatus, TransitionError, authorize_transition};

	const ALL: [BookingStatus; 4] = [
		BookingStatus::Pending,
		BookingStatus::Confirmed,
		BookingStatus::Cancelled,
		BookingStatus::Completed,
	];

	#[test]
	fn only_host_confirms_pending() {
		assert!(
			authorize_transition(BookingStatus::Pending, BookingStatus::Confirmed, ActorRole::Host)
				.is_ok()
		);

		for role in [ActorRole::Traveler, ActorRole::Other] {
			let err =
				authorize_transition(BookingStatus::Pending, BookingStatus::Confirmed, role)
					.expect_err("non-host confirm must fail");

			assert!(matches!(err, TransitionError::Unauthorized { .. }));
		}
	}

	#[test]
	fn traveler_and_host_may_cancel_active_bookings() {
		for current in [BookingStatus::Pending, BookingStatus::Confirmed] {
			for role in [ActorRole::Host, ActorRole::Traveler] {
				assert!(authorize_transition(current, BookingStatus::Cancelled, role).is_ok());
			}

			assert!(
				authorize_transition(current, BookingStatus::Cancelled, ActorRole::Other).is_err()
			);
		}
	}

	#[test]
	fn terminal_states_reject_everything() {
		for current in [BookingStatus::Cancelled, BookingStatus::Completed] {
			for requested in ALL {
				let err = authorize_transition(current, requested, ActorRole::Host)
					.expect_err("terminal state must not move");

				assert_eq!(err, TransitionError::Illegal { current, requested });
			}
		}
	}

	#[test]
	fn illegal_transition_names_both_states() {
		let err = authorize_transition(
			BookingStatus::Pending,
			BookingStatus::Completed,
			ActorRole::Host,
		)
		.expect_err("pending cannot complete");

		assert_eq!(err.to_string(), "Cannot move booking from 'pending' to 'completed'.");
	}

	#[test]
	fn actor_role_prefers_host() {
		let host = Uuid::new_v4();
		let traveler = Uuid::new_v4();

		assert_eq!(ActorRole::resolve(host, host, traveler), ActorRole::Host);
		assert_eq!(ActorRole::resolve(traveler, host, traveler), ActorRole::Traveler);
		assert_eq!(ActorRole::resolve(Uuid::new_v4(), host, traveler), ActorRole::Other);
		assert_eq!(ActorRole::resolve(host, host, host), ActorRole::Host);
	}
}

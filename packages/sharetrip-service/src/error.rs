use sharetrip_domain::{booking::TransitionError, capacity::AdmissionError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConflictKind {
	CapacityExceeded,
	DuplicateBooking,
	TourNotBookable,
	IllegalTransition,
	UnauthorizedTransition,
	StaleStatus,
}
impl ConflictKind {
	pub fn code(self) -> &'static str {
		match self {
			Self::CapacityExceeded => "CAPACITY_EXCEEDED",
			Self::DuplicateBooking => "DUPLICATE_BOOKING",
			Self::TourNotBookable => "TOUR_NOT_BOOKABLE",
			Self::IllegalTransition => "ILLEGAL_TRANSITION",
			Self::UnauthorizedTransition => "UNAUTHORIZED_TRANSITION",
			Self::StaleStatus => "STALE_STATUS",
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { kind: ConflictKind, message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid_at(path: &str, message: impl std::fmt::Display) -> Self {
		Self::InvalidRequest { message: format!("{path}: {message}") }
	}

	pub(crate) fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
		Self::Conflict { kind, message: message.into() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<sharetrip_storage::Error> for Error {
	fn from(err: sharetrip_storage::Error) -> Self {
		match err {
			sharetrip_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			sharetrip_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			sharetrip_storage::Error::NotFound(message) => Self::NotFound { message },
			// The only storage-level conflict is the one-active-booking unique index.
			sharetrip_storage::Error::Conflict(message) =>
				Self::conflict(ConflictKind::DuplicateBooking, message),
		}
	}
}

impl From<AdmissionError> for Error {
	fn from(err: AdmissionError) -> Self {
		let message = err.to_string();

		match err {
			AdmissionError::InvalidHeadcount { .. } =>
				Self::InvalidRequest { message: format!("$.headcount: {message}") },
			AdmissionError::TourNotBookable { .. } =>
				Self::conflict(ConflictKind::TourNotBookable, message),
			AdmissionError::DuplicateBooking { .. } =>
				Self::conflict(ConflictKind::DuplicateBooking, message),
			AdmissionError::CapacityExceeded { .. } =>
				Self::conflict(ConflictKind::CapacityExceeded, message),
		}
	}
}

impl From<TransitionError> for Error {
	fn from(err: TransitionError) -> Self {
		let kind = match err {
			TransitionError::Illegal { .. } => ConflictKind::IllegalTransition,
			TransitionError::Unauthorized { .. } => ConflictKind::UnauthorizedTransition,
		};

		Self::conflict(kind, err.to_string())
	}
}

use axum::{
	Json, Router,
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;
use sharetrip_domain::booking::Booking;
use sharetrip_service::{
	BookingRequest, BookingResult, Error, SearchRequest, SearchResponse, StatusUpdateRequest,
};

/// Caller identity. Authentication happens upstream; the gateway forwards the user id here.
pub const USER_ID_HEADER: &str = "x-sharetrip-user-id";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/tours/search", post(search))
		.route("/v1/bookings", post(create_booking))
		.route("/v1/bookings/{booking_id}/status", post(update_booking_status))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let user_id = optional_user_id(&headers)?;
	let response = state.service.search(user_id, payload).await?;

	Ok(Json(response))
}

async fn create_booking(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResult>), ApiError> {
	let traveler_id = required_user_id(&headers)?;
	let response = state.service.create_booking(traveler_id, payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn update_booking_status(
	State(state): State<AppState>,
	Path(booking_id): Path<Uuid>,
	headers: HeaderMap,
	Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<Booking>, ApiError> {
	let actor_id = required_user_id(&headers)?;
	let response = state.service.transition_booking(booking_id, actor_id, payload).await?;

	Ok(Json(response))
}

fn optional_user_id(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
	let Some(raw) = headers.get(USER_ID_HEADER) else {
		return Ok(None);
	};
	let parsed = raw.to_str().ok().and_then(|raw| Uuid::parse_str(raw.trim()).ok());

	match parsed {
		Some(user_id) => Ok(Some(user_id)),
		None => Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{USER_ID_HEADER} must be a UUID."),
		)),
	}
}

fn required_user_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
	optional_user_id(headers)?.ok_or_else(|| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{USER_ID_HEADER} header is required."),
		)
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Conflict { kind, message } =>
				json_error(StatusCode::CONFLICT, kind.code(), message),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage failure while serving request.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Storage is unavailable. Retry later.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

//! JSON envelopes and error responses returned by gateway routes.

// std
use std::borrow::Cow;
// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Value, json};
// self
use crate::_prelude::*;

/// Result type returned by gateway handlers.
pub type ApiResult<T = Envelope> = Result<T, ApiError>;

/// Successful proxy response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
	/// `{"data": ...}`.
	Data(Value),
	/// `{"status": 200}` for commands without a payload.
	Done,
}
impl Envelope {
	/// `{"data": []}`, used when an optional read cannot reach its upstream.
	pub fn empty_list() -> Self {
		Self::Data(Value::Array(Vec::new()))
	}
}
impl IntoResponse for Envelope {
	fn into_response(self) -> Response {
		let body = match self {
			Envelope::Data(data) => json!({ "data": data }),
			Envelope::Done => json!({ "status": 200 }),
		};

		(StatusCode::OK, Json(body)).into_response()
	}
}

/// Error response produced by gateway routes.
#[derive(Debug)]
pub enum ApiError {
	/// Temporary redirect to the sign-in route, optionally expiring the session cookie.
	SignIn {
		/// Redirect target.
		location: String,
		/// Removal cookie for a session that can no longer be used.
		clear_cookie: Option<Cookie<'static>>,
	},
	/// `{"error": message, "details"?: text}` with `status`.
	Json {
		/// Response status.
		status: StatusCode,
		/// Short description of what failed.
		message: Cow<'static, str>,
		/// Upstream body or underlying error text.
		details: Option<String>,
	},
}
impl ApiError {
	/// Builds a JSON error without details.
	pub fn json(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
		Self::Json { status, message: message.into(), details: None }
	}

	/// Maps a gateway error onto a response, labeling upstream and internal failures with
	/// `context`.
	///
	/// Session errors map onto `401` here; routes with access to the gateway state turn them
	/// into sign-in redirects instead.
	pub fn from_error(err: Error, context: &'static str) -> Self {
		match err {
			Error::InvalidRequest { status, reason } => Self::json(
				StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
				reason,
			),
			Error::Upstream { status, details } => Self::Json {
				status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
				message: context.into(),
				details: (!details.is_empty()).then_some(details),
			},
			Error::Unauthenticated | Error::ReauthenticationRequired | Error::UpstreamUnauthorized =>
				Self::json(StatusCode::UNAUTHORIZED, "Unauthorized"),
			Error::InvalidGrant { reason } => Self::Json {
				status: StatusCode::BAD_REQUEST,
				message: "Sign-in failed.".into(),
				details: Some(reason),
			},
			other => {
				tracing::error!(error = %other, "request failed");

				Self::Json {
					status: StatusCode::INTERNAL_SERVER_ERROR,
					message: context.into(),
					details: Some(other.to_string()),
				}
			},
		}
	}

	/// Returns the response status.
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::SignIn { .. } => StatusCode::TEMPORARY_REDIRECT,
			ApiError::Json { status, .. } => *status,
		}
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		Self::from_error(err, "Backend error")
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		match self {
			ApiError::SignIn { location, clear_cookie } => {
				let jar = match clear_cookie {
					Some(cookie) => CookieJar::new().add(cookie),
					None => CookieJar::new(),
				};

				(jar, Redirect::temporary(&location)).into_response()
			},
			ApiError::Json { status, message, details } => {
				let body = match details {
					Some(details) => json!({ "error": message, "details": details }),
					None => json!({ "error": message }),
				};

				(status, Json(body)).into_response()
			},
		}
	}
}

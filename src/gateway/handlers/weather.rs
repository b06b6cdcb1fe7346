//! Weather forecast route.

// crates.io
use axum::{
	extract::{Query, State},
	http::StatusCode,
};
// self
use crate::{
	_prelude::*,
	gateway::{ApiError, ApiResult, AppState, Envelope, RequiredSession},
	upstream::WeatherApi,
};

const CONTEXT: &str = "Error while making GET-request to Weather API";

/// Coordinates of the requested forecast.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ForecastQuery {
	latitude: Option<String>,
	longitude: Option<String>,
}

/// `GET /api/weather-api?latitude&longitude`.
///
/// Requires a session like every other route, but the weather API itself is key
/// authenticated, so no bearer token leaves the gateway and a `401` from it is an upstream
/// failure rather than a reason to sign in again.
pub async fn forecast(
	State(state): State<AppState>,
	_session: RequiredSession,
	Query(query): Query<ForecastQuery>,
) -> ApiResult {
	let (Some(latitude), Some(longitude)) = (non_empty(query.latitude), non_empty(query.longitude))
	else {
		return Err(ApiError::json(StatusCode::BAD_REQUEST, "latitude and longitude are required"));
	};
	let api = WeatherApi::new(&state.config.services.weather, state.config.weather_api_key.as_deref());
	let request = api.forecast(&latitude, &longitude).map_err(|e| state.reject(e, CONTEXT))?;

	match state.upstream.send(request, None).await {
		Ok(reply) => Ok(Envelope::Data(reply.body)),
		Err(Error::UpstreamUnauthorized) => Err(ApiError::from_error(
			Error::Upstream { status: 401, details: "Weather API rejected the key.".into() },
			CONTEXT,
		)),
		Err(e) => Err(state.reject(e, CONTEXT)),
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

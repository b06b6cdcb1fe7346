//! Soil diagnosis route.

// crates.io
use axum::{Json, extract::State};
use serde_json::Value;
// self
use crate::{
	gateway::{ApiResult, AppState, Envelope, RequiredSession},
	upstream::DiagnosisApi,
};

/// `POST /api/dirt-diagnosis` with the soil-feature document.
pub async fn predict(
	State(state): State<AppState>,
	session: RequiredSession,
	Json(features): Json<Value>,
) -> ApiResult {
	let api = DiagnosisApi::new(&state.config.services.diagnosis);
	let reply = state
		.forward(
			api.predict(features),
			Some(session.bearer()),
			"Error while making POST-request to service.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

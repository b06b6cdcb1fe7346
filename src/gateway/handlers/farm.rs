//! Farm-field routes: fields, markers, seasons, and field members.

// crates.io
use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	gateway::{ApiError, ApiResult, AppState, Envelope, RequiredSession, handlers::PageQuery},
	upstream::FarmApi,
};

/// Query naming the user whose field membership changes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MemberQuery {
	#[serde(rename = "userId")]
	user_id: Option<String>,
}
impl MemberQuery {
	fn user_id(self) -> Result<String, ApiError> {
		self.user_id
			.filter(|id| !id.trim().is_empty())
			.ok_or_else(|| ApiError::json(StatusCode::BAD_REQUEST, "userId search parameter is mandatory"))
	}
}

/// `GET /api/farm/fields`.
pub async fn fields(State(state): State<AppState>, session: RequiredSession) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);
	let reply =
		state.forward(api.fields(), Some(session.bearer()), "Error while fetching fields.").await?;

	Ok(Envelope::Data(reply.body))
}

/// `POST /api/farm/fields`.
pub async fn create_field(
	State(state): State<AppState>,
	session: RequiredSession,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state.forward(api.create_field(body), Some(session.bearer()), "Backend error").await?;

	Ok(Envelope::Done)
}

/// `GET /api/farm/fields/{id}`.
pub async fn field(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);
	let reply = state
		.forward(
			api.field(&field_id),
			Some(session.bearer()),
			"Something went wrong while fetching the field.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `DELETE /api/farm/fields/{id}`.
pub async fn delete_field(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(api.delete_field(&field_id), Some(session.bearer()), "Error while deleting field.")
		.await?;

	Ok(Envelope::Done)
}

/// `POST /api/farm/fields/{id}/markers`.
pub async fn create_marker(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(api.create_marker(&field_id, body), Some(session.bearer()), "Backend error")
		.await?;

	Ok(Envelope::Done)
}

/// `DELETE /api/farm/fields/{id}/markers/{markerId}`.
pub async fn delete_marker(
	State(state): State<AppState>,
	session: RequiredSession,
	Path((field_id, marker_id)): Path<(String, String)>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(
			api.delete_marker(&field_id, &marker_id),
			Some(session.bearer()),
			"Error while deleting marker.",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `GET /api/farm/fields/{id}/seasons?page`.
pub async fn seasons(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
	Query(query): Query<PageQuery>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);
	let reply = state
		.forward(
			api.seasons(&field_id, query.page()),
			Some(session.bearer()),
			"Error while fetching field seasons.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `POST /api/farm/fields/{id}/seasons`.
pub async fn create_season(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(
			api.create_season(&field_id, body),
			Some(session.bearer()),
			"Error while creating field season.",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `PUT /api/farm/fields/{id}/seasons/{seasonId}`.
pub async fn update_season(
	State(state): State<AppState>,
	session: RequiredSession,
	Path((field_id, season_id)): Path<(String, String)>,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(
			api.update_season(&field_id, &season_id, body),
			Some(session.bearer()),
			"Error while updating field season.",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `DELETE /api/farm/fields/{id}/seasons/{seasonId}`.
pub async fn delete_season(
	State(state): State<AppState>,
	session: RequiredSession,
	Path((field_id, season_id)): Path<(String, String)>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(
			api.delete_season(&field_id, &season_id),
			Some(session.bearer()),
			"Error while deleting field season.",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `GET /api/farm/fields/{id}/users`.
pub async fn members(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
) -> ApiResult {
	let api = FarmApi::new(&state.config.services.farm);
	let reply = state
		.forward(
			api.members(&field_id),
			Some(session.bearer()),
			"Error while fetching field users.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `POST /api/farm/fields/{id}/users?userId`.
pub async fn add_member(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
	Query(query): Query<MemberQuery>,
) -> ApiResult {
	let user_id = query.user_id()?;
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(
			api.add_member(&field_id, &user_id),
			Some(session.bearer()),
			"Error while adding field user.",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `DELETE /api/farm/fields/{id}/users?userId`.
pub async fn remove_member(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(field_id): Path<String>,
	Query(query): Query<MemberQuery>,
) -> ApiResult {
	let user_id = query.user_id()?;
	let api = FarmApi::new(&state.config.services.farm);

	state
		.forward(
			api.remove_member(&field_id, &user_id),
			Some(session.bearer()),
			"Error while removing field user.",
		)
		.await?;

	Ok(Envelope::Done)
}

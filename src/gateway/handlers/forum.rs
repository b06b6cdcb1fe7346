//! Forum routes: questions, answers, votes, and tags.

// crates.io
use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	gateway::{
		ApiError, ApiResult, AppState, Envelope, OptionalSession, RequiredSession,
		handlers,
	},
	upstream::{ForumApi, VoteType},
};

/// Query accepted by the question listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuestionsQuery {
	#[serde(default, deserialize_with = "handlers::lenient_page")]
	page: Option<u32>,
	#[serde(rename = "tagId")]
	tag_id: Option<String>,
}

/// Query accepted by the vote route.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VoteQuery {
	#[serde(rename = "voteType")]
	vote_type: Option<String>,
}

/// `GET /api/forum/questions`.
pub async fn list_questions(
	State(state): State<AppState>,
	session: RequiredSession,
	Query(query): Query<QuestionsQuery>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(
			api.list_questions(query.page.unwrap_or(0), query.tag_id.as_deref()),
			Some(session.bearer()),
			"Error while fetching questions.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `POST /api/forum/questions`; answers with the new question's id.
pub async fn create_question(
	State(state): State<AppState>,
	session: RequiredSession,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(
			api.create_question(body),
			Some(session.bearer()),
			"Error while uploading question to backend.",
		)
		.await?;

	Ok(Envelope::Data(json!({ "questionId": reply.body.get("id").cloned().unwrap_or(Value::Null) })))
}

/// `GET /api/forum/questions/{id}`.
pub async fn question(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(question_id): Path<String>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(api.question(&question_id), Some(session.bearer()), "Error while fetching question.")
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `GET /api/forum/questions/{id}/answers`; readable without a session.
pub async fn answers(
	State(state): State<AppState>,
	session: OptionalSession,
	Path(question_id): Path<String>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);

	state.forward_list(api.answers(&question_id), session.bearer(), "Error while fetching answers.").await
}

/// `POST /api/forum/questions/{id}/answers`.
pub async fn create_answer(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(question_id): Path<String>,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(
			api.create_answer(&question_id, body),
			Some(session.bearer()),
			"Error while uploading answer to backend.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `DELETE /api/forum/questions/{id}/answers/{answerId}`.
pub async fn delete_answer(
	State(state): State<AppState>,
	session: RequiredSession,
	Path((question_id, answer_id)): Path<(String, String)>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);

	state
		.forward(
			api.delete_answer(&question_id, &answer_id),
			Some(session.bearer()),
			"Error while deleting answer.",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `POST /api/forum/questions/{id}/votes?voteType=UP|DOWN`.
///
/// The vote type is validated before the session is resolved, so malformed votes are refused
/// with `403` even for anonymous callers.
pub async fn vote(
	State(state): State<AppState>,
	jar: CookieJar,
	Path(question_id): Path<String>,
	Query(query): Query<VoteQuery>,
) -> ApiResult {
	let vote = match query.vote_type.as_deref() {
		None => {
			return Err(ApiError::json(
				StatusCode::FORBIDDEN,
				"voteType search parameter is mandatory",
			));
		},
		Some(raw) => raw.parse::<VoteType>().map_err(ApiError::from)?,
	};
	let session = RequiredSession::resolve(&state, &jar).await?;
	let api = ForumApi::new(&state.config.services.forum);

	state.forward(api.vote(&question_id, vote), Some(session.bearer()), "Backend error").await?;

	Ok(Envelope::Done)
}

/// `DELETE /api/forum/questions/{id}/votes`.
pub async fn delete_vote(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(question_id): Path<String>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);

	state.forward(api.delete_vote(&question_id), Some(session.bearer()), "Backend error").await?;

	Ok(Envelope::Done)
}

/// `GET /api/forum/tags`.
pub async fn tags(State(state): State<AppState>, session: RequiredSession) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply =
		state.forward(api.tags(), Some(session.bearer()), "Error while fetching tags.").await?;

	Ok(Envelope::Data(reply.body))
}

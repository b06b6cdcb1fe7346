//! Blog routes: posts and their comments, served by the forum service.

// crates.io
use axum::{
	Json,
	extract::{Path, State},
};
use serde_json::Value;
// self
use crate::{
	gateway::{ApiResult, AppState, Envelope, OptionalSession, RequiredSession},
	upstream::ForumApi,
};

/// `GET /api/blog/posts`; readable without a session.
pub async fn posts(State(state): State<AppState>, session: OptionalSession) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply =
		state.forward(api.posts(), session.bearer(), "Error while fetching posts.").await?;

	Ok(Envelope::Data(reply.body))
}

/// `POST /api/blog/posts`.
pub async fn create_post(
	State(state): State<AppState>,
	session: RequiredSession,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(api.create_post(body), Some(session.bearer()), "Error while uploading post.")
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `GET /api/blog/posts/{id}`.
pub async fn post(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(post_id): Path<String>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(api.post(&post_id), Some(session.bearer()), "Error while fetching post.")
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `GET /api/blog/posts/{id}/comments`; readable without a session.
pub async fn comments(
	State(state): State<AppState>,
	session: OptionalSession,
	Path(post_id): Path<String>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);

	state.forward_list(api.comments(&post_id), session.bearer(), "Error while fetching comments.").await
}

/// `POST /api/blog/posts/{id}/comments`.
pub async fn create_comment(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(post_id): Path<String>,
	Json(body): Json<Value>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);
	let reply = state
		.forward(
			api.create_comment(&post_id, body),
			Some(session.bearer()),
			"Error while uploading comment.",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `DELETE /api/blog/posts/{id}/comments/{commentId}`.
pub async fn delete_comment(
	State(state): State<AppState>,
	session: RequiredSession,
	Path((post_id, comment_id)): Path<(String, String)>,
) -> ApiResult {
	let api = ForumApi::new(&state.config.services.forum);

	state
		.forward(
			api.delete_comment(&post_id, &comment_id),
			Some(session.bearer()),
			"Error while deleting comment.",
		)
		.await?;

	Ok(Envelope::Done)
}

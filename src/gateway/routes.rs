//! Route table.

// crates.io
use axum::{
	Router, middleware,
	http::StatusCode,
	routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;
// self
use crate::gateway::{
	ApiError, AppState, guard,
	handlers::{auth, blog, diagnosis, farm, forum, images, weather},
};

/// Builds the gateway router with tracing and the protected-page guard applied.
pub fn router(state: AppState) -> Router {
	let auth = Router::new()
		.route("/signin", get(auth::sign_in))
		.route("/callback", get(auth::callback))
		.route("/signout", post(auth::sign_out))
		.route("/session", get(auth::session));
	let forum = Router::new()
		.route("/questions", get(forum::list_questions).post(forum::create_question))
		.route("/questions/{question_id}", get(forum::question))
		.route("/questions/{question_id}/answers", get(forum::answers).post(forum::create_answer))
		.route("/questions/{question_id}/answers/{answer_id}", delete(forum::delete_answer))
		.route("/questions/{question_id}/votes", post(forum::vote).delete(forum::delete_vote))
		.route("/tags", get(forum::tags));
	let blog = Router::new()
		.route("/posts", get(blog::posts).post(blog::create_post))
		.route("/posts/{post_id}", get(blog::post))
		.route("/posts/{post_id}/comments", get(blog::comments).post(blog::create_comment))
		.route("/posts/{post_id}/comments/{comment_id}", delete(blog::delete_comment));
	let farm = Router::new()
		.route("/fields", get(farm::fields).post(farm::create_field))
		.route("/fields/{field_id}", get(farm::field).delete(farm::delete_field))
		.route("/fields/{field_id}/markers", post(farm::create_marker))
		.route("/fields/{field_id}/markers/{marker_id}", delete(farm::delete_marker))
		.route("/fields/{field_id}/seasons", get(farm::seasons).post(farm::create_season))
		.route(
			"/fields/{field_id}/seasons/{season_id}",
			put(farm::update_season).delete(farm::delete_season),
		)
		.route(
			"/fields/{field_id}/users",
			get(farm::members).post(farm::add_member).delete(farm::remove_member),
		);
	let api = Router::new()
		.nest("/auth", auth)
		.nest("/forum", forum)
		.nest("/blog", blog)
		.nest("/farm", farm)
		.route("/images", get(images::list))
		.route("/images/{image_id}", delete(images::delete))
		.route("/classify", post(images::classify))
		.route("/dirt-diagnosis", post(diagnosis::predict))
		.route("/weather-api", get(weather::forecast));

	Router::new()
		.route("/healthz", get(healthz))
		.nest("/api", api)
		.fallback(not_found)
		.layer(middleware::from_fn_with_state(state.clone(), guard::require_session))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn healthz() -> &'static str {
	"ok"
}

async fn not_found() -> ApiError {
	ApiError::json(StatusCode::NOT_FOUND, "Not found")
}

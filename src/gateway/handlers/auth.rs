//! Sign-in, callback, sign-out, and session status routes.

// crates.io
use axum::{
	Json,
	extract::{Query, State},
	http::{StatusCode, header::LOCATION},
	response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
// self
use crate::{
	_prelude::*,
	flows::{SessionStatusView, sanitize_return_to},
	gateway::{ApiError, ApiResult, AppState, session},
};

/// Query accepted by the sign-in route.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignInQuery {
	/// Page to return to after signing in; absolute URLs on this origin are accepted.
	#[serde(rename = "callbackUrl")]
	pub callback_url: Option<String>,
	/// `login` forces the identity provider to prompt for credentials.
	pub prompt: Option<String>,
}

/// Query delivered by the identity provider to the callback route.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
	/// Authorization code.
	pub code: Option<String>,
	/// State issued at sign-in.
	pub state: Option<String>,
	/// OAuth error code when the user or provider aborted the sign-in.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
}

/// `GET /api/auth/signin`: redirects to the identity provider's authorize endpoint.
///
/// The issued state is also written to a handshake cookie so the callback only completes in the
/// browser that started the sign-in.
pub async fn sign_in(
	State(state): State<AppState>,
	jar: CookieJar,
	Query(query): Query<SignInQuery>,
) -> ApiResult<Response> {
	let return_to = local_return_to(&state.config.public_url, query.callback_url.as_deref());
	let force_login = query.prompt.as_deref() == Some("login");
	let redirect = state
		.broker
		.begin_sign_in(&return_to, force_login)
		.await
		.map_err(|e| state.reject(e, "Unable to start sign-in."))?;

	let jar = jar.add(state.handshake_cookie(&redirect.state));

	Ok((jar, found(redirect.authorize_url.as_str())).into_response())
}

/// `GET /api/auth/callback`: completes the sign-in and sets the session cookie.
pub async fn callback(
	State(state): State<AppState>,
	jar: CookieJar,
	Query(query): Query<CallbackQuery>,
) -> ApiResult<Response> {
	if let Some(error) = query.error {
		tracing::info!(error = %error, "identity provider returned a sign-in error");

		return Err(ApiError::Json {
			status: StatusCode::BAD_REQUEST,
			message: "Sign-in was rejected by the identity provider.".into(),
			details: Some(query.error_description.unwrap_or(error)),
		});
	}

	let (Some(code), Some(handshake)) = (query.code, query.state) else {
		return Err(ApiError::json(StatusCode::BAD_REQUEST, "Missing code or state."));
	};

	// The pending sign-in is only consumed by the browser holding its handshake cookie.
	if !session::handshake_matches(&jar, &state.config.cookie, &handshake) {
		tracing::warn!("sign-in callback arrived without a matching handshake cookie");

		return Err(ApiError::json(
			StatusCode::BAD_REQUEST,
			"Sign-in state does not match this browser.",
		));
	}

	let completed = state
		.broker
		.complete_sign_in(&handshake, &code)
		.await
		.map_err(|e| state.reject(e, "Unable to complete sign-in."))?;
	let jar = jar
		.add(state.session_cookie(&completed.session.session_id))
		.add(state.handshake_removal_cookie());

	Ok((jar, found(&completed.return_to)).into_response())
}

/// `POST /api/auth/signout`: ends the session locally and at the identity provider.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Response> {
	if let Some(session_id) = session::session_id_from(&jar, &state.config.cookie.name) {
		state.broker.sign_out(&session_id).await.map_err(|e| state.reject(e, "Unable to sign out."))?;
	}

	let jar = jar.add(state.removal_cookie());

	Ok((jar, found("/")).into_response())
}

/// `GET /api/auth/session`: reports the session state without refreshing it.
pub async fn session(
	State(state): State<AppState>,
	jar: CookieJar,
) -> ApiResult<Json<SessionStatusView>> {
	let session_id = session::session_id_from(&jar, &state.config.cookie.name);
	let view = state
		.broker
		.session_status(session_id.as_ref())
		.await
		.map_err(|e| ApiError::from_error(e, "Unable to load the session."))?;

	Ok(Json(view))
}

fn found(location: &str) -> Response {
	(StatusCode::FOUND, [(LOCATION, location.to_owned())]).into_response()
}

// Sign-in links carry either a path or an absolute URL on the gateway's own origin.
fn local_return_to(public_url: &Url, raw: Option<&str>) -> String {
	let Some(raw) = raw else {
		return "/".into();
	};

	match Url::parse(raw) {
		Ok(url) if url.origin() == public_url.origin() => {
			let mut local = url.path().to_owned();

			if let Some(query) = url.query() {
				local.push('?');
				local.push_str(query);
			}

			sanitize_return_to(&local)
		},
		Ok(_) => "/".into(),
		Err(_) => sanitize_return_to(raw),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn return_to_accepts_same_origin_urls_only() {
		let public = Url::parse("http://localhost:3000").expect("Public URL should parse.");

		assert_eq!(local_return_to(&public, None), "/");
		assert_eq!(local_return_to(&public, Some("/farm/fields")), "/farm/fields");
		assert_eq!(
			local_return_to(&public, Some("http://localhost:3000/forum?page=2")),
			"/forum?page=2"
		);
		assert_eq!(local_return_to(&public, Some("https://evil.example/farm")), "/");
		assert_eq!(local_return_to(&public, Some("//evil.example")), "/");
	}
}

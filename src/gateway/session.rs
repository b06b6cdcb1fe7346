//! Session cookie helpers and extractors.
//!
//! [`RequiredSession`] resolves the cookie through
//! [`SessionBroker::ensure_valid_session`](crate::flows::SessionBroker::ensure_valid_session),
//! so handlers only ever see a record whose access token is safe to forward. Failures redirect
//! to sign-in. [`OptionalSession`] yields `None` instead.

// crates.io
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
// self
use crate::{
	_prelude::*,
	auth::{PendingSignIn, SessionId, SessionRecord},
	config::SessionCookieConfig,
	gateway::{ApiError, AppState},
};

/// Builds the `HttpOnly`, `SameSite=Lax` session cookie.
pub fn session_cookie(config: &SessionCookieConfig, session_id: &SessionId) -> Cookie<'static> {
	Cookie::build((config.name.clone(), session_id.as_ref().to_owned()))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.secure(config.secure)
		.build()
}

/// Builds a cookie that expires the session cookie in the browser.
pub fn removal_cookie(config: &SessionCookieConfig) -> Cookie<'static> {
	let mut cookie = Cookie::build((config.name.clone(), ""))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.secure(config.secure)
		.build();

	cookie.make_removal();

	cookie
}

const HANDSHAKE_COOKIE_PATH: &str = "/api/auth";

/// Name of the cookie binding an in-flight sign-in to the browser that started it.
pub fn handshake_cookie_name(config: &SessionCookieConfig) -> String {
	format!("{}_state", config.name)
}

/// Builds the short-lived cookie carrying the sign-in `state`, scoped to the auth routes.
pub fn handshake_cookie(config: &SessionCookieConfig, state: &str) -> Cookie<'static> {
	Cookie::build((handshake_cookie_name(config), state.to_owned()))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path(HANDSHAKE_COOKIE_PATH)
		.secure(config.secure)
		.max_age(PendingSignIn::TTL)
		.build()
}

/// Builds a cookie that expires the sign-in handshake cookie.
pub fn handshake_removal_cookie(config: &SessionCookieConfig) -> Cookie<'static> {
	let mut cookie = Cookie::build((handshake_cookie_name(config), ""))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path(HANDSHAKE_COOKIE_PATH)
		.secure(config.secure)
		.build();

	cookie.make_removal();

	cookie
}

/// Returns `true` when the browser's handshake cookie carries exactly `state`.
pub fn handshake_matches(jar: &CookieJar, config: &SessionCookieConfig, state: &str) -> bool {
	jar.get(&handshake_cookie_name(config)).is_some_and(|cookie| cookie.value() == state)
}

/// Reads the session id from the cookie jar. Malformed values are treated as absent.
pub fn session_id_from(jar: &CookieJar, name: &str) -> Option<SessionId> {
	jar.get(name).and_then(|cookie| SessionId::new(cookie.value()).ok())
}

/// A session whose access token is valid right now.
#[derive(Clone, Debug)]
pub struct RequiredSession(pub SessionRecord);
impl FromRequestParts<AppState> for RequiredSession {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
		Self::resolve(state, &CookieJar::from_headers(&parts.headers)).await
	}
}
impl RequiredSession {
	/// Resolves the session carried by `jar`, for handlers that validate input first.
	pub async fn resolve(state: &AppState, jar: &CookieJar) -> Result<Self, ApiError> {
		let session_id = session_id_from(jar, &state.config.cookie.name)
			.ok_or_else(|| state.reject(Error::Unauthenticated, "Unauthorized"))?;
		let record = state
			.broker
			.ensure_valid_session(&session_id)
			.await
			.map_err(|e| state.reject(e, "Unable to load the session."))?;

		Ok(Self(record))
	}

	/// Access token to forward upstream.
	pub fn bearer(&self) -> &crate::auth::TokenSecret {
		&self.0.access_token
	}
}

/// A valid session, if the request carries one.
#[derive(Clone, Debug)]
pub struct OptionalSession(pub Option<SessionRecord>);
impl FromRequestParts<AppState> for OptionalSession {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
		let jar = CookieJar::from_headers(&parts.headers);
		let Some(session_id) = session_id_from(&jar, &state.config.cookie.name) else {
			return Ok(Self(None));
		};

		match state.broker.ensure_valid_session(&session_id).await {
			Ok(record) => Ok(Self(Some(record))),
			Err(Error::Unauthenticated | Error::ReauthenticationRequired) => Ok(Self(None)),
			Err(e) => Err(state.reject(e, "Unable to load the session.")),
		}
	}
}
impl OptionalSession {
	/// Access token to forward, if a session is present.
	pub fn bearer(&self) -> Option<&crate::auth::TokenSecret> {
		self.0.as_ref().map(|record| &record.access_token)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(secure: bool) -> SessionCookieConfig {
		SessionCookieConfig { name: "agro_session".into(), secure }
	}

	#[test]
	fn session_cookie_carries_hardened_attributes() {
		let id = SessionId::new("sess-1").expect("Session fixture should be valid.");
		let cookie = session_cookie(&config(true), &id);

		assert_eq!(cookie.value(), "sess-1");
		assert_eq!(cookie.http_only(), Some(true));
		assert_eq!(cookie.same_site(), Some(SameSite::Lax));
		assert_eq!(cookie.path(), Some("/"));
		assert_eq!(cookie.secure(), Some(true));
	}

	#[test]
	fn malformed_cookie_values_are_ignored() {
		let jar = CookieJar::new().add(Cookie::new("agro_session", "bad;value"));

		assert!(session_id_from(&jar, "agro_session").is_none());

		let jar = CookieJar::new().add(Cookie::new("agro_session", "sess-1"));

		assert_eq!(
			session_id_from(&jar, "agro_session").map(String::from),
			Some("sess-1".to_owned())
		);
	}

	#[test]
	fn handshake_cookie_is_scoped_to_auth_routes() {
		let cookie = handshake_cookie(&config(false), "st-1");

		assert_eq!(cookie.name(), "agro_session_state");
		assert_eq!(cookie.path(), Some("/api/auth"));
		assert_eq!(cookie.max_age(), Some(PendingSignIn::TTL));
		assert_eq!(cookie.http_only(), Some(true));

		let jar = CookieJar::new().add(cookie);

		assert!(handshake_matches(&jar, &config(false), "st-1"));
		assert!(!handshake_matches(&jar, &config(false), "st-2"));
		assert!(!handshake_matches(&CookieJar::new(), &config(false), "st-1"));
		assert_eq!(handshake_removal_cookie(&config(false)).max_age(), Some(time::Duration::ZERO));
	}

	#[test]
	fn removal_cookie_expires_immediately() {
		let cookie = removal_cookie(&config(false));

		assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
		assert_eq!(cookie.value(), "");
	}
}

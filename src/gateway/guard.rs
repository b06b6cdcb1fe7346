//! Protected-page guard.
//!
//! Runs before routing so unauthenticated browsers are sent to sign-in without any handler or
//! upstream call taking place.

// crates.io
use axum::{
	extract::{Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
// self
use crate::{
	_prelude::*,
	gateway::{ApiError, AppState, session},
};

/// Page prefixes that require a signed-in session.
pub const PROTECTED_PREFIXES: [&str; 3] = ["/forum/posts/create", "/image-classifier", "/farm/fields"];

/// Returns `true` when `path` is one of the protected pages or below one.
pub fn is_protected(path: &str) -> bool {
	PROTECTED_PREFIXES.iter().any(|prefix| {
		path.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
	})
}

/// Middleware redirecting requests for protected pages that lack a usable session.
pub async fn require_session(
	State(state): State<AppState>,
	jar: CookieJar,
	request: Request,
	next: Next,
) -> Response {
	let path = request.uri().path().to_owned();

	if !is_protected(&path) {
		return next.run(request).await;
	}

	let outcome = match session::session_id_from(&jar, &state.config.cookie.name) {
		Some(session_id) => state.broker.ensure_valid_session(&session_id).await.map(|_| ()),
		None => Err(Error::Unauthenticated),
	};

	match outcome {
		Ok(()) => next.run(request).await,
		Err(Error::Unauthenticated) => {
			tracing::debug!(path = %path, "protected page requested without a session");

			let location = state.signin_location(Some(&path), false);

			ApiError::SignIn { location, clear_cookie: None }.into_response()
		},
		Err(e) => state.reject(e, "Unable to load the session.").into_response(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn protection_covers_subpaths_only() {
		assert!(is_protected("/farm/fields"));
		assert!(is_protected("/farm/fields/12"));
		assert!(is_protected("/image-classifier"));
		assert!(is_protected("/forum/posts/create"));
		assert!(!is_protected("/farm/fieldsets"));
		assert!(!is_protected("/forum"));
		assert!(!is_protected("/api/farm/fields"));
	}
}

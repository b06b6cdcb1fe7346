//! Session token records, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, token::secret::TokenSecret},
};

/// Current lifecycle status for a session record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
	/// Access token is usable.
	Active,
	/// Access token exceeded its expiry instant and must be refreshed before use.
	Expired,
	/// A refresh attempt failed; the session is only good for a forced sign-in.
	Failed,
}

/// Session-level error flag surfaced to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionError {
	/// The refresh token was rejected or the identity provider could not be reached.
	RefreshAccessTokenError,
}
impl SessionError {
	/// Returns the wire label shared with the front-end.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionError::RefreshAccessTokenError => "RefreshAccessTokenError",
		}
	}
}
impl Display for SessionError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Errors produced by [`SessionRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Token triple held for a browser session.
#[derive(Serialize, Deserialize, Clone)]
pub struct SessionRecord {
	/// Identifier carried by the session cookie.
	pub session_id: SessionId,
	/// Access token presented to upstream services.
	pub access_token: TokenSecret,
	/// Refresh token, if the identity provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// OIDC id token, if the identity provider issued one.
	pub id_token: Option<TokenSecret>,
	/// Issued-at instant recorded when the tokens were minted.
	pub issued_at: OffsetDateTime,
	/// Access-token expiry derived from issued_at plus expires_in.
	pub expires_at: OffsetDateTime,
	/// Error flag set when a refresh attempt failed.
	pub error: Option<SessionError>,
}
impl SessionRecord {
	/// How long a lapsed session that still holds a refresh token is kept for its browser.
	pub const RETENTION: Duration = Duration::days(1);

	/// Returns a builder for constructing session records.
	pub fn builder(session_id: SessionId) -> SessionRecordBuilder {
		SessionRecordBuilder::new(session_id)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> SessionStatus {
		if self.error.is_some() {
			return SessionStatus::Failed;
		}
		if instant >= self.expires_at {
			return SessionStatus::Expired;
		}

		SessionStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> SessionStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` when the access token must be refreshed before use at `instant`.
	///
	/// `window` brings the refresh forward so a token is never forwarded upstream moments
	/// before it lapses.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime, window: Duration) -> bool {
		let window = if window.is_negative() { Duration::ZERO } else { window };

		self.status_at(instant + window) != SessionStatus::Active
	}

	/// Returns `true` once no request can bring the session back at `instant`.
	///
	/// Flagged or refresh-less records are dead as soon as the access token lapses. Otherwise
	/// the record is kept for [`Self::RETENTION`] past expiry.
	pub fn is_abandoned_at(&self, instant: OffsetDateTime) -> bool {
		let lapsed_for = instant - self.expires_at;

		if self.is_flagged() || self.refresh_token.is_none() {
			lapsed_for > Duration::ZERO
		} else {
			lapsed_for >= Self::RETENTION
		}
	}

	/// Returns `true` if the record carries an error flag.
	pub fn is_flagged(&self) -> bool {
		self.error.is_some()
	}

	/// Flags the record so it can no longer serve access tokens.
	pub fn flag(&mut self, error: SessionError) {
		self.error = Some(error);
	}
}
impl Debug for SessionRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionRecord")
			.field("session_id", &self.session_id)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("error", &self.error)
			.finish()
	}
}

/// Builder for [`SessionRecord`].
#[derive(Clone, Debug)]
pub struct SessionRecordBuilder {
	session_id: SessionId,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	id_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl SessionRecordBuilder {
	fn new(session_id: SessionId) -> Self {
		Self {
			session_id,
			access_token: None,
			refresh_token: None,
			id_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Carries over an already-wrapped refresh secret.
	pub fn refresh_secret(mut self, secret: Option<TokenSecret>) -> Self {
		self.refresh_token = secret;

		self
	}

	/// Provides the OIDC id token value.
	pub fn id_token(mut self, token: impl Into<String>) -> Self {
		self.id_token = Some(TokenSecret::new(token));

		self
	}

	/// Carries over an already-wrapped id token.
	pub fn id_secret(mut self, secret: Option<TokenSecret>) -> Self {
		self.id_token = secret;

		self
	}

	/// Consumes the builder and produces a [`SessionRecord`].
	pub fn build(self) -> Result<SessionRecord, SessionRecordBuilderError> {
		let access_token =
			self.access_token.ok_or(SessionRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(SessionRecordBuilderError::MissingExpiry),
		};

		Ok(SessionRecord {
			session_id: self.session_id,
			access_token,
			refresh_token: self.refresh_token,
			id_token: self.id_token,
			issued_at,
			expires_at,
			error: None,
		})
	}
}

//! Ensure-valid access with singleflight refresh rotation.
//!
//! [`SessionBroker::ensure_valid_session`] hands out the stored access token while it is
//! outside the refresh window. Otherwise it takes the per-session guard, re-reads the record
//! (another request may already have rotated it), and performs exactly one
//! `grant_type=refresh_token` call. Rotations are written through
//! [`SessionStore::compare_and_swap_refresh`]. Any refresh failure flags the session, ends the
//! identity-provider session, removes the record, and surfaces
//! [`Error::ReauthenticationRequired`].

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{SessionError, SessionId, SessionRecord},
	flows::{SessionBroker, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CompareAndSwapOutcome,
};

/// Non-refreshing view of a session, served to the front-end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionStatusView {
	/// Whether the cookie maps to a usable session.
	pub authenticated: bool,
	/// Access-token expiry, when a session exists.
	#[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<OffsetDateTime>,
	/// Error flag, when the last refresh failed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<SessionError>,
}
impl SessionStatusView {
	fn anonymous() -> Self {
		Self { authenticated: false, expires_at: None, error: None }
	}
}

impl SessionBroker {
	/// Returns a session whose access token is safe to forward upstream.
	pub async fn ensure_valid_session(&self, session_id: &SessionId) -> Result<SessionRecord> {
		let current = self.store.fetch(session_id).await?.ok_or(Error::Unauthenticated)?;

		if current.is_flagged() {
			return Err(self.discard_flagged(session_id).await);
		}
		if !current.needs_refresh_at(OffsetDateTime::now_utc(), self.refresh_window) {
			return Ok(current);
		}

		self.refresh_session(session_id).await
	}

	/// Reports the session state without contacting the identity provider.
	pub async fn session_status(&self, session_id: Option<&SessionId>) -> Result<SessionStatusView> {
		let Some(session_id) = session_id else {
			return Ok(SessionStatusView::anonymous());
		};
		let Some(record) = self.store.fetch(session_id).await? else {
			return Ok(SessionStatusView::anonymous());
		};

		Ok(SessionStatusView {
			authenticated: !record.is_flagged(),
			expires_at: Some(record.expires_at),
			error: record.error,
		})
	}

	async fn refresh_session(&self, session_id: &SessionId) -> Result<SessionRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "ensure_valid_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let lease = common::flow_guard(self, session_id);
		let result = span
			.instrument(async {
				let _singleflight = lease.lock().await;
				let current =
					self.store.fetch(session_id).await?.ok_or(Error::Unauthenticated)?;

				if current.is_flagged() {
					return Err(self.discard_flagged(session_id).await);
				}
				// A concurrent request rotated the tokens while we waited on the guard.
				if !current.needs_refresh_at(OffsetDateTime::now_utc(), self.refresh_window) {
					return Ok(current);
				}

				self.refresh_metrics.record_attempt();

				let refreshed = match common::facade(self) {
					Ok(facade) => facade.refresh_token(&current).await,
					Err(e) => Err(e),
				};

				match refreshed {
					Ok(updated) => self.rotate(&current, updated).await,
					Err(err) => {
						self.refresh_metrics.record_failure();

						tracing::warn!(
							session = %session_id,
							error = %err,
							"refresh failed; forcing re-authentication"
						);

						self.force_sign_out(&current).await;

						Err(Error::ReauthenticationRequired)
					},
				}
			})
			.await;

		drop(lease);
		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn rotate(&self, current: &SessionRecord, updated: SessionRecord) -> Result<SessionRecord> {
		let session_id = &current.session_id;
		let expected = current.refresh_token.as_ref().map(|secret| secret.expose());
		let outcome = self
			.store
			.compare_and_swap_refresh(session_id, expected, updated.clone())
			.await
			.inspect_err(|_| self.refresh_metrics.record_failure())?;

		match outcome {
			CompareAndSwapOutcome::Updated => {
				self.refresh_metrics.record_success();

				tracing::debug!(session = %session_id, expires_at = %updated.expires_at, "session rotated");

				Ok(updated)
			},
			CompareAndSwapOutcome::RefreshMismatch => {
				self.refresh_metrics.record_success();

				self.store.fetch(session_id).await?.ok_or(Error::Unauthenticated)
			},
			CompareAndSwapOutcome::Missing => {
				self.refresh_metrics.record_failure();
				common::release_guard(self, session_id);

				tracing::info!(session = %session_id, "session signed out during refresh");

				Err(Error::Unauthenticated)
			},
		}
	}

	/// Flags the session, ends it at the identity provider, and removes it locally.
	///
	/// Every step is best-effort; failures are logged and never mask the re-authentication.
	pub(crate) async fn force_sign_out(&self, record: &SessionRecord) {
		let session_id = &record.session_id;

		if let Err(e) = self.store.flag(session_id, SessionError::RefreshAccessTokenError).await {
			tracing::warn!(session = %session_id, error = %e, "failed to flag session");
		}

		self.end_provider_session(record).await;

		if let Err(e) = self.store.remove(session_id).await {
			tracing::warn!(session = %session_id, error = %e, "failed to remove session");
		}

		common::release_guard(self, session_id);
	}

	async fn discard_flagged(&self, session_id: &SessionId) -> Error {
		if let Err(e) = self.store.remove(session_id).await {
			tracing::warn!(session = %session_id, error = %e, "failed to remove flagged session");
		}

		common::release_guard(self, session_id);

		Error::ReauthenticationRequired
	}
}

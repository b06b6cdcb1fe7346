//! Sign-out and identity-provider logout.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionRecord},
	flows::{SessionBroker, common},
	oauth,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl SessionBroker {
	/// Removes the session and ends it at the identity provider. Signing out an unknown
	/// session succeeds.
	pub async fn sign_out(&self, session_id: &SessionId) -> Result<()> {
		const KIND: FlowKind = FlowKind::SignOut;

		let span = FlowSpan::new(KIND, "sign_out");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let removed = self.store.remove(session_id).await?;

				common::release_guard(self, session_id);

				if let Some(record) = removed {
					self.end_provider_session(&record).await;

					tracing::info!(session = %session_id, "session signed out");
				}

				Ok(())
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Best-effort logout at the identity provider using the record's refresh token.
	pub(crate) async fn end_provider_session(&self, record: &SessionRecord) {
		let Some(refresh) = record.refresh_token.as_ref() else {
			return;
		};

		if let Err(e) = oauth::logout(
			&self.http_client,
			&self.provider,
			&self.client_id,
			self.client_secret.as_deref(),
			refresh,
		)
		.await
		{
			tracing::warn!(session = %record.session_id, error = %e, "identity provider logout failed");
		}
	}
}

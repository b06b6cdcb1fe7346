//! In-flight authorization-code handshakes awaiting their callback.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Authorization-code handshake saved between the sign-in redirect and the callback.
#[derive(Clone, Serialize, Deserialize)]
pub struct PendingSignIn {
	/// Opaque `state` value round-tripped through the identity provider.
	pub state: String,
	/// PKCE verifier matching the challenge sent on the authorize URL.
	pub pkce_verifier: TokenSecret,
	/// Local path the browser returns to after sign-in.
	pub return_to: String,
	/// Instant the handshake started.
	pub created_at: OffsetDateTime,
}
impl PendingSignIn {
	/// Lifetime of a handshake before the callback is refused.
	pub const TTL: Duration = Duration::minutes(10);

	/// Creates a handshake stamped with the current instant.
	pub fn new(
		state: impl Into<String>,
		pkce_verifier: TokenSecret,
		return_to: impl Into<String>,
	) -> Self {
		Self {
			state: state.into(),
			pkce_verifier,
			return_to: return_to.into(),
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Returns `true` once the handshake outlived [`Self::TTL`] at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant - self.created_at >= Self::TTL
	}
}
impl Debug for PendingSignIn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingSignIn")
			.field("state", &self.state)
			.field("pkce_verifier", &self.pkce_verifier)
			.field("return_to", &self.return_to)
			.field("created_at", &self.created_at)
			.finish()
	}
}

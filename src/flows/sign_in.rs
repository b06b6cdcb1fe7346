//! Authorization Code + PKCE sign-in.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{PendingSignIn, SessionId, SessionRecord, TokenSecret},
	error::ConfigError,
	flows::{SessionBroker, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;
const DEFAULT_RETURN_TO: &str = "/";

/// Where to send the browser to start signing in.
#[derive(Clone, Debug)]
pub struct SignInRedirect {
	/// Fully-formed authorize URL at the identity provider.
	pub authorize_url: Url,
	/// Opaque state value expected back on the callback.
	pub state: String,
}

/// Result of a completed sign-in.
#[derive(Clone, Debug)]
pub struct CompletedSignIn {
	/// Freshly minted session.
	pub session: SessionRecord,
	/// Local path the browser asked to return to.
	pub return_to: String,
}

impl SessionBroker {
	/// Starts a sign-in: saves a PKCE handshake and returns the authorize URL.
	///
	/// `force_login` asks the identity provider to prompt for credentials even when it still
	/// holds a session cookie, which is how a failed refresh forces a real re-authentication.
	pub async fn begin_sign_in(&self, return_to: &str, force_login: bool) -> Result<SignInRedirect> {
		const KIND: FlowKind = FlowKind::SignIn;

		let span = FlowSpan::new(KIND, "begin_sign_in");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.ensure_sign_in_supported()?;

				let state = random_string(STATE_LEN);
				let verifier = random_string(PKCE_VERIFIER_LEN);
				let challenge = pkce_challenge(&verifier);
				let authorize_url = self.authorize_url(&state, &challenge, force_login);
				let pending =
					PendingSignIn::new(&state, TokenSecret::new(verifier), sanitize_return_to(return_to));

				self.store.save_pending(pending).await?;

				Ok(SignInRedirect { authorize_url, state })
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Finishes a sign-in: consumes the handshake, exchanges the code, and saves the session.
	pub async fn complete_sign_in(&self, state: &str, code: &str) -> Result<CompletedSignIn> {
		const KIND: FlowKind = FlowKind::SignIn;

		let span = FlowSpan::new(KIND, "complete_sign_in");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let pending = self.store.take_pending(state).await?.ok_or_else(|| {
					Error::InvalidGrant { reason: "Unknown or already used sign-in state.".into() }
				})?;

				if pending.is_expired_at(OffsetDateTime::now_utc()) {
					return Err(Error::InvalidGrant { reason: "Sign-in handshake expired.".into() });
				}

				let session = common::facade(self)?
					.exchange_authorization_code(
						SessionId::generate(),
						code,
						pending.pkce_verifier.expose(),
						&self.redirect_uri,
					)
					.await?;

				self.store.save(session.clone()).await?;

				tracing::info!(session = %session.session_id, "session established");

				Ok(CompletedSignIn { session, return_to: pending.return_to })
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	fn ensure_sign_in_supported(&self) -> Result<()> {
		if self.provider.supports(GrantType::AuthorizationCode) {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedGrant {
				descriptor: self.provider.id.to_string(),
				grant: "authorization_code",
			}
			.into())
		}
	}

	fn authorize_url(&self, state: &str, challenge: &str, force_login: bool) -> Url {
		let mut url = self.provider.endpoints.authorization.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("response_type", "code");
			pairs.append_pair("client_id", &self.client_id);
			pairs.append_pair("redirect_uri", self.redirect_uri.as_str());

			if let Some(scope) =
				common::format_scope(&self.scopes, self.provider.quirks.scope_delimiter)
			{
				pairs.append_pair("scope", &scope);
			}

			pairs.append_pair("state", state);
			pairs.append_pair("code_challenge", challenge);
			pairs.append_pair("code_challenge_method", "S256");

			if force_login && self.provider.quirks.supports_prompt_login {
				pairs.append_pair("prompt", "login");
			}
		}

		url
	}
}

/// Keeps post-sign-in redirects on this origin.
pub fn sanitize_return_to(raw: &str) -> String {
	let local = raw.starts_with('/') && !raw.starts_with("//") && !raw.contains('\\');

	if local { raw.to_owned() } else { DEFAULT_RETURN_TO.to_owned() }
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

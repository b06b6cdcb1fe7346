//! Session flows: sign-in, ensure-valid with refresh rotation, and sign-out.

pub mod common;
pub mod refresh;
pub mod sign_in;
pub mod sign_out;

pub use refresh::*;
pub use sign_in::*;

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	http::ReqwestHttpClient,
	provider::{IdentityProvider, ProviderStrategy},
	store::SessionStore,
};

/// Coordinates the session lifecycle against a single identity provider.
///
/// The broker owns the HTTP client, session store, provider descriptor, and strategy so the
/// individual flows only deal with their own step logic. Client credentials live next to the
/// descriptor so every token and logout call authenticates the same way.
#[derive(Clone)]
pub struct SessionBroker {
	/// HTTP client used for every identity-provider request.
	pub http_client: ReqwestHttpClient,
	/// Session store holding records and pending handshakes.
	pub store: Arc<dyn SessionStore>,
	/// Identity-provider descriptor.
	pub provider: IdentityProvider,
	/// Strategy used to decorate token requests and classify failures.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret for confidential client authentication.
	pub client_secret: Option<String>,
	/// Callback URL registered with the identity provider.
	pub redirect_uri: Url,
	/// Scopes requested at sign-in.
	pub scopes: Vec<String>,
	/// Lead time before expiry at which access tokens are refreshed.
	pub refresh_window: Duration,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>,
}
impl SessionBroker {
	/// Default scopes requested at sign-in.
	pub const DEFAULT_SCOPES: [&str; 3] = ["openid", "profile", "email"];
	/// Default refresh lead time.
	pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::seconds(30);

	/// Creates a broker that reuses the caller-provided HTTP client.
	pub fn with_http_client(
		store: Arc<dyn SessionStore>,
		provider: IdentityProvider,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		http_client: ReqwestHttpClient,
		redirect_uri: Url,
	) -> Self {
		Self {
			http_client,
			store,
			provider,
			strategy,
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scopes: Self::DEFAULT_SCOPES.iter().map(|scope| (*scope).to_owned()).collect(),
			refresh_window: Self::DEFAULT_REFRESH_WINDOW,
			refresh_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Creates a broker with its own redirect-free reqwest client.
	pub fn new(
		store: Arc<dyn SessionStore>,
		provider: IdentityProvider,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		redirect_uri: Url,
	) -> Result<Self> {
		Ok(Self::with_http_client(
			store,
			provider,
			strategy,
			client_id,
			ReqwestHttpClient::no_redirects()?,
			redirect_uri,
		))
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the refresh lead time; negative values are clamped to zero.
	pub fn with_refresh_window(mut self, window: Duration) -> Self {
		self.refresh_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Overrides the scopes requested at sign-in.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}
	/// Number of sessions that currently own a singleflight guard.
	pub fn active_flow_guards(&self) -> usize {
		self.flow_guards.lock().len()
	}
}
impl Debug for SessionBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionBroker")
			.field("provider", &self.provider.id)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("refresh_window", &self.refresh_window)
			.finish()
	}
}

//! Shared state handed to every gateway handler.

// crates.io
use axum_extra::extract::cookie::Cookie;
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	config::GatewayConfig,
	error::ConfigError,
	flows::SessionBroker,
	gateway::{ApiError, Envelope, session},
	provider::{DefaultProviderStrategy, IdentityProvider, ProviderStrategy},
	store::{FileStore, MemoryStore, SessionStore},
	upstream::{UpstreamClient, UpstreamReply, UpstreamRequest},
};

/// Provider identifier used for the configured Keycloak realm.
pub const KEYCLOAK_PROVIDER_ID: &str = "keycloak";

/// Configuration, session broker, and upstream client shared across requests.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Gateway configuration.
	pub config: Arc<GatewayConfig>,
	/// Session lifecycle coordinator.
	pub broker: Arc<SessionBroker>,
	/// Upstream service client.
	pub upstream: UpstreamClient,
}
impl AppState {
	/// Assembles state from already-built parts.
	pub fn new(
		config: Arc<GatewayConfig>,
		broker: Arc<SessionBroker>,
		upstream: UpstreamClient,
	) -> Self {
		Self { config, broker, upstream }
	}

	/// Builds the identity provider, session store, broker, and upstream client described by
	/// `config`.
	pub fn from_config(config: GatewayConfig) -> Result<Self> {
		let provider_id = ProviderId::new(KEYCLOAK_PROVIDER_ID).map_err(ConfigError::from)?;
		let provider =
			IdentityProvider::keycloak(provider_id, &config.issuer).map_err(ConfigError::from)?;
		let store: Arc<dyn SessionStore> = match &config.store_path {
			Some(path) => {
				tracing::info!(path = %path.display(), "using file-backed session store");

				Arc::new(FileStore::open(path)?)
			},
			None => Arc::new(MemoryStore::default()),
		};
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
		let mut broker = SessionBroker::new(
			store,
			provider,
			strategy,
			config.client_id.clone(),
			config.callback_url()?,
		)?
		.with_scopes(config.scopes.iter().cloned())
		.with_refresh_window(config.refresh_window);

		if let Some(secret) = &config.client_secret {
			broker = broker.with_client_secret(secret.clone());
		}

		Ok(Self::new(Arc::new(config), Arc::new(broker), UpstreamClient::build()?))
	}

	/// Sends an upstream request, mapping failures onto gateway responses.
	pub async fn forward(
		&self,
		request: Result<UpstreamRequest>,
		bearer: Option<&TokenSecret>,
		context: &'static str,
	) -> Result<UpstreamReply, ApiError> {
		match request {
			Ok(request) => self.upstream.send(request, bearer).await,
			Err(e) => Err(e),
		}
		.map_err(|e| self.reject(e, context))
	}

	/// Forwards a list read, answering `{"data": []}` when the upstream cannot be reached.
	pub async fn forward_list(
		&self,
		request: Result<UpstreamRequest>,
		bearer: Option<&TokenSecret>,
		context: &'static str,
	) -> Result<Envelope, ApiError> {
		let request = request.map_err(|e| self.reject(e, context))?;
		let operation = request.operation;

		match self.upstream.send(request, bearer).await {
			Ok(reply) => Ok(Envelope::Data(reply.body)),
			Err(Error::Transport(e)) => {
				tracing::warn!(operation, error = %e, "upstream unreachable; serving an empty list");

				Ok(Envelope::empty_list())
			},
			Err(e) => Err(self.reject(e, context)),
		}
	}

	/// Maps an error onto a response, sending session failures to the sign-in route.
	pub fn reject(&self, err: Error, context: &'static str) -> ApiError {
		match err {
			Error::Unauthenticated | Error::UpstreamUnauthorized =>
				ApiError::SignIn { location: self.config.signin_path.clone(), clear_cookie: None },
			Error::ReauthenticationRequired => ApiError::SignIn {
				location: self.signin_location(None, true),
				clear_cookie: Some(self.removal_cookie()),
			},
			other => ApiError::from_error(other, context),
		}
	}

	/// Sign-in route carrying an optional return path and forced-login flag.
	pub fn signin_location(&self, return_to: Option<&str>, force_login: bool) -> String {
		let mut query = url::form_urlencoded::Serializer::new(String::new());

		if let Some(return_to) = return_to {
			query.append_pair("callbackUrl", return_to);
		}
		if force_login {
			query.append_pair("prompt", "login");
		}

		let query = query.finish();

		if query.is_empty() {
			self.config.signin_path.clone()
		} else {
			format!("{}?{query}", self.config.signin_path)
		}
	}

	/// Session cookie for `session_id` with the configured attributes.
	pub fn session_cookie(&self, session_id: &crate::auth::SessionId) -> Cookie<'static> {
		session::session_cookie(&self.config.cookie, session_id)
	}

	/// Cookie that expires the session cookie.
	pub fn removal_cookie(&self) -> Cookie<'static> {
		session::removal_cookie(&self.config.cookie)
	}

	/// Handshake cookie binding the sign-in `state` to this browser.
	pub fn handshake_cookie(&self, state: &str) -> Cookie<'static> {
		session::handshake_cookie(&self.config.cookie, state)
	}

	/// Cookie that expires the sign-in handshake cookie.
	pub fn handshake_removal_cookie(&self) -> Cookie<'static> {
		session::handshake_removal_cookie(&self.config.cookie)
	}
}

//! Environment-driven gateway configuration.

// std
use std::{env, net::SocketAddr, path::PathBuf};
// self
use crate::{_prelude::*, error::ConfigError};

const CALLBACK_PATH: &str = "/api/auth/callback";

/// Session cookie settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookieConfig {
	/// Cookie name carrying the session id.
	pub name: String,
	/// Adds the `Secure` attribute.
	pub secure: bool,
}

/// Base URLs of the upstream services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceUrls {
	/// Forum/Q&A and blog service.
	pub forum: Url,
	/// Image classification service.
	pub images: Url,
	/// Farm-field monitoring service.
	pub farm: Url,
	/// Soil diagnosis model service.
	pub diagnosis: Url,
	/// Third-party weather API.
	pub weather: Url,
}

/// Complete gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Socket address the HTTP server binds to.
	pub bind_addr: SocketAddr,
	/// Public base URL of the gateway as seen by browsers.
	pub public_url: Url,
	/// Path unauthenticated browsers are redirected to.
	pub signin_path: String,
	/// Keycloak realm issuer URL.
	pub issuer: Url,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Option<String>,
	/// Scopes requested at sign-in.
	pub scopes: Vec<String>,
	/// Lead time before expiry at which access tokens are refreshed.
	pub refresh_window: Duration,
	/// Session cookie settings.
	pub cookie: SessionCookieConfig,
	/// Snapshot path enabling the file-backed session store.
	pub store_path: Option<PathBuf>,
	/// Upstream service base URLs.
	pub services: ServiceUrls,
	/// Weather API key.
	pub weather_api_key: Option<String>,
}
impl GatewayConfig {
	/// Loads `.env` (if present) and reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		if let Err(e) = dotenvy::dotenv() {
			if !e.not_found() {
				tracing::warn!(error = %e, "failed to load .env file");
			}
		}

		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Parses configuration from an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let vars = Vars(lookup);
		let refresh_secs: i64 = vars.parsed_or("AUTH_REFRESH_WINDOW_SECS", 30)?;

		if refresh_secs < 0 {
			return Err(ConfigError::InvalidEnv {
				key: "AUTH_REFRESH_WINDOW_SECS",
				reason: "must not be negative".into(),
			});
		}

		Ok(Self {
			bind_addr: vars.parsed_or("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
			public_url: match vars.get("NEXTAUTH_URL") {
				Some(_) => vars.url("NEXTAUTH_URL")?,
				None => vars.url_or("PUBLIC_URL", "http://localhost:3000")?,
			},
			signin_path: vars.get("AUTH_SIGNIN_PATH").unwrap_or_else(|| "/api/auth/signin".into()),
			issuer: vars.url("AUTH_KEYCLOAK_ISSUER")?,
			client_id: vars.required("AUTH_KEYCLOAK_ID")?,
			client_secret: vars.get("AUTH_KEYCLOAK_SECRET"),
			scopes: vars
				.get("AUTH_SCOPES")
				.unwrap_or_else(|| "openid profile email".into())
				.split_whitespace()
				.map(str::to_owned)
				.collect(),
			refresh_window: Duration::seconds(refresh_secs),
			cookie: SessionCookieConfig {
				name: vars.get("SESSION_COOKIE_NAME").unwrap_or_else(|| "agro_session".into()),
				secure: vars.parsed_or("SESSION_COOKIE_SECURE", false)?,
			},
			store_path: vars.get("SESSION_STORE_PATH").map(PathBuf::from),
			services: ServiceUrls {
				forum: vars.url("FORUM_SERVICE_URL")?,
				images: vars.url("IMAGE_SERVICE_URL")?,
				farm: vars.url("FARM_MONITORING_SERVICE_URL")?,
				diagnosis: vars.url("DIRT_DIAGNOSIS_SERVICE_URL")?,
				weather: vars.url_or("WEATHER_API_URL", "https://api.weatherapi.com/v1")?,
			},
			weather_api_key: vars.get("WEATHER_API_KEY"),
		})
	}

	/// Callback URL registered with the identity provider.
	pub fn callback_url(&self) -> Result<Url, ConfigError> {
		self.public_url
			.join(CALLBACK_PATH)
			.map_err(|source| ConfigError::InvalidRedirect { source })
	}

	/// Absolute sign-in URL used in redirects.
	pub fn signin_url(&self) -> Result<Url, ConfigError> {
		self.public_url.join(&self.signin_path).map_err(|e| ConfigError::InvalidEnv {
			key: "AUTH_SIGNIN_PATH",
			reason: e.to_string(),
		})
	}
}

struct Vars<F>(F);
impl<F> Vars<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn get(&self, key: &str) -> Option<String> {
		(self.0)(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
	}

	fn required(&self, key: &'static str) -> Result<String, ConfigError> {
		self.get(key).ok_or(ConfigError::MissingEnv { key })
	}

	fn parsed_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
	where
		T: FromStr,
		T::Err: Display,
	{
		match self.get(key) {
			Some(raw) => raw
				.parse()
				.map_err(|e: T::Err| ConfigError::InvalidEnv { key, reason: e.to_string() }),
			None => Ok(default),
		}
	}

	fn url(&self, key: &'static str) -> Result<Url, ConfigError> {
		parse_url(key, &self.required(key)?)
	}

	fn url_or(&self, key: &'static str, default: &str) -> Result<Url, ConfigError> {
		parse_url(key, &self.get(key).unwrap_or_else(|| default.to_owned()))
	}
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|e| ConfigError::InvalidEnv { key, reason: e.to_string() })
}

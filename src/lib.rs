//! Backend-for-frontend gateway for the agro platform: OIDC session lifecycle with refresh
//! rotation, plus bearer-injecting proxies for the forum, image, farm, diagnosis, and weather
//! services.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]
#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
pub mod upstream;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ProviderId, SessionId, SessionRecord},
		config::{GatewayConfig, ServiceUrls, SessionCookieConfig},
		flows::SessionBroker,
		gateway::AppState,
		http::ReqwestHttpClient,
		provider::{DefaultProviderStrategy, IdentityProvider, ProviderStrategy},
		store::{MemoryStore, SessionStore},
		upstream::UpstreamClient,
	};

	/// Client identifier used by test brokers.
	pub const TEST_CLIENT_ID: &str = "agro-web";
	/// Client secret used by test brokers.
	pub const TEST_CLIENT_SECRET: &str = "agro-web-secret";
	/// Session cookie name used by test gateways.
	pub const TEST_COOKIE_NAME: &str = "agro_session";

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Builds a Keycloak-shaped identity provider rooted at `issuer`.
	pub fn test_identity_provider(issuer: &str) -> IdentityProvider {
		let id = ProviderId::new("keycloak-test").expect("Provider fixture should be valid.");
		let issuer = Url::parse(issuer).expect("Issuer fixture should parse.");

		IdentityProvider::keycloak(id, &issuer).expect("Keycloak descriptor should build.")
	}

	/// Constructs a [`SessionBroker`] backed by an in-memory store and the default strategy.
	pub fn build_test_broker(issuer: &str) -> (SessionBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
		let broker = SessionBroker::with_http_client(
			store,
			test_identity_provider(issuer),
			strategy,
			TEST_CLIENT_ID,
			ReqwestHttpClient::with_client(test_reqwest_client()),
			Url::parse("http://localhost:3000/api/auth/callback")
				.expect("Redirect fixture should parse."),
		)
		.with_client_secret(TEST_CLIENT_SECRET);

		(broker, store_backend)
	}

	/// Builds a gateway configuration that points every upstream at `upstream` and the identity
	/// provider at `issuer`.
	pub fn test_config(issuer: &str, upstream: &str) -> GatewayConfig {
		let base = |path: &str| {
			Url::parse(&format!("{upstream}{path}")).expect("Upstream fixture should parse.")
		};

		GatewayConfig {
			bind_addr: "127.0.0.1:0".parse().expect("Bind address fixture should parse."),
			public_url: Url::parse("http://localhost:3000").expect("Public URL should parse."),
			signin_path: "/api/auth/signin".into(),
			issuer: Url::parse(issuer).expect("Issuer fixture should parse."),
			client_id: TEST_CLIENT_ID.into(),
			client_secret: Some(TEST_CLIENT_SECRET.into()),
			scopes: vec!["openid".into(), "profile".into()],
			refresh_window: Duration::seconds(30),
			cookie: SessionCookieConfig { name: TEST_COOKIE_NAME.into(), secure: false },
			store_path: None,
			services: ServiceUrls {
				forum: base("/forum-service"),
				images: base("/image-service"),
				farm: base("/farm-service"),
				diagnosis: base("/dirt-service"),
				weather: base("/weather"),
			},
			weather_api_key: Some("weather-key".into()),
		}
	}

	/// Builds the shared gateway state used by router-level integration tests.
	pub fn build_test_state(issuer: &str, upstream: &str) -> (AppState, Arc<MemoryStore>) {
		let config = test_config(issuer, upstream);
		let (broker, store) = build_test_broker(issuer);
		let broker = broker.with_refresh_window(config.refresh_window);
		let upstream = UpstreamClient::new(test_reqwest_client());

		(AppState::new(Arc::new(config), Arc::new(broker), upstream), store)
	}

	/// Seeds a session whose access token expires `expires_in` after it was issued five minutes
	/// ago.
	pub async fn seed_session(
		store: &MemoryStore,
		session_id: &str,
		access: &str,
		refresh: &str,
		expires_in: Duration,
	) -> SessionRecord {
		let session_id = SessionId::new(session_id).expect("Session fixture should be valid.");
		let issued = OffsetDateTime::now_utc() - Duration::minutes(5);
		let record = SessionRecord::builder(session_id)
			.access_token(access)
			.refresh_token(refresh)
			.issued_at(issued)
			.expires_at(issued + expires_in)
			.build()
			.expect("Session record fixture should build successfully.");

		store.save(record.clone()).await.expect("Failed to seed session into the store.");

		record
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;

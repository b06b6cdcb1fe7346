//! OIDC facade over the `oauth2` crate plus the Keycloak logout call.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken,
	RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionRecord, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		ClientAuthMethod, GrantType, IdentityProvider, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

/// Extra fields Keycloak adds to token responses.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeycloakTokenFields {
	/// OIDC id token issued alongside the access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for KeycloakTokenFields {}

type KeycloakTokenResponse = StandardTokenResponse<KeycloakTokenFields, BasicTokenType>;
type ConfiguredClient = oauth2::Client<
	BasicErrorResponse,
	KeycloakTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Token-endpoint client bound to one identity provider and client registration.
pub(crate) struct OidcFacade<'a> {
	oauth_client: ConfiguredClient,
	http_client: &'a ReqwestHttpClient,
	strategy: &'a dyn ProviderStrategy,
}
impl<'a> OidcFacade<'a> {
	pub(crate) fn from_provider(
		provider: &IdentityProvider,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: &'a ReqwestHttpClient,
		strategy: &'a dyn ProviderStrategy,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(provider.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(provider.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client: ConfiguredClient =
			oauth2::Client::new(ClientId::new(client_id.to_owned()))
				.set_auth_uri(auth_url)
				.set_token_uri(token_url);

		match (provider.client_auth_method, client_secret) {
			(ClientAuthMethod::NoneWithPkce, _) | (_, None) => {},
			(method, Some(secret)) => {
				oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));

				if method == ClientAuthMethod::ClientSecretPost {
					oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
				}
			},
		}

		Ok(Self { oauth_client, http_client, strategy })
	}

	/// Exchanges an authorization code (plus PKCE verifier) for a fresh session record.
	pub(crate) async fn exchange_authorization_code(
		&self,
		session_id: SessionId,
		code: &str,
		pkce_verifier: &str,
		redirect_uri: &Url,
	) -> Result<SessionRecord> {
		const GRANT: GrantType = GrantType::AuthorizationCode;

		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut request = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url));

		for (key, value) in self.extra_params(GRANT) {
			request = request.add_extra_param(key, value);
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(self.strategy, GRANT, meta.take(), err))?;
		let builder = record_builder(session_id, &response)?;
		let builder = match response.refresh_token() {
			Some(refresh) => builder.refresh_token(refresh.secret().to_owned()),
			None => builder,
		};

		builder.build().map_err(|e| ConfigError::from(e).into())
	}

	/// Runs `grant_type=refresh_token` for `current` and returns the rotated record.
	///
	/// A response without `refresh_token` (or `id_token`) keeps the previous value.
	pub(crate) async fn refresh_token(&self, current: &SessionRecord) -> Result<SessionRecord> {
		const GRANT: GrantType = GrantType::RefreshToken;

		let refresh = current.refresh_token.as_ref().ok_or(ConfigError::MissingRefreshToken)?;
		let refresh_secret = RefreshToken::new(refresh.expose().to_owned());
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		for (key, value) in self.extra_params(GRANT) {
			request = request.add_extra_param(key, value);
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(self.strategy, GRANT, meta.take(), err))?;
		let rotated = response
			.refresh_token()
			.map(|token| TokenSecret::new(token.secret().to_owned()))
			.or_else(|| current.refresh_token.clone());
		let mut builder =
			record_builder(current.session_id.clone(), &response)?.refresh_secret(rotated);

		if response.extra_fields().id_token.is_none() {
			builder = builder.id_secret(current.id_token.clone());
		}

		builder.build().map_err(|e| ConfigError::from(e).into())
	}

	fn extra_params(&self, grant: GrantType) -> BTreeMap<String, String> {
		let mut form = BTreeMap::new();

		self.strategy.augment_token_request(grant, &mut form);

		form
	}
}

/// Ends the identity-provider session tied to `refresh_token`.
///
/// Posts `client_id`, `client_secret`, and `refresh_token` as a form to the provider's logout
/// endpoint. Providers without a logout endpoint are treated as already signed out.
pub(crate) async fn logout(
	http_client: &ReqwestHttpClient,
	provider: &IdentityProvider,
	client_id: &str,
	client_secret: Option<&str>,
	refresh_token: &TokenSecret,
) -> Result<()> {
	let Some(endpoint) = provider.endpoints.logout.as_ref() else {
		tracing::debug!(provider = %provider.id, "provider has no logout endpoint");

		return Ok(());
	};
	let mut form = vec![("client_id", client_id), ("refresh_token", refresh_token.expose())];
	let mut request = http_client.post(endpoint.clone());

	match (provider.client_auth_method, client_secret) {
		(ClientAuthMethod::ClientSecretBasic, Some(secret)) =>
			request = request.basic_auth(client_id, Some(secret)),
		(ClientAuthMethod::ClientSecretPost, Some(secret)) => form.push(("client_secret", secret)),
		_ => {},
	}

	let response = request
		.form(&form)
		.send()
		.await
		.map_err(|e| TransportError::network("the logout endpoint", e))?;
	let status = response.status();

	if status.is_success() {
		return Ok(());
	}

	let details = response.text().await.unwrap_or_default();

	Err(Error::Upstream { status: status.as_u16(), details })
}

fn record_builder(
	session_id: SessionId,
	response: &KeycloakTokenResponse,
) -> Result<crate::auth::SessionRecordBuilder> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	let mut builder = SessionRecord::builder(session_id)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	if let Some(id_token) = response.extra_fields().id_token.as_ref() {
		builder = builder.id_token(id_token.clone());
	}

	Ok(builder)
}

fn map_request_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.as_ref().and_then(|m| m.status);
	let retry_after = meta.as_ref().and_then(|m| m.retry_after);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let code: &str = response.error().as_ref();
			let mut ctx = ProviderErrorContext::new(grant).with_oauth_error(code);

			if let Some(description) = response.error_description() {
				ctx = ctx.with_error_description(description.clone());
			}
			if let Some(status) = status {
				ctx = ctx.with_http_status(status);
			}

			let message =
				response.error_description().cloned().unwrap_or_else(|| code.to_owned());

			classified(strategy.classify_token_error(&ctx), message, status, retry_after)
		},
		// Non-JSON error pages still carry a status worth classifying.
		RequestTokenError::Parse(source, body) => match status {
			Some(code) if !(200..300).contains(&code) => {
				let preview = String::from_utf8_lossy(&body);
				let ctx = ProviderErrorContext::new(grant)
					.with_http_status(code)
					.with_body_preview(preview.as_ref());
				let message = format!("HTTP {code} with an unparsable body");

				classified(strategy.classify_token_error(&ctx), message, status, retry_after)
			},
			_ => TransientError::TokenResponseParse { source, status }.into(),
		},
		RequestTokenError::Request(inner) => map_transport_error(strategy, grant, status, inner),
		RequestTokenError::Other(message) =>
			TransientError::TokenEndpoint { message, status, retry_after }.into(),
	}
}

fn classified(
	kind: ProviderErrorKind,
	reason: String,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error {
	match kind {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Transient =>
			TransientError::TokenEndpoint { message: reason, status, retry_after }.into(),
	}
}

fn map_transport_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	status: Option<u16>,
	err: HttpClientError<ReqwestError>,
) -> Error {
	match err {
		HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
		HttpClientError::Reqwest(inner) => {
			let ctx = ProviderErrorContext::network_failure(grant);

			match strategy.classify_token_error(&ctx) {
				ProviderErrorKind::Transient if inner.is_timeout() => TransientError::TokenEndpoint {
					message: "request to the token endpoint timed out".into(),
					status,
					retry_after: None,
				}
				.into(),
				_ => TransportError::from(*inner).into(),
			}
		},
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) =>
			TransientError::TokenEndpoint { message, status, retry_after: None }.into(),
		_ => TransientError::TokenEndpoint {
			message: "unknown HTTP client failure".into(),
			status,
			retry_after: None,
		}
		.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ProviderId, provider::DefaultProviderStrategy};

	fn provider(method: ClientAuthMethod) -> IdentityProvider {
		let issuer = Url::parse("https://sso.agro.example/realms/agro").expect("Issuer should parse.");
		let mut provider = IdentityProvider::keycloak(
			ProviderId::new("keycloak").expect("Provider id should be valid."),
			&issuer,
		)
		.expect("Keycloak descriptor should build.");

		provider.client_auth_method = method;

		provider
	}

	#[test]
	fn facade_builds_for_every_auth_method() {
		let http = ReqwestHttpClient::default();

		for method in [
			ClientAuthMethod::ClientSecretBasic,
			ClientAuthMethod::ClientSecretPost,
			ClientAuthMethod::NoneWithPkce,
		] {
			assert!(
				OidcFacade::from_provider(
					&provider(method),
					"agro-web",
					Some("secret"),
					&http,
					&DefaultProviderStrategy,
				)
				.is_ok()
			);
		}
	}

	#[test]
	fn classified_errors_follow_strategy_kind() {
		assert!(matches!(
			classified(ProviderErrorKind::InvalidGrant, "Token is not active".into(), Some(400), None),
			Error::InvalidGrant { .. }
		));
		assert!(matches!(
			classified(ProviderErrorKind::Transient, "busy".into(), Some(503), None),
			Error::Transient(TransientError::TokenEndpoint { status: Some(503), .. })
		));
	}

	#[test]
	fn keycloak_fields_capture_id_token() {
		let response: KeycloakTokenResponse = serde_json::from_str(
			r#"{"access_token":"at","token_type":"Bearer","expires_in":300,"refresh_token":"rt","id_token":"idt","refresh_expires_in":1800}"#,
		)
		.expect("Keycloak token response should deserialize.");

		assert_eq!(response.extra_fields().id_token.as_deref(), Some("idt"));
	}
}

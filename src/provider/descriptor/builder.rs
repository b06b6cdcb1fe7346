// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{
		ClientAuthMethod, GrantType, IdentityProvider, ProviderEndpoints, ProviderQuirks,
		SupportedGrants,
	},
};

/// Errors raised while constructing or validating provider descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required for sign-in.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// At least one grant must be supported.
	#[error("Descriptor must enable at least one grant type.")]
	NoSupportedGrants,
	/// PKCE requirement implies Authorization Code support.
	#[error("The `pkce_required` flag requires enabling the authorization_code grant.")]
	PkceRequiredWithoutAuthorizationCode,
	/// Issuer URL cannot be extended into endpoint URLs.
	#[error("Issuer URL cannot host OIDC endpoints: {url}.")]
	InvalidIssuer {
		/// Issuer URL that failed.
		url: String,
	},
	/// Endpoints must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Scope delimiters must be printable.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`IdentityProvider`] values.
#[derive(Debug)]
pub struct IdentityProviderBuilder {
	id: ProviderId,
	issuer: Url,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	logout_endpoint: Option<Url>,
	supported_grants: SupportedGrants,
	client_auth_method: ClientAuthMethod,
	quirks: ProviderQuirks,
}
impl IdentityProviderBuilder {
	/// Creates a new builder seeded with the identifier and issuer.
	pub fn new(id: ProviderId, issuer: Url) -> Self {
		Self {
			id,
			issuer,
			authorization_endpoint: None,
			token_endpoint: None,
			logout_endpoint: None,
			supported_grants: SupportedGrants::default(),
			client_auth_method: ClientAuthMethod::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the RP-initiated logout endpoint.
	pub fn logout_endpoint(mut self, url: Url) -> Self {
		self.logout_endpoint = Some(url);

		self
	}

	/// Marks a single grant type as supported.
	pub fn support_grant(mut self, grant: GrantType) -> Self {
		self.supported_grants = self.supported_grants.enable(grant);

		self
	}

	/// Marks multiple grants as supported.
	pub fn support_grants<I>(self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		grants.into_iter().fold(self, Self::support_grant)
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<IdentityProvider, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let provider = IdentityProvider {
			id: self.id,
			issuer: self.issuer,
			endpoints: ProviderEndpoints { authorization, token, logout: self.logout_endpoint },
			supported_grants: self.supported_grants,
			client_auth_method: self.client_auth_method,
			quirks: self.quirks,
		};

		provider.validate()?;

		Ok(provider)
	}
}

impl IdentityProvider {
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.supported_grants.is_empty() {
			return Err(ProviderDescriptorError::NoSupportedGrants);
		}
		if self.quirks.pkce_required && !self.supports(GrantType::AuthorizationCode) {
			return Err(ProviderDescriptorError::PkceRequiredWithoutAuthorizationCode);
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if let Some(logout) = self.endpoints.logout.as_ref() {
			validate_endpoint("logout", logout)?;
		}
		if self.quirks.scope_delimiter.is_control() {
			return Err(ProviderDescriptorError::InvalidScopeDelimiter {
				delimiter: self.quirks.scope_delimiter,
			});
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}

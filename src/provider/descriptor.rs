//! Identity-provider descriptor and the Keycloak preset used by the gateway.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant helpers wired into provider descriptors.
pub mod grant;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use grant::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

const KEYCLOAK_OIDC_SEGMENT: &str = "protocol/openid-connect";

/// Client authentication modes for token and logout endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// Public clients that prove possession via PKCE only.
	NoneWithPkce,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// Optional RP-initiated logout endpoint.
	pub logout: Option<Url>,
}

/// Immutable identity-provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Issuer URL the endpoints were derived from.
	pub issuer: Url,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Supported grant flags.
	pub supported_grants: SupportedGrants,
	/// Client authentication mechanism.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl IdentityProvider {
	/// Creates a new builder for the provided identifier and issuer.
	pub fn builder(id: ProviderId, issuer: Url) -> IdentityProviderBuilder {
		IdentityProviderBuilder::new(id, issuer)
	}

	/// Describes a Keycloak realm rooted at `issuer` (for example
	/// `https://sso.example.com/realms/agro`).
	pub fn keycloak(id: ProviderId, issuer: &Url) -> Result<Self, ProviderDescriptorError> {
		Self::builder(id, issuer.clone())
			.authorization_endpoint(keycloak_endpoint(issuer, "auth")?)
			.token_endpoint(keycloak_endpoint(issuer, "token")?)
			.logout_endpoint(keycloak_endpoint(issuer, "logout")?)
			.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.quirks(ProviderQuirks { pkce_required: true, ..Default::default() })
			.build()
	}

	/// Checks whether the descriptor supports a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}
}

fn keycloak_endpoint(issuer: &Url, leaf: &str) -> Result<Url, ProviderDescriptorError> {
	let raw = format!("{}/{KEYCLOAK_OIDC_SEGMENT}/{leaf}", issuer.as_str().trim_end_matches('/'));

	Url::parse(&raw).map_err(|_| ProviderDescriptorError::InvalidIssuer { url: issuer.to_string() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn keycloak_endpoints_derive_from_issuer() {
		let issuer =
			Url::parse("https://sso.agro.example/realms/agro/").expect("Issuer should parse.");
		let provider = IdentityProvider::keycloak(
			ProviderId::new("keycloak").expect("Provider id should be valid."),
			&issuer,
		)
		.expect("Keycloak descriptor should build.");

		assert_eq!(
			provider.endpoints.token.as_str(),
			"https://sso.agro.example/realms/agro/protocol/openid-connect/token"
		);
		assert_eq!(
			provider.endpoints.authorization.as_str(),
			"https://sso.agro.example/realms/agro/protocol/openid-connect/auth"
		);
		assert_eq!(
			provider.endpoints.logout.as_ref().map(Url::as_str),
			Some("https://sso.agro.example/realms/agro/protocol/openid-connect/logout")
		);
		assert_eq!(provider.client_auth_method, ClientAuthMethod::ClientSecretPost);
		assert!(provider.supports(GrantType::RefreshToken));
		assert!(provider.quirks.pkce_required);
	}
}

// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// PKCE must be supplied even for confidential clients.
	pub pkce_required: bool,
	/// The authorization endpoint honours `prompt=login` for forced re-authentication.
	pub supports_prompt_login: bool,
	/// Character used to join scopes in the `scope` parameter.
	pub scope_delimiter: char,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { pkce_required: false, supports_prompt_login: true, scope_delimiter: ' ' }
	}
}

//! Strongly typed identifiers for sessions and identity providers.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const SESSION_ID_BYTES: usize = 32;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (session, provider).
		kind: &'static str,
	},
	/// The identifier contains characters outside the cookie-safe alphabet.
	#[error("{kind} identifier contains an unsupported character.")]
	InvalidCharacter {
		/// Kind of identifier (session, provider).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (session, provider).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { SessionId, "Opaque identifier carried in the session cookie.", "Session" }
def_id! { ProviderId, "Identifier for an identity provider descriptor.", "Provider" }

impl SessionId {
	/// Mints a fresh identifier from 256 bits of randomness.
	pub fn generate() -> Self {
		let mut bytes = [0_u8; SESSION_ID_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}
}
// Session identifiers double as bearer handles, so keep them out of logs.
impl Debug for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let prefix: String = self.0.chars().take(6).collect();

		write!(f, "Session({prefix}…)")
	}
}
impl Display for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Debug::fmt(self, f)
	}
}
impl Debug for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider({})", self.0)
	}
}
impl Display for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if !view.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
		return Err(IdentifierError::InvalidCharacter { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_unsafe_characters() {
		assert!(SessionId::new(" session").is_err(), "Leading whitespace must be rejected.");
		assert!(SessionId::new("a;b").is_err(), "Cookie separators must be rejected.");
		assert!(ProviderId::new("").is_err());

		let provider = ProviderId::new("keycloak").expect("Provider fixture should be valid.");

		assert_eq!(provider.as_ref(), "keycloak");
	}

	#[test]
	fn generated_session_ids_are_unique_and_valid() {
		let first = SessionId::generate();
		let second = SessionId::generate();

		assert_ne!(first, second);
		assert_eq!(first.len(), 43);
		SessionId::new(first.as_ref()).expect("Generated identifiers must pass validation.");
	}

	#[test]
	fn session_id_formatting_hides_the_full_value() {
		let id = SessionId::new("abcdefghijklmnop").expect("Session fixture should be valid.");

		assert_eq!(format!("{id:?}"), "Session(abcdef…)");
		assert!(!id.to_string().contains("ghijklmnop"));
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let id: SessionId =
			serde_json::from_str("\"sess-42\"").expect("Session should deserialize successfully.");

		assert_eq!(id.as_ref(), "sess-42");
		assert!(serde_json::from_str::<SessionId>("\"with space\"").is_err());
	}

	#[test]
	fn length_limit_is_enforced() {
		ProviderId::new("a".repeat(IDENTIFIER_MAX_LEN)).expect("Exact length should succeed.");

		assert!(ProviderId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}
}

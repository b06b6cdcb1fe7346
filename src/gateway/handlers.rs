//! Route handlers, one module per route group.

pub mod auth;
pub mod blog;
pub mod diagnosis;
pub mod farm;
pub mod forum;
pub mod images;
pub mod weather;

// crates.io
use serde::de::{Deserializer, Error as _};
// self
use crate::_prelude::*;

/// Query string carrying an optional zero-based page index.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageQuery {
	/// Page index; absent means the first page.
	#[serde(default, deserialize_with = "lenient_page")]
	pub page: Option<u32>,
}
impl PageQuery {
	/// Page index, defaulting to zero.
	pub fn page(&self) -> u32 {
		self.page.unwrap_or(0)
	}
}

// Browsers send `page=` for an unset pager, which should read as the first page.
pub(crate) fn lenient_page<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;

	match raw.as_deref().map(str::trim) {
		None | Some("") => Ok(None),
		Some(value) => value.parse().map(Some).map_err(D::Error::custom),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_page_reads_as_first_page() {
		let query: PageQuery =
			serde_json::from_str(r#"{"page":""}"#).expect("Empty page should deserialize.");

		assert_eq!(query.page(), 0);

		let query: PageQuery =
			serde_json::from_str(r#"{"page":"3"}"#).expect("Numeric page should deserialize.");

		assert_eq!(query.page(), 3);
		assert!(serde_json::from_str::<PageQuery>(r#"{"page":"x"}"#).is_err());
	}
}

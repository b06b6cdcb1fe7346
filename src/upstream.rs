//! Upstream service access: the bearer-injecting client and the endpoint catalogue.
//!
//! Each service module exposes a borrowed API view over its base URL whose methods return
//! ready-to-send [`UpstreamRequest`]s. Path parameters are appended as encoded segments so
//! caller-supplied identifiers never escape their position in the path.

pub mod client;
pub mod diagnosis;
pub mod farm;
pub mod forum;
pub mod images;
pub mod weather;

pub use client::*;
pub use diagnosis::DiagnosisApi;
pub use farm::FarmApi;
pub use forum::{ForumApi, VoteType};
pub use images::ImagesApi;
pub use weather::WeatherApi;

// crates.io
use reqwest::Method;
use serde_json::Value;
// self
use crate::{_prelude::*, error::ConfigError};

/// Body attached to an upstream request.
#[derive(Clone, Debug, Default)]
pub enum UpstreamBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document.
	Json(Value),
	/// Multipart form carrying a single `image` file part.
	Image(ImageUpload),
}

/// Image file forwarded to the classification service.
#[derive(Clone)]
pub struct ImageUpload {
	/// Original file name reported by the browser.
	pub file_name: String,
	/// Declared MIME type, if any.
	pub content_type: Option<String>,
	/// Raw file contents.
	pub bytes: Vec<u8>,
}
impl Debug for ImageUpload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ImageUpload")
			.field("file_name", &self.file_name)
			.field("content_type", &self.content_type)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// A fully addressed call against one upstream service.
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
	/// Stable operation label used in spans and transport errors.
	pub operation: &'static str,
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including any query string.
	pub url: Url,
	/// Request body.
	pub body: UpstreamBody,
}
impl UpstreamRequest {
	/// Creates a body-less request.
	pub fn new(operation: &'static str, method: Method, url: Url) -> Self {
		Self { operation, method, url, body: UpstreamBody::Empty }
	}

	/// Appends a URL-encoded query parameter.
	pub fn query(mut self, key: &str, value: impl AsRef<str>) -> Self {
		self.url.query_pairs_mut().append_pair(key, value.as_ref());

		self
	}

	/// Attaches a JSON body.
	pub fn json(mut self, body: Value) -> Self {
		self.body = UpstreamBody::Json(body);

		self
	}

	/// Attaches a multipart image body.
	pub fn image(mut self, upload: ImageUpload) -> Self {
		self.body = UpstreamBody::Image(upload);

		self
	}
}

/// Successful upstream answer.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamReply {
	/// HTTP status returned by the service.
	pub status: u16,
	/// Parsed JSON body; [`Value::Null`] when the body was empty or not JSON.
	pub body: Value,
}

/// Joins `segments` onto `base`, rejecting identifiers that would rewrite the path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
	if let Some(bad) = segments.iter().find(|s| s.is_empty() || **s == "." || **s == "..") {
		return Err(Error::bad_request(format!("Invalid path parameter `{bad}`.")));
	}

	let mut url = base.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::InvalidServiceUrl { url: base.to_string() })?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

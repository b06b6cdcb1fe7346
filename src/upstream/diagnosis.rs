//! Soil diagnosis model service.

// crates.io
use reqwest::Method;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	upstream::{UpstreamRequest, endpoint},
};

/// Endpoint catalogue for the dirt diagnosis service.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosisApi<'a> {
	base: &'a Url,
}
impl<'a> DiagnosisApi<'a> {
	/// Creates a view rooted at the diagnosis service base URL.
	pub fn new(base: &'a Url) -> Self {
		Self { base }
	}

	/// `POST /predict` with the soil-feature document.
	pub fn predict(&self, features: Value) -> Result<UpstreamRequest> {
		Ok(UpstreamRequest::new("diagnosis.predict", Method::POST, endpoint(self.base, &["predict"])?)
			.json(features))
	}
}

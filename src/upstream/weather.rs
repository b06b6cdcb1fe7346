//! Third-party weather API. Authenticated by API key, never by bearer token.

// crates.io
use reqwest::Method;
// self
use crate::{
	_prelude::*,
	upstream::{UpstreamRequest, endpoint},
};

const FORECAST_DAYS: &str = "7";

/// Endpoint catalogue for the weather API.
#[derive(Clone, Copy, Debug)]
pub struct WeatherApi<'a> {
	base: &'a Url,
	api_key: Option<&'a str>,
}
impl<'a> WeatherApi<'a> {
	/// Creates a view rooted at the weather API base URL.
	pub fn new(base: &'a Url, api_key: Option<&'a str>) -> Self {
		Self { base, api_key }
	}

	/// `GET /forecast.json?q={lat},{long}&days=7&key`.
	pub fn forecast(&self, latitude: &str, longitude: &str) -> Result<UpstreamRequest> {
		let mut request =
			UpstreamRequest::new("weather.forecast", Method::GET, endpoint(self.base, &[
				"forecast.json",
			])?)
			.query("q", format!("{latitude},{longitude}"))
			.query("days", FORECAST_DAYS);

		if let Some(key) = self.api_key {
			request = request.query("key", key);
		}

		Ok(request)
	}
}

//! Farm-field monitoring service: fields, markers, seasons, and field members.

// crates.io
use reqwest::Method;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	upstream::{UpstreamRequest, endpoint},
};

/// Endpoint catalogue for the farm monitoring service.
#[derive(Clone, Copy, Debug)]
pub struct FarmApi<'a> {
	base: &'a Url,
}
impl<'a> FarmApi<'a> {
	/// Creates a view rooted at the farm service base URL.
	pub fn new(base: &'a Url) -> Self {
		Self { base }
	}

	/// `GET /fields`.
	pub fn fields(&self) -> Result<UpstreamRequest> {
		self.call("farm.fields", Method::GET, &["fields"])
	}

	/// `POST /fields`.
	pub fn create_field(&self, body: Value) -> Result<UpstreamRequest> {
		Ok(self.call("farm.create_field", Method::POST, &["fields"])?.json(body))
	}

	/// `GET /fields/{id}`.
	pub fn field(&self, field_id: &str) -> Result<UpstreamRequest> {
		self.call("farm.field", Method::GET, &["fields", field_id])
	}

	/// `DELETE /fields/{id}`.
	pub fn delete_field(&self, field_id: &str) -> Result<UpstreamRequest> {
		self.call("farm.delete_field", Method::DELETE, &["fields", field_id])
	}

	/// `POST /fields/{id}/markers`.
	pub fn create_marker(&self, field_id: &str, body: Value) -> Result<UpstreamRequest> {
		Ok(self.call("farm.create_marker", Method::POST, &["fields", field_id, "markers"])?.json(body))
	}

	/// `DELETE /fields/{id}/markers/{markerId}`.
	pub fn delete_marker(&self, field_id: &str, marker_id: &str) -> Result<UpstreamRequest> {
		self.call("farm.delete_marker", Method::DELETE, &["fields", field_id, "markers", marker_id])
	}

	/// `GET /fields/{id}/seasons?page`.
	pub fn seasons(&self, field_id: &str, page: u32) -> Result<UpstreamRequest> {
		Ok(self
			.call("farm.seasons", Method::GET, &["fields", field_id, "seasons"])?
			.query("page", page.to_string()))
	}

	/// `POST /fields/{id}/seasons`.
	pub fn create_season(&self, field_id: &str, body: Value) -> Result<UpstreamRequest> {
		Ok(self.call("farm.create_season", Method::POST, &["fields", field_id, "seasons"])?.json(body))
	}

	/// `PUT /fields/{id}/seasons/{seasonId}`.
	pub fn update_season(
		&self,
		field_id: &str,
		season_id: &str,
		body: Value,
	) -> Result<UpstreamRequest> {
		Ok(self
			.call("farm.update_season", Method::PUT, &["fields", field_id, "seasons", season_id])?
			.json(body))
	}

	/// `DELETE /fields/{id}/seasons/{seasonId}`.
	pub fn delete_season(&self, field_id: &str, season_id: &str) -> Result<UpstreamRequest> {
		self.call("farm.delete_season", Method::DELETE, &["fields", field_id, "seasons", season_id])
	}

	/// `GET /fields/{id}/users`.
	pub fn members(&self, field_id: &str) -> Result<UpstreamRequest> {
		self.call("farm.members", Method::GET, &["fields", field_id, "users"])
	}

	/// `POST /fields/{id}/users?userId`.
	pub fn add_member(&self, field_id: &str, user_id: &str) -> Result<UpstreamRequest> {
		Ok(self
			.call("farm.add_member", Method::POST, &["fields", field_id, "users"])?
			.query("userId", user_id))
	}

	/// `DELETE /fields/{id}/users?userId`.
	pub fn remove_member(&self, field_id: &str, user_id: &str) -> Result<UpstreamRequest> {
		Ok(self
			.call("farm.remove_member", Method::DELETE, &["fields", field_id, "users"])?
			.query("userId", user_id))
	}

	fn call(
		&self,
		operation: &'static str,
		method: Method,
		segments: &[&str],
	) -> Result<UpstreamRequest> {
		Ok(UpstreamRequest::new(operation, method, endpoint(self.base, segments)?))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn season_listing_is_paged() {
		let base = Url::parse("http://farm.local/farm-service").expect("Base should parse.");
		let request = FarmApi::new(&base).seasons("12", 0).expect("Seasons request should build.");

		assert_eq!(request.url.as_str(), "http://farm.local/farm-service/fields/12/seasons?page=0");
	}

	#[test]
	fn member_changes_pass_the_user_as_query() {
		let base = Url::parse("http://farm.local/farm-service").expect("Base should parse.");
		let api = FarmApi::new(&base);
		let add = api.add_member("12", "user-7").expect("Add request should build.");
		let remove = api.remove_member("12", "user-7").expect("Remove request should build.");

		assert_eq!(add.method, Method::POST);
		assert_eq!(remove.method, Method::DELETE);
		assert_eq!(remove.url.as_str(), "http://farm.local/farm-service/fields/12/users?userId=user-7");
	}
}

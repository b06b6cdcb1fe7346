//! Image classification service.

// crates.io
use reqwest::Method;
// self
use crate::{
	_prelude::*,
	upstream::{ImageUpload, UpstreamRequest, endpoint},
};

const IMAGES: [&str; 3] = ["api", "v2", "images"];

/// Endpoint catalogue for the image service.
#[derive(Clone, Copy, Debug)]
pub struct ImagesApi<'a> {
	base: &'a Url,
}
impl<'a> ImagesApi<'a> {
	/// Creates a view rooted at the image service base URL.
	pub fn new(base: &'a Url) -> Self {
		Self { base }
	}

	/// `GET /api/v2/images?page`.
	pub fn list(&self, page: u32) -> Result<UpstreamRequest> {
		Ok(UpstreamRequest::new("images.list", Method::GET, endpoint(self.base, &IMAGES)?)
			.query("page", page.to_string()))
	}

	/// `POST /api/v2/images` with the file as the `image` part.
	pub fn classify(&self, upload: ImageUpload) -> Result<UpstreamRequest> {
		Ok(UpstreamRequest::new("images.classify", Method::POST, endpoint(self.base, &IMAGES)?)
			.image(upload))
	}

	/// `DELETE /api/v2/images/{id}`.
	pub fn delete(&self, image_id: &str) -> Result<UpstreamRequest> {
		let [api, version, images] = IMAGES;

		Ok(UpstreamRequest::new(
			"images.delete",
			Method::DELETE,
			endpoint(self.base, &[api, version, images, image_id])?,
		))
	}
}

//! Bearer-injecting HTTP client for upstream services.

// crates.io
use reqwest::{
	StatusCode,
	header::ACCEPT,
	multipart::{Form, Part},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::TransportError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	upstream::{ImageUpload, UpstreamBody, UpstreamReply, UpstreamRequest},
};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Sends [`UpstreamRequest`]s and maps their outcome onto gateway errors.
///
/// 2xx answers become an [`UpstreamReply`]. A 401 becomes [`Error::UpstreamUnauthorized`], any
/// other failure status becomes [`Error::Upstream`] carrying the body text, and network
/// failures become [`Error::Transport`].
#[derive(Clone, Debug)]
pub struct UpstreamClient {
	http: ReqwestClient,
}
impl UpstreamClient {
	/// Wraps an existing reqwest client.
	pub fn new(http: ReqwestClient) -> Self {
		Self { http }
	}

	/// Builds a client with a request timeout and redirects disabled.
	pub fn build() -> Result<Self> {
		let http = ReqwestClient::builder()
			.timeout(REQUEST_TIMEOUT)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self::new(http))
	}

	/// Sends `request`, attaching `Authorization: Bearer` when `bearer` is present.
	pub async fn send(
		&self,
		request: UpstreamRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<UpstreamReply> {
		const KIND: FlowKind = FlowKind::Proxy;

		let span = FlowSpan::new(KIND, request.operation);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch(request, bearer)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn dispatch(
		&self,
		request: UpstreamRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<UpstreamReply> {
		let UpstreamRequest { operation, method, url, body } = request;
		let mut builder = self.http.request(method, url).header(ACCEPT, "application/json");

		if let Some(token) = bearer {
			builder = builder.bearer_auth(token.expose());
		}

		builder = match body {
			UpstreamBody::Empty => builder,
			UpstreamBody::Json(value) => builder.json(&value),
			UpstreamBody::Image(upload) => builder.multipart(image_form(upload)?),
		};

		let response =
			builder.send().await.map_err(|e| TransportError::network(operation, e))?;
		let status = response.status();
		let text = response.text().await.map_err(|e| TransportError::network(operation, e))?;

		if status == StatusCode::UNAUTHORIZED {
			tracing::info!(operation, "upstream rejected the access token");

			return Err(Error::UpstreamUnauthorized);
		}
		if !status.is_success() {
			tracing::warn!(operation, status = status.as_u16(), "upstream returned an error status");

			return Err(Error::Upstream { status: status.as_u16(), details: text });
		}

		Ok(UpstreamReply { status: status.as_u16(), body: parse_body(&text) })
	}
}

fn image_form(upload: ImageUpload) -> Result<Form> {
	let ImageUpload { file_name, content_type, bytes } = upload;
	let mut part = Part::bytes(bytes).file_name(file_name);

	if let Some(content_type) = content_type {
		part = part
			.mime_str(&content_type)
			.map_err(|_| Error::bad_request(format!("Unsupported content type `{content_type}`.")))?;
	}

	Ok(Form::new().part("image", part))
}

fn parse_body(text: &str) -> Value {
	if text.trim().is_empty() {
		return Value::Null;
	}

	serde_json::from_str(text).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn non_json_bodies_collapse_to_null() {
		assert_eq!(parse_body(""), Value::Null);
		assert_eq!(parse_body("  \n"), Value::Null);
		assert_eq!(parse_body("<html>oops</html>"), Value::Null);
		assert_eq!(parse_body("{\"id\":7}"), serde_json::json!({ "id": 7 }));
	}

	#[test]
	fn invalid_mime_types_are_rejected() {
		let upload = ImageUpload {
			file_name: "leaf.png".into(),
			content_type: Some("not a mime".into()),
			bytes: vec![1, 2, 3],
		};

		assert!(matches!(image_form(upload), Err(Error::InvalidRequest { status: 400, .. })));
	}
}

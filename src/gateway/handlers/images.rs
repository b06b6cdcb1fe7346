//! Image classification routes.

// crates.io
use axum::{
	extract::{Multipart, Path, Query, State, multipart::MultipartError},
	http::StatusCode,
};
// self
use crate::{
	gateway::{ApiError, ApiResult, AppState, Envelope, RequiredSession, handlers::PageQuery},
	upstream::{ImageUpload, ImagesApi},
};

const IMAGE_FIELD: &str = "image";

/// `GET /api/images?page`.
pub async fn list(
	State(state): State<AppState>,
	session: RequiredSession,
	Query(query): Query<PageQuery>,
) -> ApiResult {
	let api = ImagesApi::new(&state.config.services.images);
	let reply = state
		.forward(
			api.list(query.page()),
			Some(session.bearer()),
			"Something went wrong fetching images",
		)
		.await?;

	Ok(Envelope::Data(reply.body))
}

/// `DELETE /api/images/{imageId}`.
pub async fn delete(
	State(state): State<AppState>,
	session: RequiredSession,
	Path(image_id): Path<String>,
) -> ApiResult {
	let api = ImagesApi::new(&state.config.services.images);

	state
		.forward(
			api.delete(&image_id),
			Some(session.bearer()),
			"Error while connecting to Image-Service:",
		)
		.await?;

	Ok(Envelope::Done)
}

/// `POST /api/classify` with a multipart `image` file.
pub async fn classify(
	State(state): State<AppState>,
	session: RequiredSession,
	mut multipart: Multipart,
) -> ApiResult {
	let Some(upload) = read_image(&mut multipart).await? else {
		return Err(ApiError::json(StatusCode::BAD_REQUEST, "No file provided"));
	};

	tracing::debug!(file = %upload.file_name, len = upload.bytes.len(), "classifying image");

	let api = ImagesApi::new(&state.config.services.images);
	let reply =
		state.forward(api.classify(upload), Some(session.bearer()), "Backend error").await?;

	Ok(Envelope::Data(reply.body))
}

async fn read_image(multipart: &mut Multipart) -> Result<Option<ImageUpload>, ApiError> {
	while let Some(field) = multipart.next_field().await.map_err(malformed)? {
		if field.name() != Some(IMAGE_FIELD) {
			continue;
		}

		let file_name = field.file_name().unwrap_or(IMAGE_FIELD).to_owned();
		let content_type = field.content_type().map(str::to_owned);
		let bytes = field.bytes().await.map_err(malformed)?;

		if bytes.is_empty() {
			return Ok(None);
		}

		return Ok(Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() }));
	}

	Ok(None)
}

fn malformed(e: MultipartError) -> ApiError {
	ApiError::Json {
		status: e.status(),
		message: "Malformed multipart body.".into(),
		details: Some(e.body_text()),
	}
}

// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;
// self
use agro_gateway::{_preludet::*, gateway};

const REALM: &str = "/realms/agro";
const TOKEN_PATH: &str = "/realms/agro/protocol/openid-connect/token";
const LOGOUT_PATH: &str = "/realms/agro/protocol/openid-connect/logout";

fn app(server: &MockServer) -> (Router, Arc<agro_gateway::store::MemoryStore>) {
	let (state, store) = build_test_state(&server.url(REALM), &server.base_url());

	(gateway::router(state), store)
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
	request("GET", uri, session, Body::empty())
}

fn request(method: &str, uri: &str, session: Option<&str>, body: Body) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(uri);

	if let Some(session) = session {
		builder = builder.header(header::COOKIE, format!("{TEST_COOKIE_NAME}={session}"));
	}

	builder.body(body).expect("Test request should build.")
}

fn json_request(method: &str, uri: &str, session: Option<&str>, payload: Value) -> Request<Body> {
	let mut request = request(method, uri, session, Body::from(payload.to_string()));

	request.headers_mut().insert(
		header::CONTENT_TYPE,
		"application/json".parse().expect("Content type should parse."),
	);

	request
}

async fn call(app: &Router, request: Request<Body>) -> Response {
	app.clone().oneshot(request).await.expect("Router should answer every request.")
}

async fn json_body(response: Response) -> Value {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	serde_json::from_slice(&bytes).expect("Body should be JSON.")
}

fn location(response: &Response) -> &str {
	response
		.headers()
		.get(header::LOCATION)
		.and_then(|v| v.to_str().ok())
		.expect("Redirect should carry a location.")
}

fn set_cookie(response: &Response) -> &str {
	response
		.headers()
		.get(header::SET_COOKIE)
		.and_then(|v| v.to_str().ok())
		.expect("Response should set a cookie.")
}

fn cookie_named<'a>(response: &'a Response, name: &str) -> &'a str {
	let prefix = format!("{name}=");

	response
		.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.find(|v| v.starts_with(&prefix))
		.expect("Response should set the named cookie.")
}

fn handshake_cookie_name() -> String {
	format!("{TEST_COOKIE_NAME}_state")
}

fn state_of(response: &Response) -> String {
	let authorize = Url::parse(location(response)).expect("Authorize URL should parse.");

	authorize
		.query_pairs()
		.find(|(k, _)| k == "state")
		.map(|(_, v)| v.into_owned())
		.expect("Authorize URL should carry a state.")
}

fn callback_request(state: &str, cookie: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder()
		.method("GET")
		.uri(format!("/api/auth/callback?code=code-7&state={state}"));

	if let Some(cookie) = cookie {
		builder = builder.header(header::COOKIE, cookie);
	}

	builder.body(Body::empty()).expect("Test request should build.")
}

async fn mock_code_exchange(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.body_includes("grant_type=authorization_code")
				.body_includes("code=code-7");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-7\",\"refresh_token\":\"refresh-7\",\"token_type\":\"Bearer\",\"expires_in\":300}",
				);
		})
		.await
}

#[tokio::test]
async fn healthz_answers_ok() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let response = call(&app, get("/healthz", None)).await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn fresh_session_token_reaches_the_forum_service() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-forum", "access-fresh", "refresh-fresh", Duration::hours(1)).await;

	let upstream = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/forum-service/questions")
				.query_param("page", "2")
				.query_param("tagId", "7")
				.header("authorization", "Bearer access-fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"title\":\"Wheat rust?\"}]");
		})
		.await;
	let response =
		call(&app, get("/api/forum/questions?page=2&tagId=7", Some("sess-forum"))).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": [{ "id": 1, "title": "Wheat rust?" }] }));

	upstream.assert_calls_async(1).await;
}

#[tokio::test]
async fn expired_session_is_refreshed_before_proxying() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-farm", "access-old", "refresh-old", Duration::minutes(5)).await;

	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).body_includes("refresh_token=refresh-old");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"Bearer\",\"expires_in\":300}",
				);
		})
		.await;
	let upstream = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/farm-service/fields")
				.header("authorization", "Bearer access-new");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let response = call(&app, get("/api/farm/fields", Some("sess-farm"))).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": [] }));

	token.assert_calls_async(1).await;
	upstream.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_refresh_redirects_to_forced_sign_in() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-dead", "access-old", "refresh-dead", Duration::minutes(5)).await;

	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Token is not active\"}");
		})
		.await;
	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGOUT_PATH);
			then.status(204);
		})
		.await;
	let upstream = server
		.mock_async(|when, then| {
			when.path_includes("/farm-service");
			then.status(200);
		})
		.await;
	let response = call(&app, get("/api/farm/fields", Some("sess-dead"))).await;

	assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(location(&response), "/api/auth/signin?prompt=login");

	let cookie = set_cookie(&response);

	assert!(cookie.starts_with(&format!("{TEST_COOKIE_NAME}=")));
	assert!(cookie.contains("Max-Age=0"), "cookie should be expired: {cookie}");

	token.assert_calls_async(1).await;
	logout.assert_calls_async(1).await;
	upstream.assert_calls_async(0).await;

	assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn upstream_failures_are_forwarded_with_details() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-ask", "access-ask", "refresh-ask", Duration::hours(1)).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/forum-service/questions").body_includes("\"title\":\"Hi\"");
			then.status(422).body("title too short");
		})
		.await;

	let response = call(
		&app,
		json_request("POST", "/api/forum/questions", Some("sess-ask"), json!({ "title": "Hi" })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(
		json_body(response).await,
		json!({ "error": "Error while uploading question to backend.", "details": "title too short" })
	);
}

#[tokio::test]
async fn created_question_answers_with_its_id() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-new", "access-new", "refresh-new", Duration::hours(1)).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/forum-service/questions");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"id\":42,\"title\":\"Soil pH for barley\"}");
		})
		.await;

	let response = call(
		&app,
		json_request(
			"POST",
			"/api/forum/questions",
			Some("sess-new"),
			json!({ "title": "Soil pH for barley" }),
		),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": { "questionId": 42 } }));
}

#[tokio::test]
async fn upstream_unauthorized_sends_the_browser_to_sign_in() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-401", "access-401", "refresh-401", Duration::hours(1)).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/image-service/api/v2/images");
			then.status(401);
		})
		.await;

	let response = call(&app, get("/api/images", Some("sess-401"))).await;

	assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(location(&response), "/api/auth/signin");
}

#[tokio::test]
async fn missing_session_redirects_api_calls_to_sign_in() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let upstream = server
		.mock_async(|when, then| {
			when.path_includes("/forum-service");
			then.status(200);
		})
		.await;
	let response = call(&app, get("/api/forum/tags", None)).await;

	assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(location(&response), "/api/auth/signin");

	upstream.assert_calls_async(0).await;
}

#[tokio::test]
async fn protected_pages_require_a_session() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);
	let upstream = server
		.mock_async(|when, then| {
			when.path_includes("/farm-service");
			then.status(200);
		})
		.await;
	let response = call(&app, get("/farm/fields/12", None)).await;

	assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(location(&response), "/api/auth/signin?callbackUrl=%2Ffarm%2Ffields%2F12");

	upstream.assert_calls_async(0).await;

	seed_session(&store, "sess-page", "access-page", "refresh-page", Duration::hours(1)).await;

	// Pages are served by the front-end, so a signed-in request falls through to the 404 JSON.
	let response = call(&app, get("/farm/fields/12", Some("sess-page"))).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let response = call(&app, get("/forum", None)).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vote_type_is_validated_before_the_session() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);
	let response =
		call(&app, request("POST", "/api/forum/questions/3/votes?voteType=SIDEWAYS", None, Body::empty()))
			.await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	assert_eq!(
		json_body(response).await,
		json!({ "error": "voteType search parameter value can only be UP or DOWN" })
	);

	let response =
		call(&app, request("POST", "/api/forum/questions/3/votes", None, Body::empty())).await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	seed_session(&store, "sess-vote", "access-vote", "refresh-vote", Duration::hours(1)).await;

	let upstream = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/forum-service/questions/3/votes")
				.query_param("voteType", "UP")
				.header("authorization", "Bearer access-vote");
			then.status(200);
		})
		.await;
	let response = call(
		&app,
		request("POST", "/api/forum/questions/3/votes?voteType=UP", Some("sess-vote"), Body::empty()),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	upstream.assert_calls_async(1).await;
}

#[tokio::test]
async fn answers_degrade_to_an_empty_list_when_the_forum_is_down() {
	let server = MockServer::start_async().await;
	let (state, _store) = build_test_state(&server.url(REALM), "http://127.0.0.1:9");
	let app = gateway::router(state);
	let response = call(&app, get("/api/forum/questions/5/answers", None)).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": [] }));

	let response = call(&app, get("/api/blog/posts/5/comments", None)).await;

	assert_eq!(json_body(response).await, json!({ "data": [] }));
}

#[tokio::test]
async fn classify_requires_an_image_part() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-img", "access-img", "refresh-img", Duration::hours(1)).await;

	let mut request = request(
		"POST",
		"/api/classify",
		Some("sess-img"),
		Body::from("--XBOUNDARY\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nleaf\r\n--XBOUNDARY--\r\n"),
	);

	request.headers_mut().insert(
		header::CONTENT_TYPE,
		"multipart/form-data; boundary=XBOUNDARY".parse().expect("Content type should parse."),
	);

	let response = call(&app, request).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await, json!({ "error": "No file provided" }));
}

#[tokio::test]
async fn classify_forwards_the_image_as_multipart() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-cls", "access-cls", "refresh-cls", Duration::hours(1)).await;

	let upstream = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/image-service/api/v2/images")
				.header("authorization", "Bearer access-cls")
				.body_includes("name=\"image\"")
				.body_includes("leaf-bytes");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"label\":\"leaf_rust\"}");
		})
		.await;
	let mut request = request(
		"POST",
		"/api/classify",
		Some("sess-cls"),
		Body::from(
			"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"image\"; filename=\"leaf.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nleaf-bytes\r\n--XBOUNDARY--\r\n",
		),
	);

	request.headers_mut().insert(
		header::CONTENT_TYPE,
		"multipart/form-data; boundary=XBOUNDARY".parse().expect("Content type should parse."),
	);

	let response = call(&app, request).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": { "label": "leaf_rust" } }));

	upstream.assert_calls_async(1).await;
}

#[tokio::test]
async fn weather_needs_coordinates_and_sends_the_key_only() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-sky", "access-sky", "refresh-sky", Duration::hours(1)).await;

	let response = call(&app, get("/api/weather-api?latitude=45.2", Some("sess-sky"))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await, json!({ "error": "latitude and longitude are required" }));

	let upstream = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/weather/forecast.json")
				.query_param("q", "45.2,19.8")
				.query_param("days", "7")
				.query_param("key", "weather-key")
				.header_missing("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"forecast\":{\"forecastday\":[]}}");
		})
		.await;
	let response =
		call(&app, get("/api/weather-api?latitude=45.2&longitude=19.8", Some("sess-sky"))).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": { "forecast": { "forecastday": [] } } }));

	upstream.assert_calls_async(1).await;
}

#[tokio::test]
async fn member_routes_require_the_user_id() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-team", "access-team", "refresh-team", Duration::hours(1)).await;

	let response =
		call(&app, request("POST", "/api/farm/fields/8/users", Some("sess-team"), Body::empty()))
			.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await, json!({ "error": "userId search parameter is mandatory" }));
}

#[tokio::test]
async fn sign_in_round_trip_sets_the_session_cookie() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);
	let response = call(&app, get("/api/auth/signin?callbackUrl=%2Ffarm%2Ffields", None)).await;

	assert_eq!(response.status(), StatusCode::FOUND);

	let authorize = Url::parse(location(&response)).expect("Authorize URL should parse.");

	assert_eq!(authorize.path(), "/realms/agro/protocol/openid-connect/auth");

	let state = state_of(&response);
	let handshake = cookie_named(&response, &handshake_cookie_name());

	assert!(handshake.contains("HttpOnly"));
	assert!(handshake.contains("Path=/api/auth"));

	// Browsers send back only the `name=value` pair.
	let handshake = handshake.split(';').next().expect("Cookie should have a value.").to_owned();
	let token = mock_code_exchange(&server).await;
	let response = call(&app, callback_request(&state, Some(&handshake))).await;

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/farm/fields");

	let cookie = cookie_named(&response, TEST_COOKIE_NAME);

	assert!(cookie.contains("HttpOnly"));
	assert!(cookie.contains("SameSite=Lax"));
	assert!(cookie_named(&response, &handshake_cookie_name()).contains("Max-Age=0"));

	token.assert_calls_async(1).await;

	assert_eq!(store.session_count(), 1);

	let response = call(&app, get("/api/auth/callback?error=access_denied", None)).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_without_the_handshake_cookie_is_rejected() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);
	let response = call(&app, get("/api/auth/signin", None)).await;
	let state = state_of(&response);
	let token = mock_code_exchange(&server).await;

	// A link forged by someone else reaches the victim's browser without the cookie.
	let response = call(&app, callback_request(&state, None)).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(
		json_body(response).await,
		json!({ "error": "Sign-in state does not match this browser." })
	);

	let foreign = format!("{}=someone-elses-state", handshake_cookie_name());
	let response = call(&app, callback_request(&state, Some(&foreign))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	token.assert_calls_async(0).await;

	assert_eq!(store.session_count(), 0);

	// The pending sign-in was left untouched for its own browser.
	let own = format!("{}={state}", handshake_cookie_name());
	let response = call(&app, callback_request(&state, Some(&own))).await;

	assert_eq!(response.status(), StatusCode::FOUND);

	token.assert_calls_async(1).await;

	assert_eq!(store.session_count(), 1);
}

#[tokio::test]
async fn sign_out_clears_the_cookie_and_the_provider_session() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-bye", "access-bye", "refresh-bye", Duration::hours(1)).await;

	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGOUT_PATH).body_includes("refresh_token=refresh-bye");
			then.status(204);
		})
		.await;
	let response =
		call(&app, request("POST", "/api/auth/signout", Some("sess-bye"), Body::empty())).await;

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/");
	assert!(set_cookie(&response).contains("Max-Age=0"));

	logout.assert_calls_async(1).await;

	assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn sign_out_only_accepts_post() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-stay", "access-stay", "refresh-stay", Duration::hours(1)).await;

	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGOUT_PATH);
			then.status(204);
		})
		.await;
	let response = call(&app, get("/api/auth/signout", Some("sess-stay"))).await;

	assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
	assert!(response.headers().get(header::SET_COOKIE).is_none());

	logout.assert_calls_async(0).await;

	assert_eq!(store.session_count(), 1);
}

#[tokio::test]
async fn dirt_diagnosis_forwards_soil_features() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-soil", "access-soil", "refresh-soil", Duration::hours(1)).await;

	let upstream = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/dirt-service/predict")
				.header("authorization", "Bearer access-soil")
				.body_includes("\"ph\":6.5");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"prediction\":\"loam\"}");
		})
		.await;
	let response = call(
		&app,
		json_request("POST", "/api/dirt-diagnosis", Some("sess-soil"), json!({ "ph": 6.5 })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": { "prediction": "loam" } }));

	upstream.assert_calls_async(1).await;
}

#[tokio::test]
async fn farm_field_routes_forward_with_the_bearer() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-field", "access-field", "refresh-field", Duration::hours(1)).await;

	let field = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/farm-service/fields/12")
				.header("authorization", "Bearer access-field");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":12,\"name\":\"North plot\"}");
		})
		.await;
	let removed = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/farm-service/fields/12")
				.header("authorization", "Bearer access-field");
			then.status(204);
		})
		.await;
	let marker = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/farm-service/fields/12/markers")
				.header("authorization", "Bearer access-field")
				.body_includes("\"lat\":45.1");
			then.status(201);
		})
		.await;
	let unmarked = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/farm-service/fields/12/markers/4")
				.header("authorization", "Bearer access-field");
			then.status(204);
		})
		.await;
	let response = call(&app, get("/api/farm/fields/12", Some("sess-field"))).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": { "id": 12, "name": "North plot" } }));

	let response = call(
		&app,
		json_request(
			"POST",
			"/api/farm/fields/12/markers",
			Some("sess-field"),
			json!({ "lat": 45.1, "lng": 19.8 }),
		),
	)
	.await;

	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	let response = call(
		&app,
		request("DELETE", "/api/farm/fields/12/markers/4", Some("sess-field"), Body::empty()),
	)
	.await;

	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	let response =
		call(&app, request("DELETE", "/api/farm/fields/12", Some("sess-field"), Body::empty()))
			.await;

	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	field.assert_calls_async(1).await;
	marker.assert_calls_async(1).await;
	unmarked.assert_calls_async(1).await;
	removed.assert_calls_async(1).await;
}

#[tokio::test]
async fn farm_season_routes_forward_with_the_bearer() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-season", "access-season", "refresh-season", Duration::hours(1))
		.await;

	let listing = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/farm-service/fields/12/seasons")
				.query_param("page", "0")
				.header("authorization", "Bearer access-season");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":3,\"crop\":\"maize\"}]");
		})
		.await;
	let updated = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/farm-service/fields/12/seasons/3")
				.header("authorization", "Bearer access-season")
				.body_includes("\"crop\":\"wheat\"");
			then.status(200);
		})
		.await;
	let removed = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/farm-service/fields/12/seasons/3")
				.header("authorization", "Bearer access-season");
			then.status(204);
		})
		.await;
	let response = call(&app, get("/api/farm/fields/12/seasons", Some("sess-season"))).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": [{ "id": 3, "crop": "maize" }] }));

	let response = call(
		&app,
		json_request(
			"PUT",
			"/api/farm/fields/12/seasons/3",
			Some("sess-season"),
			json!({ "crop": "wheat" }),
		),
	)
	.await;

	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	let response = call(
		&app,
		request("DELETE", "/api/farm/fields/12/seasons/3", Some("sess-season"), Body::empty()),
	)
	.await;

	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	listing.assert_calls_async(1).await;
	updated.assert_calls_async(1).await;
	removed.assert_calls_async(1).await;
}

#[tokio::test]
async fn image_listing_and_deletion_forward_with_the_bearer() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed_session(&store, "sess-pics", "access-pics", "refresh-pics", Duration::hours(1)).await;

	let listing = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/image-service/api/v2/images")
				.query_param("page", "2")
				.header("authorization", "Bearer access-pics");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":\"img-9\"}]");
		})
		.await;
	let removed = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/image-service/api/v2/images/img-9")
				.header("authorization", "Bearer access-pics");
			then.status(204);
		})
		.await;
	let response = call(&app, get("/api/images?page=2", Some("sess-pics"))).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "data": [{ "id": "img-9" }] }));

	let response =
		call(&app, request("DELETE", "/api/images/img-9", Some("sess-pics"), Body::empty())).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "status": 200 }));

	listing.assert_calls_async(1).await;
	removed.assert_calls_async(1).await;
}

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::{Map, Value, json};
// self
use quickbooks_oauth::{
	client::{RequestBody, ToMapping},
	config::ClientOptions,
	error::{Error, ParseError, TransportError},
	reqwest::Method,
	signer::OAuthParams,
};

struct Customer {
	display_name: &'static str,
}
impl ToMapping for Customer {
	fn to_mapping(&self) -> Map<String, Value> {
		let mut map = Map::new();

		map.insert("DisplayName".into(), self.display_name.into());

		map
	}
}

fn expected_authorization(client: &quickbooks_oauth::client::Client, method: &Method, url: &str) -> String {
	let mut extra = OAuthParams::new();

	extra.insert("oauth_token".into(), client.config().token.token);

	client
		.sign(method, &common::url(url), &extra)
		.expect("Reference signature should succeed.")
		.authorization_header()
		.expect("Token-bearing requests should be signed in a header.")
		.to_owned()
}

#[tokio::test]
async fn get_sends_signed_json_request_to_company_path() {
	let server = MockServer::start_async().await;
	let client = common::client(&server);
	let authorization =
		expected_authorization(&client, &Method::GET, &server.url("/v3/company/123/customer/42"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v3/company/123/customer/42")
				.header("accept", "application/json")
				.header("content-type", "application/json")
				.header("authorization", authorization.as_str());
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Customer\":{\"Id\":\"42\"}}");
		})
		.await;
	let value = client.get("/customer/42/").await.expect("Signed GET should succeed.");

	mock.assert_async().await;

	assert_eq!(value, json!({ "Customer": { "Id": "42" } }));
}

#[tokio::test]
async fn tokenless_configuration_still_signs_in_a_header() {
	let server = MockServer::start_async().await;
	let client = common::client(&server);

	client.configure_with_env(
		ClientOptions::default()
			.consumer(common::CONSUMER_KEY, common::CONSUMER_SECRET)
			.company_id(common::COMPANY_ID),
		|_| None,
	);

	let authorization =
		expected_authorization(&client, &Method::GET, &server.url("/v3/company/123/companyinfo/123"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v3/company/123/companyinfo/123")
				.header("authorization", authorization.as_str());
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let value = client.get("companyinfo/123").await.expect("Tokenless GET should succeed.");

	mock.assert_async().await;

	assert!(authorization.contains("oauth_token=\"\""));
	assert_eq!(value, json!({}));
}

#[tokio::test]
async fn post_converts_builder_bodies() {
	let server = MockServer::start_async().await;
	let client = common::client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v3/company/123/customer")
				.header_exists("authorization")
				.json_body(json!({ "DisplayName": "Acme" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Customer\":{\"Id\":\"7\",\"DisplayName\":\"Acme\"}}");
		})
		.await;
	let customer = Customer { display_name: "Acme" };
	let value = client
		.post("customer", RequestBody::Builder(&customer))
		.await
		.expect("Signed POST should succeed.");

	mock.assert_async().await;

	assert_eq!(value["Customer"]["Id"], "7");
}

#[tokio::test]
async fn non_success_status_surfaces_body_preview() {
	let server = MockServer::start_async().await;
	let client = common::client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/company/123/companyinfo/123");
			then.status(401).body("AuthenticationFailed");
		})
		.await;
	let err = client.get("companyinfo/123").await.expect_err("401 responses must fail.");

	mock.assert_async().await;

	match err {
		Error::Transport(TransportError::Status { endpoint, status, body }) => {
			assert_eq!(endpoint, "api");
			assert_eq!(status, 401);
			assert_eq!(body, "AuthenticationFailed");
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn invalid_json_is_a_parse_error() {
	let server = MockServer::start_async().await;
	let client = common::client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/company/123/query");
			then.status(200).header("content-type", "application/json").body("{\"QueryResponse\":");
		})
		.await;
	let err = client.get("query").await.expect_err("Truncated JSON must fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Parse(ParseError::Json { status: Some(200), .. })));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
	let endpoints = quickbooks_oauth::config::Endpoints::builder()
		.api_base(common::url("http://127.0.0.1:9/v3/company"))
		.build()
		.expect("Loopback endpoints should be valid.");
	let client = common::client_with(
		endpoints,
		std::sync::Arc::new(quickbooks_oauth::clock::FixedClock::new(common::now())),
	);
	let err = client.get("customer/1").await.expect_err("Closed ports must fail.");

	assert!(matches!(err, Error::Transport(TransportError::Network { endpoint: "api", .. })));
}

#![allow(dead_code)]

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use httpmock::MockServer;
use time::{OffsetDateTime, macros};
// self
use quickbooks_oauth::{
	client::Client,
	clock::FixedClock,
	config::{ClientOptions, ConnectOptions, Endpoints},
	connect::Connector,
	signer::FixedNonce,
	url::Url,
};

pub const CONSUMER_KEY: &str = "CK";
pub const CONSUMER_SECRET: &str = "CS";
pub const OAUTH_TOKEN: &str = "OT";
pub const OAUTH_TOKEN_SECRET: &str = "OTS";
pub const COMPANY_ID: &str = "123";
pub const NONCE: &str = "abcdefghij";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";

pub fn now() -> OffsetDateTime {
	macros::datetime!(2025-01-01 00:00 UTC)
}

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Mock URL should parse successfully.")
}

pub fn endpoints(server: &MockServer) -> Endpoints {
	Endpoints::builder()
		.api_base(url(&server.url("/v3/company")))
		.authorization_endpoint(url(&server.url("/connect/oauth2")))
		.token_endpoint(url(&server.url("/token")))
		.build()
		.expect("Mock endpoints should be valid.")
}

pub fn client_with(endpoints: Endpoints, clock: std::sync::Arc<FixedClock>) -> Client {
	let client = Client::from_config(endpoints, Default::default())
		.with_clock(clock)
		.with_nonce_source(std::sync::Arc::new(FixedNonce::new(NONCE)));

	client.configure_with_env(
		ClientOptions::default()
			.consumer(CONSUMER_KEY, CONSUMER_SECRET)
			.oauth_token(OAUTH_TOKEN, OAUTH_TOKEN_SECRET)
			.company_id(COMPANY_ID),
		|_| None,
	);

	client
}

pub fn client(server: &MockServer) -> Client {
	client_with(endpoints(server), std::sync::Arc::new(FixedClock::new(now())))
}

pub fn connector(server: &MockServer, clock: std::sync::Arc<FixedClock>) -> Connector {
	Connector::new(
		client_with(endpoints(server), clock),
		ConnectOptions::new(CLIENT_ID, CLIENT_SECRET).with_redirect_uri(REDIRECT_URI),
	)
}

pub fn basic_auth() -> String {
	format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")))
}

//! OAuth 1.0a signed client for the QuickBooks REST API.
//!
//! [`Client`] owns the resolved configuration behind a lock so [`Client::configure`] can swap it
//! wholesale while requests are in flight; each request signs against a snapshot.

// crates.io
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::{ClientConfig, ClientOptions, Endpoints},
	error::{ParseError, TransportError},
	http::ReqwestHttpClient,
	obs::{self, FlowKind},
	signer::{NonceSource, OAuthParams, RandomNonce, SignedRequest, Signer},
};

/// Endpoint label used in transport errors raised by API calls.
pub const API_ENDPOINT_LABEL: &str = "api";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Request-body builder collaborator: anything that can render itself as a JSON object.
pub trait ToMapping
where
	Self: Send + Sync,
{
	/// Returns the plain key/value mapping sent as the JSON body.
	fn to_mapping(&self) -> serde_json::Map<String, Value>;
}
impl ToMapping for serde_json::Map<String, Value> {
	fn to_mapping(&self) -> serde_json::Map<String, Value> {
		self.clone()
	}
}

/// Body attached to an API call.
#[derive(Clone, Copy, Default)]
pub enum RequestBody<'a> {
	/// No body.
	#[default]
	Empty,
	/// Raw JSON document.
	Json(&'a Value),
	/// Builder converted through [`ToMapping::to_mapping`].
	Builder(&'a dyn ToMapping),
}
impl RequestBody<'_> {
	fn into_json(self) -> Option<Value> {
		match self {
			Self::Empty => None,
			Self::Json(value) => Some(value.clone()),
			Self::Builder(builder) => Some(Value::Object(builder.to_mapping())),
		}
	}
}
impl Debug for RequestBody<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Empty => f.write_str("Empty"),
			Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
			Self::Builder(_) => f.write_str("Builder(..)"),
		}
	}
}
impl<'a> From<&'a Value> for RequestBody<'a> {
	fn from(value: &'a Value) -> Self {
		Self::Json(value)
	}
}

/// Signs and dispatches QuickBooks API calls.
pub struct Client {
	http: ReqwestHttpClient,
	endpoints: Endpoints,
	config: RwLock<ClientConfig>,
	clock: Arc<dyn Clock>,
	nonce: Arc<dyn NonceSource>,
}
impl Client {
	/// Creates a client from options resolved against the process environment.
	pub fn new(endpoints: Endpoints, options: ClientOptions) -> Self {
		Self::from_config(endpoints, options.resolve())
	}

	/// Creates a client from an already resolved configuration.
	pub fn from_config(endpoints: Endpoints, config: ClientConfig) -> Self {
		Self {
			http: ReqwestHttpClient::default(),
			endpoints,
			config: RwLock::new(config),
			clock: Arc::new(SystemClock),
			nonce: Arc::new(RandomNonce),
		}
	}

	/// Replaces the HTTP transport.
	pub fn with_http_client(mut self, http: ReqwestHttpClient) -> Self {
		self.http = http;

		self
	}

	/// Replaces the clock used for `oauth_timestamp`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the nonce source used for `oauth_nonce`.
	pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
		self.nonce = nonce;

		self
	}

	/// Replaces the configuration wholesale, applying the environment overrides.
	pub fn configure(&self, options: ClientOptions) {
		*self.config.write() = options.resolve();
	}

	/// Same as [`Client::configure`] with an injectable environment lookup.
	pub fn configure_with_env<F>(&self, options: ClientOptions, env: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		*self.config.write() = options.resolve_with(env);
	}

	/// Snapshot of the current configuration.
	pub fn config(&self) -> ClientConfig {
		self.config.read().clone()
	}

	/// Endpoint set this client talks to.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Shared HTTP transport.
	pub fn http_client(&self) -> &ReqwestHttpClient {
		&self.http
	}

	/// Clock shared with the connector for expiry computations.
	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	/// Signs `method url` with the current configuration.
	pub fn sign(&self, method: &Method, url: &Url, extra: &OAuthParams) -> Result<SignedRequest> {
		let config = self.config();

		Signer::new(&config.consumer, &config.token, self.clock.as_ref(), self.nonce.as_ref())
			.sign(method, url, extra)
	}

	/// Issues a signed API call against `{api_base}/{company_id}/{path}` and decodes the JSON
	/// response. An empty 2xx body decodes to [`Value::Null`].
	pub async fn request(
		&self,
		method: Method,
		path: &str,
		body: RequestBody<'_>,
	) -> Result<Value> {
		obs::observe(FlowKind::ApiRequest, "request", self.dispatch(method, path, body.into_json()))
			.await
	}

	/// `GET` shorthand for [`Client::request`].
	pub async fn get(&self, path: &str) -> Result<Value> {
		self.request(Method::GET, path, RequestBody::Empty).await
	}

	/// `POST` shorthand for [`Client::request`].
	pub async fn post(&self, path: &str, body: RequestBody<'_>) -> Result<Value> {
		self.request(Method::POST, path, body).await
	}

	async fn dispatch(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
		let config = self.config();
		let url = self.endpoints.api_url(&config.company_id, path)?;
		let mut extra = OAuthParams::new();

		extra.insert("oauth_token".into(), config.token.token.clone());

		let authorization =
			Signer::new(&config.consumer, &config.token, self.clock.as_ref(), self.nonce.as_ref())
				.sign_header(&method, &url, &extra)?;
		let mut request = self
			.http
			.request(method, url)
			.header(AUTHORIZATION, authorization)
			.header(ACCEPT, JSON_MEDIA_TYPE)
			.header(CONTENT_TYPE, JSON_MEDIA_TYPE);

		if let Some(json) = body {
			request = request.body(json.to_string());
		}

		let response = request
			.send()
			.await
			.map_err(|err| TransportError::network(API_ENDPOINT_LABEL, err))?;
		let status = response.status();
		let bytes =
			response.bytes().await.map_err(|err| TransportError::network(API_ENDPOINT_LABEL, err))?;

		if !status.is_success() {
			return Err(TransportError::status(API_ENDPOINT_LABEL, status.as_u16(), &bytes).into());
		}
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Value::Null);
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ParseError::Json { source, status: Some(status.as_u16()) }.into())
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("endpoints", &self.endpoints)
			.field("config", &*self.config.read())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::OAuth1Token, clock::FixedClock, error::ConfigError, signer::FixedNonce};

	struct Invoice {
		amount: u64,
	}
	impl ToMapping for Invoice {
		fn to_mapping(&self) -> serde_json::Map<String, Value> {
			let mut map = serde_json::Map::new();

			map.insert("TotalAmt".into(), self.amount.into());

			map
		}
	}

	fn client() -> Client {
		let endpoints = Endpoints::intuit().expect("Default endpoints should be valid.");
		let clock = FixedClock::at_unix(1_700_000_000).expect("Timestamp fixture should be valid.");

		Client::from_config(endpoints, ClientConfig::default())
			.with_clock(Arc::new(clock))
			.with_nonce_source(Arc::new(FixedNonce::new("abcdefghij")))
	}

	#[test]
	fn configure_replaces_everything() {
		let client = client();

		client.configure_with_env(
			ClientOptions::default().consumer("CK", "CS").oauth_token("OT", "OTS").company_id("1"),
			|_| None,
		);
		client.configure_with_env(ClientOptions::default().consumer("CK2", "CS2"), |_| None);

		let config = client.config();

		assert_eq!(config.consumer.key, "CK2");
		assert_eq!(config.token, OAuth1Token::default());
		assert!(config.company_id.is_empty());
	}

	#[test]
	fn sign_uses_injected_clock_and_nonce() {
		let client = client();

		client.configure_with_env(
			ClientOptions::default().consumer("CK", "CS").oauth_token("OT", "OTS"),
			|_| None,
		);

		let url = Url::parse("https://api.example.com/v3/company/123/customers")
			.expect("URL fixture should parse.");
		let signed =
			client.sign(&Method::GET, &url, &OAuthParams::new()).expect("Signing should succeed.");

		assert_eq!(signed.signature, "xAdzoxmE+lF784Q+THNgPUAbDDM=");
	}

	#[test]
	fn builder_bodies_convert_to_objects() {
		let invoice = Invoice { amount: 42 };
		let json = RequestBody::Builder(&invoice).into_json();

		assert_eq!(json, Some(serde_json::json!({ "TotalAmt": 42 })));
		assert_eq!(RequestBody::Empty.into_json(), None);
	}

	#[tokio::test]
	async fn request_without_consumer_credentials_fails_before_dispatch() {
		let err = client().get("customers").await.expect_err("Unsigned requests must fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingConsumerKey)));
	}
}

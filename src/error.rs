//! Crate-level error types shared by the signer, the API client, and the connect flow.

// self
use crate::{_prelude::*, auth::ConnectTokenBuilderError, config::EndpointError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (missing credentials, bad endpoints).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Operation is not valid in the current connection state.
	#[error(transparent)]
	State(#[from] StateError),
	/// Transport failure (DNS, TCP, TLS) or a non-success HTTP status.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// Token endpoint answered with a structured OAuth error payload.
	#[error(transparent)]
	Provider(#[from] ProviderError),
}

impl From<EndpointError> for Error {
	fn from(error: EndpointError) -> Self {
		ConfigError::from(error).into()
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Signing requires a consumer key.
	#[error("Consumer key is not configured.")]
	MissingConsumerKey,
	/// Signing requires a consumer secret.
	#[error("Consumer secret is not configured.")]
	MissingConsumerSecret,
	/// HMAC key initialization failed. HMAC-SHA1 accepts keys of any length, so the
	/// signer only surfaces this if the MAC backend rejects the key.
	#[error("Signing key could not be initialized.")]
	InvalidSigningKey,
	/// OAuth 2.0 calls require the app's client identifier and secret.
	#[error("OAuth 2.0 client credentials are not configured.")]
	MissingClientCredentials,
	/// Neither the call nor the connector supplied a redirect URI.
	#[error("Redirect URI is not configured.")]
	MissingRedirectUri,
	/// The authorization callback carried no `code` parameter.
	#[error("Authorization callback is missing the `code` parameter.")]
	MissingAuthorizationCode,
	/// The stored token has no refresh token.
	#[error("Stored token is missing a refresh token.")]
	MissingRefreshToken,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an `expires_in` outside the supported range.
	#[error("The {field} value exceeds the supported range.")]
	ExpiresInOutOfRange {
		/// Offending response field.
		field: &'static str,
	},
	/// Token fields could not be assembled into a connect token.
	#[error(transparent)]
	TokenBuild(#[from] ConnectTokenBuilderError),
	/// A URL assembled from configuration could not be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Raw URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint configuration was rejected.
	#[error(transparent)]
	Endpoint(#[from] EndpointError),
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { url: url.into(), source }
	}
}

/// Connection-state violations raised by the connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum StateError {
	/// A code exchange was attempted while a token is already configured.
	#[error("QuickBooks is already connected; disconnect before requesting a new token.")]
	AlreadyConnected,
	/// A refresh was attempted without a configured token.
	#[error("QuickBooks is not connected; connect or configure a token first.")]
	NotConnected,
	/// The stored token was disconnected or replaced while a refresh was in flight.
	#[error("Stored token changed during refresh; the refreshed token was discarded.")]
	TokenChanged,
}

/// Transport-level failures (network, IO, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Logical endpoint label (`api`, `token`).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// The server answered with a non-success status.
	#[error("{endpoint} responded with HTTP {status}.")]
	Status {
		/// Logical endpoint label (`api`, `token`).
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + StdError,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Builds a status error with a bounded preview of the response body.
	pub fn status(endpoint: &'static str, status: u16, body: &[u8]) -> Self {
		Self::Status { endpoint, status, body: body_preview(body) }
	}

	/// HTTP status carried by the error, if any.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// Body was not the expected JSON document.
	#[error("Response body is not valid JSON.")]
	Json {
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response was well-formed HTTP but not a usable token payload.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Summary of the problem.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Structured OAuth 2.0 error payload returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Token endpoint returned the OAuth error `{error}`{}.", describe(.error_description))]
pub struct ProviderError {
	/// OAuth `error` code (`invalid_grant`, `invalid_client`, ...).
	pub error: String,
	/// OAuth `error_description`, when supplied.
	pub error_description: Option<String>,
	/// OAuth `error_uri`, when supplied.
	pub error_uri: Option<String>,
	/// HTTP status code of the response.
	pub status: Option<u16>,
}

fn describe(description: &Option<String>) -> String {
	description.as_deref().map(|text| format!(": {text}")).unwrap_or_default()
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.len() <= BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	let mut end = BODY_PREVIEW_LIMIT;

	while !text.is_char_boundary(end) {
		end -= 1;
	}

	text[..end].to_owned()
}

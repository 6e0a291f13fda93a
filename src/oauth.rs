//! OAuth 2.0 token endpoint facade built on the `oauth2` crate.
//!
//! The facade performs the two grants the connector needs (authorization code exchange and
//! refresh) with HTTP Basic client authentication, and maps every `oauth2` failure into the
//! crate's [`Error`] taxonomy using the status captured by the instrumented transport.

pub use oauth2;

// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, RedirectUrl, RefreshToken, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	config::{ConnectOptions, Endpoints},
	error::{ConfigError, ParseError, ProviderError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

/// Endpoint label used in transport errors raised by token calls.
pub const TOKEN_ENDPOINT_LABEL: &str = "token";

type IntuitTokenResponse = StandardTokenResponse<IntuitTokenFields, BasicTokenType>;
type IntuitClient = oauth2::Client<
	BasicErrorResponse,
	IntuitTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type IntuitRequestTokenError =
	RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>;

/// Provider-specific fields carried next to the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntuitTokenFields {
	/// Refresh token lifetime in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x_refresh_token_expires_in: Option<u64>,
}
impl ExtraTokenFields for IntuitTokenFields {}

/// Relative token fields returned by a successful grant; absolute instants are derived by the
/// caller from its clock.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
	/// Issued access token.
	pub access_token: String,
	/// Issued refresh token, if any.
	pub refresh_token: Option<String>,
	/// Token type (`bearer`).
	pub token_type: String,
	/// Access token lifetime in seconds.
	pub expires_in: i64,
	/// Refresh token lifetime in seconds, if reported.
	pub x_refresh_token_expires_in: Option<i64>,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("x_refresh_token_expires_in", &self.x_refresh_token_expires_in)
			.finish()
	}
}

/// Configured token endpoint client.
pub struct TokenEndpoint {
	oauth_client: IntuitClient,
	http_client: ReqwestHttpClient,
}
impl TokenEndpoint {
	/// Builds the facade from the endpoint set and the app credentials.
	pub fn from_options(
		endpoints: &Endpoints,
		options: &ConnectOptions,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		options.ensure_client_credentials()?;

		let auth_url = AuthUrl::from_url(endpoints.authorization.clone());
		let token_url = TokenUrl::from_url(endpoints.token.clone());
		let oauth_client = oauth2::Client::new(ClientId::new(options.client_id.clone()))
			.set_client_secret(ClientSecret::new(options.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges an authorization code (`grant_type=authorization_code`).
	pub async fn exchange_code(&self, code: &str, redirect_uri: &Url) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let redirect_url = RedirectUrl::from_url(redirect_uri.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}

	/// Exchanges a refresh token (`grant_type=refresh_token`).
	pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}
}
impl Debug for TokenEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpoint")
			.field("client_id", self.oauth_client.client_id())
			.field("token_url", self.oauth_client.token_uri())
			.finish()
	}
}

fn map_token_response(response: IntuitTokenResponse) -> Result<TokenGrant> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in)
		.map_err(|_| ConfigError::ExpiresInOutOfRange { field: "expires_in" })?;
	let x_refresh_token_expires_in = response
		.extra_fields()
		.x_refresh_token_expires_in
		.map(|seconds| {
			i64::try_from(seconds).map_err(|_| ConfigError::ExpiresInOutOfRange {
				field: "x_refresh_token_expires_in",
			})
		})
		.transpose()?;

	Ok(TokenGrant {
		access_token: response.access_token().secret().to_owned(),
		refresh_token: response.refresh_token().map(|token| token.secret().to_owned()),
		token_type: token_type_label(response.token_type()),
		expires_in,
		x_refresh_token_expires_in,
	})
}

fn token_type_label(token_type: &BasicTokenType) -> String {
	match token_type {
		BasicTokenType::Bearer => "bearer".into(),
		BasicTokenType::Mac => "mac".into(),
		BasicTokenType::Extension(other) => other.clone(),
	}
}

fn map_request_error(meta: Option<ResponseMetadata>, err: IntuitRequestTokenError) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => ProviderError {
			error: response.error().as_ref().to_owned(),
			error_description: response.error_description().cloned(),
			error_uri: response.error_uri().cloned(),
			status,
		}
		.into(),
		RequestTokenError::Request(error) => map_transport_error(status, error),
		RequestTokenError::Parse(source, body) => match status {
			Some(code) if !is_success(code) =>
				TransportError::status(TOKEN_ENDPOINT_LABEL, code, &body).into(),
			_ => ParseError::Json { source, status }.into(),
		},
		RequestTokenError::Other(message) => match status {
			Some(code) if !is_success(code) =>
				TransportError::status(TOKEN_ENDPOINT_LABEL, code, message.as_bytes()).into(),
			_ => ParseError::UnexpectedResponse { message, status }.into(),
		},
	}
}

fn map_transport_error(status: Option<u16>, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) =>
			if inner.is_builder() {
				ConfigError::http_client_build(*inner).into()
			} else {
				TransportError::network(TOKEN_ENDPOINT_LABEL, *inner).into()
			},
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => ParseError::UnexpectedResponse {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status,
		}
		.into(),
		_ => ParseError::UnexpectedResponse {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}

fn is_success(status: u16) -> bool {
	(200..300).contains(&status)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint(options: &ConnectOptions) -> Result<TokenEndpoint> {
		let endpoints = Endpoints::intuit().expect("Default endpoints should be valid.");

		TokenEndpoint::from_options(&endpoints, options, ReqwestHttpClient::default())
	}

	#[test]
	fn builds_with_complete_credentials() {
		let facade = endpoint(&ConnectOptions::new("client-id", "client-secret"))
			.expect("Facade should build with client credentials.");

		assert!(format!("{facade:?}").contains("client-id"));
	}

	#[test]
	fn rejects_missing_client_secret() {
		let err = endpoint(&ConnectOptions::new("client-id", ""))
			.expect_err("Facade must reject empty client secrets.");

		assert!(matches!(err, Error::Config(ConfigError::MissingClientCredentials)));
	}

	#[test]
	fn error_status_decides_between_transport_and_parse() {
		let other = map_request_error(
			Some(ResponseMetadata { status: Some(502) }),
			RequestTokenError::Other("server returned empty error response".into()),
		);

		assert!(matches!(
			other,
			Error::Transport(TransportError::Status { endpoint: TOKEN_ENDPOINT_LABEL, status: 502, .. })
		));

		let unexpected = map_request_error(
			Some(ResponseMetadata { status: Some(200) }),
			RequestTokenError::Other("server returned empty response body".into()),
		);

		assert!(matches!(
			unexpected,
			Error::Parse(ParseError::UnexpectedResponse { status: Some(200), .. })
		));
	}

	#[test]
	fn token_type_labels_are_lowercase() {
		assert_eq!(token_type_label(&BasicTokenType::Bearer), "bearer");
		assert_eq!(token_type_label(&BasicTokenType::Extension("pop".into())), "pop");
	}
}

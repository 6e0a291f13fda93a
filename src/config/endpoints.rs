//! Endpoint set (API base, consent page, token endpoint) with scheme and query validation.

// self
use crate::{_prelude::*, error::ConfigError};

/// Sandbox REST base; API paths are `/{company_id}/{resource}` below it.
pub const API_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com/v3/company";
/// Consent page users are sent to during the OAuth 2.0 connect flow.
pub const AUTHORIZATION_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
/// Token endpoint used for both code exchange and refresh.
pub const TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";

/// Errors raised while constructing or validating endpoints.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum EndpointError {
	/// Endpoint text could not be parsed as a URL.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	Unparsable {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must be absolute HTTP(S) URLs.
	#[error("The {endpoint} endpoint must use HTTP or HTTPS: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoints must not carry a query or fragment.
	#[error("The {endpoint} endpoint must not carry a query or fragment: {url}.")]
	UnexpectedQuery {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Endpoint set the client and connector talk to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// REST base URL (`.../v3/company`).
	pub api_base: Url,
	/// OAuth 2.0 consent page.
	pub authorization: Url,
	/// OAuth 2.0 token endpoint.
	pub token: Url,
}
impl Endpoints {
	/// Creates a builder seeded with the provider's fixed endpoints.
	pub fn builder() -> EndpointsBuilder {
		EndpointsBuilder::default()
	}

	/// Returns the provider's fixed endpoints.
	pub fn intuit() -> Result<Self, EndpointError> {
		Self::builder().build()
	}

	/// Builds `{api_base}/{company_id}/{path}` with surrounding slashes trimmed from `path`.
	pub fn api_url(&self, company_id: &str, path: &str) -> Result<Url, ConfigError> {
		let raw = format!(
			"{}/{}/{}",
			self.api_base.as_str().trim_end_matches('/'),
			company_id,
			path.trim_matches('/')
		);

		Url::parse(&raw).map_err(|source| ConfigError::invalid_url(raw, source))
	}

	fn validate(&self) -> Result<(), EndpointError> {
		validate_endpoint("api_base", &self.api_base)?;
		validate_endpoint("authorization", &self.authorization)?;
		validate_endpoint("token", &self.token)?;

		Ok(())
	}
}

/// Builder for [`Endpoints`]; unset endpoints fall back to the provider defaults.
#[derive(Clone, Debug, Default)]
pub struct EndpointsBuilder {
	/// Optional REST base override.
	pub api_base: Option<Url>,
	/// Optional consent page override.
	pub authorization: Option<Url>,
	/// Optional token endpoint override.
	pub token: Option<Url>,
}
impl EndpointsBuilder {
	/// Overrides the REST base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the consent page URL.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization = Some(url);

		self
	}

	/// Overrides the token endpoint URL.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting endpoint set.
	pub fn build(self) -> Result<Endpoints, EndpointError> {
		let endpoints = Endpoints {
			api_base: or_default("api_base", self.api_base, API_BASE_URL)?,
			authorization: or_default("authorization", self.authorization, AUTHORIZATION_URL)?,
			token: or_default("token", self.token, TOKEN_URL)?,
		};

		endpoints.validate()?;

		Ok(endpoints)
	}
}

fn or_default(
	endpoint: &'static str,
	value: Option<Url>,
	fallback: &str,
) -> Result<Url, EndpointError> {
	match value {
		Some(url) => Ok(url),
		None => Url::parse(fallback).map_err(|source| EndpointError::Unparsable { endpoint, source }),
	}
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), EndpointError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(EndpointError::UnsupportedScheme { endpoint, url: url.to_string() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(EndpointError::UnexpectedQuery { endpoint, url: url.to_string() });
	}

	Ok(())
}

//! Client configuration: credential options, environment overrides, and endpoint sets.
//!
//! [`ClientOptions`] is what callers hand to [`Client::configure`](crate::client::Client::configure);
//! resolving it applies the `QUICKBOOKS_CONSUMER_KEY` / `QUICKBOOKS_CONSUMER_SECRET` overrides and
//! yields the immutable [`ClientConfig`] snapshot the signer reads. [`ConnectOptions`] carries the
//! OAuth 2.0 app credentials used by the connector.

pub mod endpoints;

pub use endpoints::*;

// self
use crate::{
	_prelude::*,
	auth::{ConsumerCredentials, OAuth1Token, TokenSecret},
	error::ConfigError,
};

/// Environment variable overriding the configured consumer key.
pub const ENV_CONSUMER_KEY: &str = "QUICKBOOKS_CONSUMER_KEY";
/// Environment variable overriding the configured consumer secret.
pub const ENV_CONSUMER_SECRET: &str = "QUICKBOOKS_CONSUMER_SECRET";

/// Caller-supplied client options; every field may be left empty.
#[derive(Clone, Default)]
pub struct ClientOptions {
	/// Consumer key, unless overridden by [`ENV_CONSUMER_KEY`].
	pub consumer_key: String,
	/// Consumer secret, unless overridden by [`ENV_CONSUMER_SECRET`].
	pub consumer_secret: String,
	/// OAuth 1.0a access token.
	pub oauth_token: String,
	/// OAuth 1.0a access token secret.
	pub oauth_token_secret: String,
	/// Company (realm) identifier scoping every API path.
	pub company_id: String,
}
impl ClientOptions {
	/// Sets the consumer key/secret pair.
	pub fn consumer(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
		self.consumer_key = key.into();
		self.consumer_secret = secret.into();

		self
	}

	/// Sets the OAuth 1.0a token/secret pair.
	pub fn oauth_token(mut self, token: impl Into<String>, secret: impl Into<String>) -> Self {
		self.oauth_token = token.into();
		self.oauth_token_secret = secret.into();

		self
	}

	/// Sets the company (realm) identifier.
	pub fn company_id(mut self, company_id: impl Into<String>) -> Self {
		self.company_id = company_id.into();

		self
	}

	/// Resolves the options against the process environment.
	pub fn resolve(self) -> ClientConfig {
		self.resolve_with(|name| std::env::var(name).ok())
	}

	/// Resolves the options against an arbitrary environment lookup.
	///
	/// Non-empty environment values win over the explicit consumer key/secret.
	pub fn resolve_with<F>(self, env: F) -> ClientConfig
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |name: &str| env(name).filter(|value| !value.is_empty());
		let key = lookup(ENV_CONSUMER_KEY).unwrap_or(self.consumer_key);
		let secret = lookup(ENV_CONSUMER_SECRET).unwrap_or(self.consumer_secret);

		ClientConfig {
			consumer: ConsumerCredentials::new(key, secret),
			token: OAuth1Token::new(self.oauth_token, self.oauth_token_secret),
			company_id: self.company_id,
		}
	}
}
impl Debug for ClientOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientOptions")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret", &"<redacted>")
			.field("oauth_token", &self.oauth_token)
			.field("oauth_token_secret", &"<redacted>")
			.field("company_id", &self.company_id)
			.finish()
	}
}

/// Resolved configuration snapshot read by the signer and requester.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
	/// Consumer key/secret.
	pub consumer: ConsumerCredentials,
	/// OAuth 1.0a access token.
	pub token: OAuth1Token,
	/// Company (realm) identifier.
	pub company_id: String,
}

/// OAuth 2.0 app credentials used by the connector.
#[derive(Clone, Default)]
pub struct ConnectOptions {
	/// App client identifier.
	pub client_id: String,
	/// App client secret.
	pub client_secret: TokenSecret,
	/// Default redirect URI registered with the provider.
	pub redirect_uri: Option<String>,
}
impl ConnectOptions {
	/// Creates options for the provided client credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<TokenSecret>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into(), redirect_uri: None }
	}

	/// Sets the default redirect (callback) URI.
	pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(redirect_uri.into());

		self
	}

	pub(crate) fn ensure_client_credentials(&self) -> Result<(), ConfigError> {
		if self.client_id.is_empty() || self.client_secret.is_empty() {
			Err(ConfigError::MissingClientCredentials)
		} else {
			Ok(())
		}
	}
}
impl Debug for ConnectOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConnectOptions")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("redirect_uri", &self.redirect_uri)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
		move |name| pairs.iter().find(|(key, _)| *key == name).map(|(_, value)| value.to_string())
	}

	#[test]
	fn environment_overrides_explicit_consumer_credentials() {
		let config = ClientOptions::default()
			.consumer("explicit-key", "explicit-secret")
			.resolve_with(env(&[(ENV_CONSUMER_KEY, "env-key"), (ENV_CONSUMER_SECRET, "env-secret")]));

		assert_eq!(config.consumer.key, "env-key");
		assert_eq!(config.consumer.secret.expose(), "env-secret");
	}

	#[test]
	fn empty_environment_values_fall_back_to_explicit_ones() {
		let config = ClientOptions::default()
			.consumer("explicit-key", "explicit-secret")
			.oauth_token("OT", "OTS")
			.company_id("123")
			.resolve_with(env(&[(ENV_CONSUMER_KEY, "")]));

		assert_eq!(config.consumer.key, "explicit-key");
		assert_eq!(config.consumer.secret.expose(), "explicit-secret");
		assert_eq!(config.token, OAuth1Token::new("OT", "OTS"));
		assert_eq!(config.company_id, "123");
	}

	#[test]
	fn empty_options_resolve_without_validation() {
		let config = ClientOptions::default().resolve_with(|_| None);

		assert_eq!(config, ClientConfig::default());
	}

	#[test]
	fn connect_options_require_client_credentials() {
		assert!(matches!(
			ConnectOptions::new("", "secret").ensure_client_credentials(),
			Err(ConfigError::MissingClientCredentials)
		));
		assert!(ConnectOptions::new("id", "secret").ensure_client_credentials().is_ok());
	}
}

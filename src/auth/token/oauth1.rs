//! OAuth 1.0a consumer credentials and access tokens.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Application consumer key/secret pair used to sign every OAuth 1.0a request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
	/// Public consumer key.
	pub key: String,
	/// Consumer secret; first half of the signing key.
	pub secret: TokenSecret,
}
impl ConsumerCredentials {
	/// Creates a credential pair.
	pub fn new(key: impl Into<String>, secret: impl Into<TokenSecret>) -> Self {
		Self { key: key.into(), secret: secret.into() }
	}

	/// Fails unless both halves are present.
	pub fn ensure_present(&self) -> Result<(), ConfigError> {
		if self.key.is_empty() {
			return Err(ConfigError::MissingConsumerKey);
		}
		if self.secret.is_empty() {
			return Err(ConfigError::MissingConsumerSecret);
		}

		Ok(())
	}
}
impl Debug for ConsumerCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConsumerCredentials")
			.field("key", &self.key)
			.field("secret", &"<redacted>")
			.finish()
	}
}

/// OAuth 1.0a access token (`oauth_token` + `oauth_token_secret`).
///
/// Both halves may be empty while the authorization dance is still in progress; signing then
/// produces a signed URL instead of an `Authorization` header.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth1Token {
	/// Public token value sent as `oauth_token`.
	pub token: String,
	/// Token secret; second half of the signing key.
	pub secret: TokenSecret,
}
impl OAuth1Token {
	/// Creates a token pair.
	pub fn new(token: impl Into<String>, secret: impl Into<TokenSecret>) -> Self {
		Self { token: token.into(), secret: secret.into() }
	}

	/// Returns `true` when no token has been issued yet.
	pub fn is_empty(&self) -> bool {
		self.token.is_empty()
	}
}
impl Debug for OAuth1Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth1Token")
			.field("token", &self.token)
			.field("secret", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn consumer_credentials_require_both_halves() {
		assert!(matches!(
			ConsumerCredentials::new("", "secret").ensure_present(),
			Err(ConfigError::MissingConsumerKey)
		));
		assert!(matches!(
			ConsumerCredentials::new("key", "").ensure_present(),
			Err(ConfigError::MissingConsumerSecret)
		));
		assert!(ConsumerCredentials::new("key", "secret").ensure_present().is_ok());
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let creds = format!("{:?}", ConsumerCredentials::new("CK", "CS"));
		let token = format!("{:?}", OAuth1Token::new("OT", "OTS"));

		assert!(creds.contains("CK") && !creds.contains("CS"));
		assert!(token.contains("OT") && !token.contains("OTS"));
	}
}

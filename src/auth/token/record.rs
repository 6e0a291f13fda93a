//! OAuth 2.0 connect token, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Current lifecycle status for a connect token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// No usable access token is present.
	Disconnected,
	/// Access token is usable.
	Active,
	/// Access token passed its expiry instant.
	Expired,
}

/// Errors produced by [`ConnectTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ConnectTokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when a relative lifetime lands outside the representable date range.
	#[error("Expiry exceeds the supported date range.")]
	ExpiryOutOfRange,
}

/// Token set issued by the OAuth 2.0 token endpoint.
///
/// Serializes to the flat mapping the provider returns, augmented with absolute expiry instants
/// (Unix seconds), so callers can persist it and load it back with
/// [`Connector::set_token`](crate::connect::Connector::set_token).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectToken {
	/// Bearer access token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (`bearer`).
	#[serde(default = "default_token_type")]
	pub token_type: String,
	/// Access token lifetime in seconds, as reported at issue time.
	pub expires_in: i64,
	/// Absolute access token expiry.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
	/// Refresh token lifetime in seconds, as reported at issue time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x_refresh_token_expires_in: Option<i64>,
	/// Absolute refresh token expiry.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::timestamp::option")]
	pub x_refresh_token_expires_at: Option<OffsetDateTime>,
}
impl ConnectToken {
	/// Returns a builder.
	pub fn builder() -> ConnectTokenBuilder {
		ConnectTokenBuilder::default()
	}

	/// Returns `true` when the access token field is non-empty.
	pub fn is_connected(&self) -> bool {
		!self.access_token.is_empty()
	}

	/// Returns `true` when `instant` is strictly past the access token expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}

	/// Returns `true` when `instant` is strictly past the refresh token expiry.
	pub fn is_refresh_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.x_refresh_token_expires_at.is_some_and(|expiry| instant > expiry)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if !self.is_connected() {
			return TokenStatus::Disconnected;
		}
		if self.is_expired_at(instant) {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}
}
impl Debug for ConnectToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConnectToken")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("expires_at", &self.expires_at)
			.field("x_refresh_token_expires_in", &self.x_refresh_token_expires_in)
			.field("x_refresh_token_expires_at", &self.x_refresh_token_expires_at)
			.finish()
	}
}

/// Builder for [`ConnectToken`].
#[derive(Clone, Debug, Default)]
pub struct ConnectTokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	refresh_expires_in: Option<Duration>,
}
impl ConnectTokenBuilder {
	/// Sets the issued-at instant used to derive absolute expiries.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute access token expiry.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the access token lifetime relative to the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Sets the refresh token lifetime relative to the issued instant.
	pub fn refresh_expires_in(mut self, duration: Duration) -> Self {
		self.refresh_expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type (defaults to `bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Consumes the builder and produces a [`ConnectToken`].
	pub fn build(self) -> Result<ConnectToken, ConnectTokenBuilderError> {
		let access_token =
			self.access_token.ok_or(ConnectTokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let (expires_at, expires_in) = match (self.expires_at, self.expires_in) {
			(Some(instant), Some(delta)) => (instant, delta),
			(Some(instant), None) => (instant, instant - issued_at),
			(None, Some(delta)) => (offset(issued_at, delta)?, delta),
			(None, None) => return Err(ConnectTokenBuilderError::MissingExpiry),
		};
		let x_refresh_token_expires_at =
			self.refresh_expires_in.map(|delta| offset(issued_at, delta)).transpose()?;

		Ok(ConnectToken {
			access_token,
			refresh_token: self.refresh_token,
			token_type: self.token_type.unwrap_or_else(default_token_type),
			expires_in: expires_in.whole_seconds(),
			expires_at,
			x_refresh_token_expires_in: self.refresh_expires_in.map(|delta| delta.whole_seconds()),
			x_refresh_token_expires_at,
		})
	}
}

fn offset(
	instant: OffsetDateTime,
	delta: Duration,
) -> Result<OffsetDateTime, ConnectTokenBuilderError> {
	instant.checked_add(delta).ok_or(ConnectTokenBuilderError::ExpiryOutOfRange)
}

fn default_token_type() -> String {
	"bearer".into()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn token(expires_at: OffsetDateTime) -> ConnectToken {
		ConnectToken::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(expires_at - Duration::hours(1))
			.expires_at(expires_at)
			.build()
			.expect("Connect token fixture should build.")
	}

	#[test]
	fn builder_derives_absolute_expiries() {
		let record = ConnectToken::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::seconds(3600))
			.refresh_expires_in(Duration::seconds(8_726_400))
			.build()
			.expect("Relative expiries should build.");

		assert_eq!(record.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(record.expires_in, 3600);
		assert_eq!(record.x_refresh_token_expires_in, Some(8_726_400));
		assert_eq!(record.x_refresh_token_expires_at, Some(macros::datetime!(2025-04-12 00:00 UTC)));
		assert_eq!(record.token_type, "bearer");
	}

	#[test]
	fn builder_requires_access_token_and_expiry() {
		assert_eq!(
			ConnectToken::builder().expires_in(Duration::minutes(1)).build().unwrap_err(),
			ConnectTokenBuilderError::MissingAccessToken
		);
		assert_eq!(
			ConnectToken::builder().access_token("a").build().unwrap_err(),
			ConnectTokenBuilderError::MissingExpiry
		);
	}

	#[test]
	fn lifetimes_beyond_the_date_range_are_rejected() {
		let builder = ConnectToken::builder()
			.access_token("access")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC));

		assert_eq!(
			builder.clone().expires_in(Duration::seconds(1_000_000_000_000)).build().unwrap_err(),
			ConnectTokenBuilderError::ExpiryOutOfRange
		);
		assert_eq!(
			builder
				.expires_in(Duration::seconds(3600))
				.refresh_expires_in(Duration::seconds(i64::MAX))
				.build()
				.unwrap_err(),
			ConnectTokenBuilderError::ExpiryOutOfRange
		);
	}

	#[test]
	fn expiry_is_strictly_after_expires_at() {
		let expires_at = macros::datetime!(2025-01-01 01:00 UTC);
		let record = token(expires_at);

		assert!(!record.is_expired_at(expires_at - Duration::seconds(1)));
		assert!(!record.is_expired_at(expires_at));
		assert!(record.is_expired_at(expires_at + Duration::seconds(1)));
		assert_eq!(record.status_at(expires_at), TokenStatus::Active);
		assert_eq!(record.status_at(expires_at + Duration::seconds(1)), TokenStatus::Expired);
	}

	#[test]
	fn empty_access_token_is_disconnected() {
		let mut record = token(macros::datetime!(2025-01-01 01:00 UTC));

		record.access_token = TokenSecret::default();

		assert!(!record.is_connected());
		assert_eq!(
			record.status_at(macros::datetime!(2025-01-01 00:00 UTC)),
			TokenStatus::Disconnected
		);
	}

	#[test]
	fn serializes_to_provider_shaped_mapping() {
		let record = ConnectToken::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(macros::datetime!(2023-11-14 22:13:20 UTC))
			.expires_in(Duration::seconds(3600))
			.refresh_expires_in(Duration::seconds(100))
			.build()
			.expect("Token fixture should build.");
		let value = serde_json::to_value(&record).expect("Token should serialize.");

		assert_eq!(value["access_token"], "access");
		assert_eq!(value["refresh_token"], "refresh");
		assert_eq!(value["expires_in"], 3600);
		assert_eq!(value["expires_at"], 1_700_003_600);
		assert_eq!(value["x_refresh_token_expires_at"], 1_700_000_100);

		let back: ConnectToken =
			serde_json::from_value(value).expect("Serialized token should deserialize.");

		assert_eq!(back, record);
	}
}

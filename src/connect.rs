//! OAuth 2.0 connect flow: consent URL, code exchange, expiry checks, and refresh.
//!
//! A [`Connector`] wraps a [`Client`] and holds at most one [`ConnectToken`]. The token moves
//! through `pending → connected → expired`; [`Connector::refresh_token`] swaps it in a single
//! write while a per-connector async guard keeps concurrent refreshes from spending the same
//! refresh token twice.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{ConnectToken, ScopeList, TokenStatus},
	client::Client,
	config::ConnectOptions,
	error::{ConfigError, StateError},
	oauth::{TokenEndpoint, TokenGrant},
	obs::{self, FlowKind},
};

/// `state` value sent when the caller does not provide one.
pub const DEFAULT_STATE: &str = "auth";

/// Source of the authorization callback parameters (the redirect request).
pub trait CallbackRequest
where
	Self: Send + Sync,
{
	/// Returns the value of the named query parameter, if present.
	fn query_param(&self, name: &str) -> Option<Cow<'_, str>>;
}
impl CallbackRequest for Url {
	fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
		self.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value)
	}
}
impl CallbackRequest for HashMap<String, String> {
	fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
		self.get(name).map(|value| Cow::Borrowed(value.as_str()))
	}
}

/// Parameters for [`Connector::authorization_url`].
#[derive(Clone, Debug, Default)]
pub struct AuthorizationOptions {
	/// Requested scopes.
	pub scope: ScopeList,
	/// Redirect URI override; the connector's default is used otherwise.
	pub redirect_uri: Option<Url>,
	/// Opaque `state`; [`DEFAULT_STATE`] is used otherwise.
	pub state: Option<String>,
}
impl AuthorizationOptions {
	/// Creates options for the given scope list.
	pub fn new(scope: impl Into<ScopeList>) -> Self {
		Self { scope: scope.into(), ..Default::default() }
	}

	/// Overrides the redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Overrides the `state` parameter.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}
}

/// Drives the OAuth 2.0 token lifecycle for one QuickBooks company.
pub struct Connector {
	client: Client,
	options: ConnectOptions,
	token: RwLock<Option<ConnectToken>>,
	refresh_guard: AsyncMutex<()>,
	refresh_metrics: RefreshMetrics,
}
impl Connector {
	/// Wraps `client` with the app credentials used for token calls.
	pub fn new(client: Client, options: ConnectOptions) -> Self {
		Self {
			client,
			options,
			token: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			refresh_metrics: RefreshMetrics::default(),
		}
	}

	/// Underlying API client.
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// App credentials.
	pub fn options(&self) -> &ConnectOptions {
		&self.options
	}

	/// Refresh counters for this connector.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Builds the consent page URL the user is sent to.
	pub fn authorization_url(&self, options: &AuthorizationOptions) -> Result<Url> {
		let redirect = self.resolve_redirect(options.redirect_uri.as_ref())?;
		let mut url = self.client.endpoints().authorization.clone();

		{
			let mut query = url.query_pairs_mut();

			query.append_pair("response_type", "code");
			query.append_pair("client_id", &self.options.client_id);

			if !options.scope.is_empty() {
				query.append_pair("scope", &options.scope.to_provider_scope());
			}

			query.append_pair("redirect_uri", redirect.as_str());
			query.append_pair("state", options.state.as_deref().unwrap_or(DEFAULT_STATE));
		}

		Ok(url)
	}

	/// Exchanges the callback's authorization code for a token.
	///
	/// The returned token is not stored; hand it to [`Connector::set_token`] once persisted.
	pub async fn request_token<C>(
		&self,
		callback: &C,
		redirect_uri: Option<&Url>,
	) -> Result<ConnectToken>
	where
		C: ?Sized + CallbackRequest,
	{
		obs::observe(FlowKind::AuthorizationCode, "request_token", async move {
			if self.is_connected() {
				return Err(StateError::AlreadyConnected.into());
			}

			let code = callback
				.query_param("code")
				.filter(|code| !code.is_empty())
				.ok_or(ConfigError::MissingAuthorizationCode)?;
			let redirect = self.resolve_redirect(redirect_uri)?;
			let grant = self.token_endpoint()?.exchange_code(&code, &redirect).await?;

			self.token_from_grant(grant)
		})
		.await
	}

	/// Returns `true` when a token with a non-empty access token is configured.
	pub fn is_connected(&self) -> bool {
		self.token.read().as_ref().is_some_and(ConnectToken::is_connected)
	}

	/// Lifecycle status at the client's current instant.
	pub fn status(&self) -> TokenStatus {
		let now = self.client.clock().now();

		self.token.read().as_ref().map_or(TokenStatus::Disconnected, |token| token.status_at(now))
	}

	/// Returns `true` when disconnected or strictly past the access token expiry.
	pub fn has_expired(&self) -> bool {
		self.status() != TokenStatus::Active
	}

	/// Refreshes the stored token and swaps it in atomically.
	///
	/// A missing refresh token in the response keeps the previous one (and its expiry). If the
	/// stored token is disconnected or replaced while the refresh is in flight, the refreshed
	/// token is discarded and the call fails with [`StateError::NotConnected`] or
	/// [`StateError::TokenChanged`].
	pub async fn refresh_token(&self) -> Result<ConnectToken> {
		obs::observe(FlowKind::Refresh, "refresh_token", async move {
			let _singleflight = self.refresh_guard.lock().await;

			self.refresh_metrics.record_attempt();

			let outcome = self.refresh_locked().await;

			match &outcome {
				Ok(_) => self.refresh_metrics.record_success(),
				Err(_) => self.refresh_metrics.record_failure(),
			}

			outcome
		})
		.await
	}

	/// Loads a previously issued token.
	pub fn set_token(&self, token: ConnectToken) {
		*self.token.write() = Some(token);
	}

	/// Snapshot of the stored token.
	pub fn token(&self) -> Option<ConnectToken> {
		self.token.read().clone()
	}

	/// Drops the stored token and returns it.
	pub fn disconnect(&self) -> Option<ConnectToken> {
		self.token.write().take()
	}

	async fn refresh_locked(&self) -> Result<ConnectToken> {
		let current =
			self.token().filter(ConnectToken::is_connected).ok_or(StateError::NotConnected)?;
		let refresh_token = current
			.refresh_token
			.as_ref()
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::MissingRefreshToken)?;
		let grant = self.token_endpoint()?.refresh(refresh_token.expose()).await?;
		let mut token = self.token_from_grant(grant)?;

		if token.refresh_token.is_none() {
			token.refresh_token = current.refresh_token.clone();
		}
		if token.x_refresh_token_expires_at.is_none() {
			token.x_refresh_token_expires_in = current.x_refresh_token_expires_in;
			token.x_refresh_token_expires_at = current.x_refresh_token_expires_at;
		}

		let mut stored = self.token.write();

		if stored.as_ref() != Some(&current) {
			return Err(if stored.is_some() {
				StateError::TokenChanged.into()
			} else {
				StateError::NotConnected.into()
			});
		}

		*stored = Some(token.clone());

		Ok(token)
	}

	fn token_endpoint(&self) -> Result<TokenEndpoint> {
		TokenEndpoint::from_options(
			self.client.endpoints(),
			&self.options,
			self.client.http_client().clone(),
		)
	}

	fn token_from_grant(&self, grant: TokenGrant) -> Result<ConnectToken> {
		let mut builder = ConnectToken::builder()
			.access_token(grant.access_token)
			.token_type(grant.token_type)
			.issued_at(self.client.clock().now())
			.expires_in(Duration::seconds(grant.expires_in));

		if let Some(refresh_token) = grant.refresh_token {
			builder = builder.refresh_token(refresh_token);
		}
		if let Some(seconds) = grant.x_refresh_token_expires_in {
			builder = builder.refresh_expires_in(Duration::seconds(seconds));
		}

		Ok(builder.build().map_err(ConfigError::from)?)
	}

	fn resolve_redirect(&self, redirect_uri: Option<&Url>) -> Result<Url> {
		if let Some(url) = redirect_uri {
			return Ok(url.clone());
		}

		let raw = self.options.redirect_uri.as_deref().ok_or(ConfigError::MissingRedirectUri)?;

		Url::parse(raw).map_err(|source| ConfigError::invalid_url(raw, source).into())
	}
}
impl Debug for Connector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connector")
			.field("client", &self.client)
			.field("options", &self.options)
			.field("token", &*self.token.read())
			.finish_non_exhaustive()
	}
}

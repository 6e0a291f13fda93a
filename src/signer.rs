//! OAuth 1.0a HMAC-SHA1 request signing.
//!
//! [`Signer::sign`] merges the protocol parameters with caller-supplied ones, sorts them by key,
//! builds the signature base string, and attaches the resulting signature either as an
//! `Authorization: OAuth ...` header (authenticated API calls) or as a signed URL (the
//! authorization handshake, where no token is present yet or an `oauth_verifier` is supplied).

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	auth::{ConsumerCredentials, OAuth1Token},
	clock::Clock,
	error::ConfigError,
};

/// Signature method advertised in `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Protocol version advertised in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";

const NONCE_LEN: usize = 10;
const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
const OAUTH_NONCE: &str = "oauth_nonce";
const OAUTH_SIGNATURE: &str = "oauth_signature";
const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
const OAUTH_TOKEN: &str = "oauth_token";
const OAUTH_VERIFIER: &str = "oauth_verifier";
const OAUTH_VERSION_KEY: &str = "oauth_version";
// Header field order expected by the provider; independent of the sorted signing order.
const HEADER_FIELDS: [&str; 7] = [
	OAUTH_SIGNATURE_METHOD,
	OAUTH_SIGNATURE,
	OAUTH_NONCE,
	OAUTH_TIMESTAMP,
	OAUTH_TOKEN,
	OAUTH_CONSUMER_KEY,
	OAUTH_VERSION_KEY,
];
// RFC 3986 unreserved characters stay literal.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

type HmacSha1 = Hmac<Sha1>;

/// Sorted OAuth parameter map (byte order of keys).
pub type OAuthParams = BTreeMap<String, String>;

/// Source of single-use `oauth_nonce` values.
pub trait NonceSource
where
	Self: Send + Sync,
{
	/// Produces a fresh nonce.
	fn generate(&self) -> String;
}

/// Ten random ASCII alphanumerics per nonce.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomNonce;
impl NonceSource for RandomNonce {
	fn generate(&self) -> String {
		rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
	}
}

/// Nonce source that always returns the same value.
#[derive(Clone, Debug)]
pub struct FixedNonce(pub String);
impl FixedNonce {
	/// Creates a fixed nonce source.
	pub fn new(nonce: impl Into<String>) -> Self {
		Self(nonce.into())
	}
}
impl NonceSource for FixedNonce {
	fn generate(&self) -> String {
		self.0.clone()
	}
}

/// Where the computed signature travels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignaturePlacement {
	/// `Authorization` header value (`OAuth oauth_signature_method="HMAC-SHA1", ...`).
	Header(String),
	/// URL carrying the signed parameters in its query.
	Query(Url),
}

/// Result of signing one request; computed per call and discarded afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
	/// Signature base string fed to HMAC-SHA1.
	pub base_string: String,
	/// Base64 signature (not percent-encoded).
	pub signature: String,
	/// Sorted parameters that were signed.
	pub parameters: OAuthParams,
	/// Header or signed URL carrying the signature.
	pub placement: SignaturePlacement,
}
impl SignedRequest {
	/// `Authorization` header value, when the header placement was chosen.
	pub fn authorization_header(&self) -> Option<&str> {
		match &self.placement {
			SignaturePlacement::Header(value) => Some(value),
			SignaturePlacement::Query(_) => None,
		}
	}

	/// Signed URL, when the query placement was chosen.
	pub fn signed_url(&self) -> Option<&Url> {
		match &self.placement {
			SignaturePlacement::Query(url) => Some(url),
			SignaturePlacement::Header(_) => None,
		}
	}
}

struct Signature {
	parameters: OAuthParams,
	param_string: String,
	base_string: String,
	signature: String,
}

/// Borrowed signing context: credentials plus the injected clock and nonce source.
pub struct Signer<'a> {
	consumer: &'a ConsumerCredentials,
	token: &'a OAuth1Token,
	clock: &'a dyn Clock,
	nonce: &'a dyn NonceSource,
}
impl<'a> Signer<'a> {
	/// Creates a signer over the provided credentials.
	pub fn new(
		consumer: &'a ConsumerCredentials,
		token: &'a OAuth1Token,
		clock: &'a dyn Clock,
		nonce: &'a dyn NonceSource,
	) -> Self {
		Self { consumer, token, clock, nonce }
	}

	/// Signs `method url` with the protocol defaults merged under `extra` (caller values win).
	///
	/// The configured `oauth_token` joins the defaults when it is non-empty. A header is produced
	/// when the merged parameters carry `oauth_token` but no `oauth_verifier`; otherwise a signed
	/// URL is produced.
	pub fn sign(&self, method: &Method, url: &Url, extra: &OAuthParams) -> Result<SignedRequest> {
		let Signature { parameters, param_string, base_string, signature } =
			self.compute(method, url, extra)?;
		let placement =
			if parameters.contains_key(OAUTH_TOKEN) && !parameters.contains_key(OAUTH_VERIFIER) {
				SignaturePlacement::Header(authorization_header(&parameters, &signature))
			} else {
				SignaturePlacement::Query(signed_url(url, &param_string, &signature))
			};

		Ok(SignedRequest { base_string, signature, parameters, placement })
	}

	/// Signs like [`Signer::sign`] but always renders the `Authorization` header value.
	///
	/// Authenticated API calls use this; header fields missing from the merged parameters are
	/// rendered empty.
	pub fn sign_header(&self, method: &Method, url: &Url, extra: &OAuthParams) -> Result<String> {
		let Signature { parameters, signature, .. } = self.compute(method, url, extra)?;

		Ok(authorization_header(&parameters, &signature))
	}

	fn compute(&self, method: &Method, url: &Url, extra: &OAuthParams) -> Result<Signature> {
		self.consumer.ensure_present()?;

		let mut parameters = self.default_parameters();

		parameters.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));

		let param_string = encode_pairs(&parameters);
		let base_string = base_string(method, url, &param_string);
		let signing_key = format!(
			"{}&{}",
			percent_encode(self.consumer.secret.expose()),
			percent_encode(self.token.secret.expose())
		);
		let signature = hmac_sha1_base64(&signing_key, &base_string)?;

		Ok(Signature { parameters, param_string, base_string, signature })
	}

	fn default_parameters(&self) -> OAuthParams {
		let mut parameters = OAuthParams::new();

		parameters.insert(OAUTH_CONSUMER_KEY.into(), self.consumer.key.clone());
		parameters.insert(OAUTH_NONCE.into(), self.nonce.generate());
		parameters.insert(OAUTH_SIGNATURE_METHOD.into(), SIGNATURE_METHOD.into());
		parameters.insert(OAUTH_TIMESTAMP.into(), self.clock.now().unix_timestamp().to_string());
		parameters.insert(OAUTH_VERSION_KEY.into(), OAUTH_VERSION.into());

		if !self.token.is_empty() {
			parameters.insert(OAUTH_TOKEN.into(), self.token.token.clone());
		}

		parameters
	}
}
impl Debug for Signer<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Signer")
			.field("consumer", self.consumer)
			.field("token", self.token)
			.finish_non_exhaustive()
	}
}

/// RFC 3986 percent-encoding (everything except `A-Z a-z 0-9 - . _ ~`).
pub fn percent_encode(input: &str) -> String {
	utf8_percent_encode(input, UNRESERVED).to_string()
}

/// Canonical base URI: scheme, host, non-default port, and path; query and fragment dropped.
pub fn base_uri(url: &Url) -> String {
	let port = url.port().map(|port| format!(":{port}")).unwrap_or_default();

	format!("{}://{}{}{}", url.scheme(), url.host_str().unwrap_or_default(), port, url.path())
}

/// `METHOD&enc(base_uri)&enc(params[&original_query])`.
///
/// The original query string is appended verbatim after the sorted parameters; nothing is
/// appended when the URL has no query.
pub fn base_string(method: &Method, url: &Url, param_string: &str) -> String {
	let normalized = match url.query() {
		Some(query) => format!("{param_string}&{query}"),
		None => param_string.to_owned(),
	};

	format!("{}&{}&{}", method.as_str(), percent_encode(&base_uri(url)), percent_encode(&normalized))
}

fn encode_pairs(parameters: &OAuthParams) -> String {
	parameters
		.iter()
		.map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>()
		.join("&")
}

fn hmac_sha1_base64(key: &str, message: &str) -> Result<String> {
	let mut mac =
		HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| ConfigError::InvalidSigningKey)?;

	mac.update(message.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn authorization_header(parameters: &OAuthParams, signature: &str) -> String {
	let fields = HEADER_FIELDS
		.iter()
		.map(|&name| {
			let value = if name == OAUTH_SIGNATURE {
				signature
			} else {
				parameters.get(name).map(String::as_str).unwrap_or_default()
			};

			format!("{name}=\"{}\"", percent_encode(value))
		})
		.collect::<Vec<_>>();

	format!("OAuth {}", fields.join(", "))
}

fn signed_url(url: &Url, param_string: &str, signature: &str) -> Url {
	let mut signed = url.clone();

	signed.set_fragment(None);
	signed.set_query(Some(&format!(
		"{param_string}&{OAUTH_SIGNATURE}={}",
		percent_encode(signature)
	)));

	signed
}

//! QuickBooks Online client with OAuth 1.0a HMAC-SHA1 request signing and an OAuth 2.0
//! connect flow (authorization URL, code exchange, expiry checks, refresh).
//!
//! [`client::Client`] signs and dispatches API calls; [`connect::Connector`] wraps a client and
//! drives the token lifecycle.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod connect;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod signer;

mod _prelude {
	pub use std::{
		borrow::Cow,
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use httpmock as _;

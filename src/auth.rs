//! Credential and token models: consumer credentials, OAuth 1.0a tokens, OAuth 2.0 connect
//! tokens, and scope formatting.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{oauth1::*, record::*, secret::*};

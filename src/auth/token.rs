//! Token models for both OAuth generations.

pub mod oauth1;
pub mod record;
pub mod secret;

//! Client code for the LegallyUp offline layer.
//!
//! This crate provides the HTTP [`Network`](legallyup_core::Network) the
//! controller fetches through, and resolution of page-relative request URLs.

pub mod fetch;

pub use fetch::{HttpNetwork, NetworkConfig, UrlError, resolve};

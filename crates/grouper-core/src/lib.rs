//! # grouper-core
//!
//! Core types and HTTP transport for the Grouper web services (WS) REST API.
//!
//! This crate provides the error taxonomy, client configuration, supported
//! protocol versions and the request transport used by the operation layer in
//! `grouper-ws`.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result alias
//! - [`types`] - Protocol versions and URI schemes
//! - [`config`] - Client configuration and defaults
//! - [`client`] - Endpoint paths, the [`client::Transport`] trait and its HTTP implementation

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};

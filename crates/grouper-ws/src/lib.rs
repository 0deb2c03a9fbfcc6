//! Grouper web services client.
//!
//! This crate provides typed request and response models and an asynchronous
//! client for the Grouper WS REST API: membership checks and changes, group
//! and stem search, group creation and deletion, and privilege grants.
//!
//! ```no_run
//! # async fn run() -> grouper_ws::Result<()> {
//! use grouper_ws::GrouperClient;
//!
//! let client = GrouperClient::builder("grouper.example.edu", "svc-grouper", "s3cret")?
//!     .with_version_tag("v2_5_000")?
//!     .build()?;
//!
//! if !client.is_member("jdoe", "org:test:staff").await? {
//!     client.add_member("jdoe", "org:test:staff", None).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{GrouperClient, GrouperClientBuilder};
pub use grouper_core::client::{EndpointPath, HttpTransport, Transport};
pub use grouper_core::config::ClientConfig;
pub use grouper_core::types::{Scheme, WsVersion};
pub use grouper_core::Error;
pub use models::{
    CompositeType, Group, Privilege, PrivilegeNames, ResultMetadata, Stem, Subject,
};

/// Convenient result alias that reuses the shared Grouper error type.
pub type Result<T> = grouper_core::Result<T>;

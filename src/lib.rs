//! bloxport — publish media files as Roblox Open Cloud assets.
//!
//! Asset creation on Open Cloud is asynchronous: a multipart submission
//! returns an operation handle, and the asset id only exists once that
//! operation completes. This crate drives that pipeline end to end: it
//! submits, polls under a bounded timeout, refreshes a rejected access token
//! at most once, and reconciles the outcome into a durable per-upload record
//! with an idempotent manual retry path.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bloxport::auth::{Credential, OAuthTokenSource};
//! use bloxport::client::AssetsClient;
//! use bloxport::publish::{BatchRequest, Publisher, UploadFile};
//! use bloxport::store::MemoryUploadStore;
//! use bloxport::types::{AssetKind, Creator};
//! use bloxport::Config;
//!
//! # async fn example() -> bloxport::error::Result<()> {
//! let config = Config::from_env();
//! let publisher = Publisher::new(
//!     config.clone(),
//!     Arc::new(AssetsClient::new(config.clone())),
//!     Arc::new(MemoryUploadStore::new()),
//!     Arc::new(OAuthTokenSource::new(config, "client-id", "client-secret")),
//! );
//!
//! let outcome = publisher
//!     .publish_batch(
//!         Credential::new("access-token").with_refresh_token("refresh-token"),
//!         BatchRequest {
//!             owner_id: "12345".into(),
//!             creator: Creator::group("555"),
//!             asset_kind: AssetKind::Audio,
//!             name_prefix: None,
//!             files: vec![UploadFile::new("clip.mp3", b"file bytes".to_vec())],
//!         },
//!     )
//!     .await?;
//! for item in &outcome.items {
//!     println!("{}: {}", item.asset_name, item.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod publish;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{PublishError, Result};

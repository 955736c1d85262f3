//! gdarchive Drive - Google Drive v3 REST adapter
//!
//! Provides the async client used to archive a Google Drive account:
//! - Root folder discovery
//! - Paged listing of every file's metadata
//! - Raw downloads, server-side exports and export-link fetches, all streamed
//!
//! ## Modules
//!
//! - [`client`] - HTTP client and error-envelope decoding
//! - [`provider`] - [`IDriveSource`](gdarchive_core::ports::IDriveSource) implementation
//! - [`types`] - Drive API response types

pub mod client;
pub mod provider;
pub mod types;

pub use client::DriveClient;
pub use provider::GoogleDriveSource;

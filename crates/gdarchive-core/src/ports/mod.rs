//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the core depends on; their implementations live
//! in adapter crates.
//!
//! - [`IDriveSource`] - Remote listing and content transfer (Google Drive)

pub mod drive_source;

pub use drive_source::{ByteStream, IDriveSource, RemoteError};

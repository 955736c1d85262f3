//! gdarchive Core - Domain logic for archiving a cloud drive
//!
//! This crate contains the adapter-free core of gdarchive:
//! - **Domain** - `Record`, `MimePolicy`, `DriveGraph` (two deterministic trees
//!   built from flat metadata) and the cycle-safe breadth-first walker
//! - **Port definitions** - `IDriveSource`, the interface the remote adapter implements
//! - **Retry** - classification-driven exponential backoff
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module has no I/O. Ports define the trait the Drive adapter
//! implements; the sync crate drives transfers through that trait.

pub mod config;
pub mod domain;
pub mod ports;
pub mod retry;

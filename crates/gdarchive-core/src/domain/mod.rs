//! Domain entities and pure logic
//!
//! - Remote metadata records
//! - The mime-type policy table (export formats, skip list)
//! - Path sanitizing and de-duplication
//! - The drive graph and its walker

pub mod graph;
pub mod mime;
pub mod path;
pub mod record;
pub mod walk;

// Re-export commonly used types
pub use graph::{DriveGraph, GraphBuilder, Node, NodeId};
pub use mime::{ContentKind, ExportFormat, MimePolicy};
pub use path::PathDeduplicator;
pub use record::Record;
pub use walk::Walk;
